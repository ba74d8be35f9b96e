//! # User Repository
//!
//! Staff account storage. Deleting an account must never destroy the
//! records it produced: `sales.created_by` and `activity_logs.user_id`
//! are declared `ON DELETE SET NULL`, so a plain DELETE here detaches
//! history instead of cascading through it.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use ancestra_core::{Role, User};

/// Repository for user account operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new account. The password must already be hashed.
    pub async fn create(
        &self,
        username: &str,
        full_name: &str,
        role: Role,
        hashed_password: &str,
    ) -> DbResult<User> {
        let user = User {
            id: generate_user_id(),
            username: username.to_string(),
            full_name: full_name.to_string(),
            role,
            hashed_password: hashed_password.to_string(),
            created_at: Utc::now(),
        };

        debug!(id = %user.id, username = %user.username, "Inserting user");

        sqlx::query(
            "INSERT INTO users (id, username, full_name, role, hashed_password, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(user.role)
        .bind(&user.hashed_password)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, full_name, role, hashed_password, created_at
             FROM users
             WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, full_name, role, hashed_password, created_at
             FROM users
             WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// All accounts ordered by full name, as shown on the employees screen.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, full_name, role, hashed_password, created_at
             FROM users
             ORDER BY full_name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Removes an account; referencing sales and activity rows are detached
    /// by the schema, not deleted.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", id));
        }

        Ok(())
    }

    /// Total number of accounts.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Generates a new user ID.
pub fn generate_user_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_fetch_user() {
        let db = test_db().await;
        let created = db
            .users()
            .create("owner", "Business Owner", Role::Owner, "$argon2$stub")
            .await
            .unwrap();

        let fetched = db.users().get_by_username("owner").await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.role, Role::Owner);
        assert_eq!(db.users().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = test_db().await;
        db.users()
            .create("chanda", "Chanda Mwila", Role::Cashier, "h1")
            .await
            .unwrap();

        let err = db
            .users()
            .create("chanda", "Another Chanda", Role::Manager, "h2")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_ordered_by_full_name() {
        let db = test_db().await;
        db.users()
            .create("z", "Zulu Daka", Role::Cashier, "h")
            .await
            .unwrap();
        db.users()
            .create("a", "Agnes Mbewe", Role::Cashier, "h")
            .await
            .unwrap();

        let names: Vec<String> = db
            .users()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.full_name)
            .collect();
        assert_eq!(names, vec!["Agnes Mbewe", "Zulu Daka"]);
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let db = test_db().await;
        let err = db.users().delete("no-such-id").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
