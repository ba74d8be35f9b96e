//! # Activity Log Repository
//!
//! Append-only audit trail. Every mutating operation in the other
//! repositories writes one entry here inside its own transaction, so an
//! audit row exists exactly when the change it describes committed.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use ancestra_core::ActivityLog;

/// Appends one audit entry on an existing connection or transaction.
///
/// Shared with the other repositories so a mutation and its audit entry
/// commit (or roll back) together.
pub(crate) async fn insert_activity(
    conn: &mut SqliteConnection,
    user_id: &str,
    action: &str,
    description: &str,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO activity_logs (id, user_id, action, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(action)
    .bind(description)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Repository for reading and writing audit entries.
#[derive(Debug, Clone)]
pub struct ActivityRepository {
    pool: SqlitePool,
}

impl ActivityRepository {
    /// Creates a new ActivityRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ActivityRepository { pool }
    }

    /// Records a standalone audit entry.
    pub async fn log(&self, user_id: &str, action: &str, description: &str) -> DbResult<()> {
        debug!(user_id = %user_id, action = %action, "Recording activity");

        let mut conn = self.pool.acquire().await?;
        insert_activity(&mut conn, user_id, action, description).await
    }

    /// Most recent entries for one user, newest first.
    pub async fn recent_for_user(&self, user_id: &str, limit: i64) -> DbResult<Vec<ActivityLog>> {
        let entries = sqlx::query_as::<_, ActivityLog>(
            "SELECT id, user_id, action, description, created_at
             FROM activity_logs
             WHERE user_id = ?1
             ORDER BY created_at DESC
             LIMIT ?2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Total number of audit entries.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_logs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
