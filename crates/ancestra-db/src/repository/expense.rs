//! # Expense Repository
//!
//! The expense ledger: dated operating costs with an optional uploaded
//! receipt. Receipt files live on disk under the media root; this layer only
//! stores their relative paths.

use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::activity::insert_activity;
use ancestra_core::{Expense, ExpenseUpdate};

const EXPENSE_COLUMNS: &str = "id, description, category, amount, expense_date, receipt_path";

/// Optional filters for the expense listing. Dates compare against the
/// recorded expense date, both ends inclusive; the category must match
/// exactly.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<String>,
}

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Inserts a prebuilt expense without an audit entry. Used by seeding;
    /// API mutations go through [`create`](Self::create).
    pub async fn insert(&self, expense: &Expense) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO expenses (id, description, category, amount, expense_date, receipt_path)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&expense.id)
        .bind(&expense.description)
        .bind(&expense.category)
        .bind(expense.amount)
        .bind(expense.expense_date)
        .bind(&expense.receipt_path)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records an expense together with its audit entry.
    pub async fn create(&self, expense: &Expense, actor: &str) -> DbResult<()> {
        debug!(id = %expense.id, category = %expense.category, "Recording expense");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO expenses (id, description, category, amount, expense_date, receipt_path)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&expense.id)
        .bind(&expense.description)
        .bind(&expense.category)
        .bind(expense.amount)
        .bind(expense.expense_date)
        .bind(&expense.receipt_path)
        .execute(&mut *tx)
        .await?;

        insert_activity(
            &mut tx,
            actor,
            "expense_created",
            &format!(
                "Recorded expense {} for ZMW {:.2}",
                expense.category, expense.amount
            ),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Expenses matching the filter, most recent date first.
    pub async fn list(&self, filter: &ExpenseFilter) -> DbResult<Vec<Expense>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE 1=1"
        ));
        if let Some(start) = filter.start_date {
            query.push(" AND expense_date >= ");
            query.push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND expense_date <= ");
            query.push_bind(end);
        }
        if let Some(category) = &filter.category {
            query.push(" AND category = ");
            query.push_bind(category.clone());
        }
        query.push(" ORDER BY expense_date DESC");

        let expenses = query
            .build_query_as::<Expense>()
            .fetch_all(&self.pool)
            .await?;
        Ok(expenses)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Expense>> {
        let expense = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Applies a partial update. The receipt file is managed by its upload
    /// flow, so a `receipt_url` in the payload is ignored here.
    pub async fn update(
        &self,
        id: &str,
        changes: &ExpenseUpdate,
        actor: &str,
    ) -> DbResult<Expense> {
        let mut tx = self.pool.begin().await?;

        let mut expense = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Expense", id))?;

        if let Some(description) = &changes.description {
            expense.description = description.clone();
        }
        if let Some(category) = &changes.category {
            expense.category = category.clone();
        }
        if let Some(amount) = changes.amount {
            expense.amount = amount;
        }
        if let Some(date) = changes.expense_date {
            expense.expense_date = date;
        }

        sqlx::query(
            "UPDATE expenses SET description = ?2, category = ?3, amount = ?4, expense_date = ?5
             WHERE id = ?1",
        )
        .bind(&expense.id)
        .bind(&expense.description)
        .bind(&expense.category)
        .bind(expense.amount)
        .bind(expense.expense_date)
        .execute(&mut *tx)
        .await?;

        insert_activity(
            &mut tx,
            actor,
            "expense_updated",
            &format!("Updated expense #{} ({})", expense.id, expense.category),
        )
        .await?;

        tx.commit().await?;
        Ok(expense)
    }

    /// Deletes an expense. The receipt file, if any, stays on disk.
    pub async fn delete(&self, id: &str, actor: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let description: Option<String> =
            sqlx::query_scalar("SELECT description FROM expenses WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let description = description.ok_or_else(|| DbError::not_found("Expense", id))?;

        sqlx::query("DELETE FROM expenses WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_activity(
            &mut tx,
            actor,
            "expense_deleted",
            &format!("Deleted expense #{id} ({description})"),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Total number of expenses.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM expenses")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Generates a new expense ID.
pub fn generate_expense_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use ancestra_core::Role;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_actor(db: &Database) -> String {
        db.users()
            .create("owner", "Business Owner", Role::Owner, "hash")
            .await
            .unwrap()
            .id
    }

    fn expense(description: &str, category: &str, amount: f64, date: &str) -> Expense {
        Expense {
            id: generate_expense_id(),
            description: description.to_string(),
            category: category.to_string(),
            amount,
            expense_date: date.parse().unwrap(),
            receipt_path: None,
        }
    }

    #[tokio::test]
    async fn test_create_records_audit_entry() {
        let db = test_db().await;
        let actor = seed_actor(&db).await;

        let bill = expense("Electricity Bill", "Utilities", 350.0, "2025-03-10");
        db.expenses().create(&bill, &actor).await.unwrap();

        let stored = db.expenses().get_by_id(&bill.id).await.unwrap().unwrap();
        assert_eq!(stored, bill);

        let entries = db.activity().recent_for_user(&actor, 5).await.unwrap();
        assert_eq!(
            entries[0].description,
            "Recorded expense Utilities for ZMW 350.00"
        );
    }

    #[tokio::test]
    async fn test_list_filters_by_date_and_category() {
        let db = test_db().await;
        for e in [
            expense("Electricity Bill", "Utilities", 350.0, "2025-03-10"),
            expense("Water Bill", "Utilities", 80.0, "2025-03-20"),
            expense("Supplier Payment", "Inventory", 500.0, "2025-04-02"),
        ] {
            db.expenses().insert(&e).await.unwrap();
        }

        let all = db.expenses().list(&ExpenseFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        // Most recent expense date first.
        assert_eq!(all[0].description, "Supplier Payment");

        let march = ExpenseFilter {
            start_date: Some("2025-03-01".parse().unwrap()),
            end_date: Some("2025-03-31".parse().unwrap()),
            ..Default::default()
        };
        assert_eq!(db.expenses().list(&march).await.unwrap().len(), 2);

        let utilities = ExpenseFilter {
            category: Some("Utilities".to_string()),
            ..Default::default()
        };
        assert_eq!(db.expenses().list(&utilities).await.unwrap().len(), 2);

        // Category matching is exact, not case-insensitive.
        let lowercase = ExpenseFilter {
            category: Some("utilities".to_string()),
            ..Default::default()
        };
        assert!(db.expenses().list(&lowercase).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_ignores_receipt_url_field() {
        let db = test_db().await;
        let actor = seed_actor(&db).await;
        let mut bill = expense("Electricity Bill", "Utilities", 350.0, "2025-03-10");
        bill.receipt_path = Some("expense_receipts/abc.png".to_string());
        db.expenses().insert(&bill).await.unwrap();

        let changes = ExpenseUpdate {
            amount: Some(400.0),
            receipt_url: Some("/media/expense_receipts/other.png".to_string()),
            ..Default::default()
        };
        let updated = db.expenses().update(&bill.id, &changes, &actor).await.unwrap();

        assert_eq!(updated.amount, 400.0);
        assert_eq!(
            updated.receipt_path.as_deref(),
            Some("expense_receipts/abc.png")
        );

        let entries = db.activity().recent_for_user(&actor, 5).await.unwrap();
        assert_eq!(
            entries[0].description,
            format!("Updated expense #{} (Utilities)", bill.id)
        );
    }

    #[tokio::test]
    async fn test_delete_keeps_description_in_audit() {
        let db = test_db().await;
        let actor = seed_actor(&db).await;
        let bill = expense("Electricity Bill", "Utilities", 350.0, "2025-03-10");
        db.expenses().insert(&bill).await.unwrap();

        db.expenses().delete(&bill.id, &actor).await.unwrap();
        assert_eq!(db.expenses().count().await.unwrap(), 0);

        let entries = db.activity().recent_for_user(&actor, 5).await.unwrap();
        assert_eq!(
            entries[0].description,
            format!("Deleted expense #{} (Electricity Bill)", bill.id)
        );

        let err = db.expenses().delete(&bill.id, &actor).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
