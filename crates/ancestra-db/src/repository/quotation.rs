//! # Quotation Repository
//!
//! Quotes are rendered to PDF and handed straight back to the caller, so
//! the only thing stored here is the monotonically increasing counter their
//! numbers are drawn from.

use sqlx::SqlitePool;

use crate::error::DbResult;
use ancestra_core::{numbering, time};

/// Repository for the quotation number counter.
#[derive(Debug, Clone)]
pub struct QuotationRepository {
    pool: SqlitePool,
}

impl QuotationRepository {
    /// Creates a new QuotationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        QuotationRepository { pool }
    }

    /// Advances the counter and formats the next quote number. The
    /// increment commits before the PDF renders, so an abandoned render
    /// burns a number rather than reusing one.
    pub async fn next_number(&self) -> DbResult<String> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT OR IGNORE INTO quotation_counter (id, counter) VALUES (1, 0)")
            .execute(&mut *tx)
            .await?;
        let counter: i64 = sqlx::query_scalar(
            "UPDATE quotation_counter SET counter = counter + 1 WHERE id = 1 RETURNING counter",
        )
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(numbering::quotation_number(counter, time::today_cat()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_numbers_are_sequential() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let first = db.quotations().next_number().await.unwrap();
        let second = db.quotations().next_number().await.unwrap();

        assert!(first.starts_with("QT0001_"), "got {first}");
        assert!(second.starts_with("QT0002_"), "got {second}");
        assert_ne!(first, second);
    }
}
