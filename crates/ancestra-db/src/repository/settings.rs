//! # Settings Repository
//!
//! The receipt branding singleton. A single row (id = 1) is created from
//! schema defaults on first read, so the API never has to special-case a
//! missing configuration.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::DbResult;
use ancestra_core::{ReceiptSettings, ReceiptSettingsUpdate};

const SETTINGS_COLUMNS: &str = "company_name, company_address, company_logo_url, company_tagline, \
                                footer_message, qr_code_content, updated_at";

/// Repository for receipt settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Returns the settings row, creating it from schema defaults first if
    /// this install has never stored any.
    pub async fn get_or_create(&self) -> DbResult<ReceiptSettings> {
        if let Some(settings) = self.fetch().await? {
            return Ok(settings);
        }

        sqlx::query("INSERT OR IGNORE INTO receipt_settings (id, updated_at) VALUES (1, ?1)")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        // IGNORE covers the race where another request created the row
        // between our read and insert; re-read either way.
        let settings = self.fetch().await?;
        settings.ok_or_else(|| crate::error::DbError::Internal(
            "Receipt settings row missing after insert".to_string(),
        ))
    }

    /// Applies the provided fields. Absent fields keep their stored values;
    /// the logo changes through [`update_logo`](Self::update_logo).
    pub async fn update(&self, changes: &ReceiptSettingsUpdate) -> DbResult<ReceiptSettings> {
        let mut settings = self.get_or_create().await?;

        if let Some(name) = &changes.company_name {
            settings.company_name = name.clone();
        }
        if let Some(address) = &changes.company_address {
            settings.company_address = Some(address.clone());
        }
        if let Some(tagline) = &changes.company_tagline {
            settings.company_tagline = Some(tagline.clone());
        }
        if let Some(footer) = &changes.footer_message {
            settings.footer_message = footer.clone();
        }
        if let Some(qr) = &changes.qr_code_content {
            settings.qr_code_content = Some(qr.clone());
        }
        settings.updated_at = Utc::now();

        sqlx::query(
            "UPDATE receipt_settings
             SET company_name = ?1, company_address = ?2, company_tagline = ?3,
                 footer_message = ?4, qr_code_content = ?5, updated_at = ?6
             WHERE id = 1",
        )
        .bind(&settings.company_name)
        .bind(&settings.company_address)
        .bind(&settings.company_tagline)
        .bind(&settings.footer_message)
        .bind(&settings.qr_code_content)
        .bind(settings.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(settings)
    }

    /// Points the stored logo at a freshly uploaded file.
    pub async fn update_logo(&self, url: &str) -> DbResult<ReceiptSettings> {
        let mut settings = self.get_or_create().await?;
        settings.company_logo_url = Some(url.to_string());
        settings.updated_at = Utc::now();

        sqlx::query(
            "UPDATE receipt_settings SET company_logo_url = ?1, updated_at = ?2 WHERE id = 1",
        )
        .bind(&settings.company_logo_url)
        .bind(settings.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(settings)
    }

    async fn fetch(&self) -> DbResult<Option<ReceiptSettings>> {
        let settings = sqlx::query_as::<_, ReceiptSettings>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM receipt_settings WHERE id = 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings)
    }
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
    async fn test_first_read_creates_defaults() {
        let db = test_db().await;

        let settings = db.settings().get_or_create().await.unwrap();
        assert_eq!(settings.company_name, "Ancestra Business");
        assert_eq!(settings.footer_message, "Thank you for shopping with us!");
        assert!(settings.company_address.is_none());
        assert!(settings.company_logo_url.is_none());
        assert!(settings.qr_code_content.is_none());
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let db = test_db().await;
        db.settings().get_or_create().await.unwrap();

        let changes = ReceiptSettingsUpdate {
            company_name: Some("Banda General Dealers".to_string()),
            company_tagline: Some("Quality since 1998".to_string()),
            ..Default::default()
        };
        let updated = db.settings().update(&changes).await.unwrap();

        assert_eq!(updated.company_name, "Banda General Dealers");
        assert_eq!(updated.company_tagline.as_deref(), Some("Quality since 1998"));
        assert_eq!(updated.footer_message, "Thank you for shopping with us!");

        // A later read sees the stored values, not just the returned copy.
        let reread = db.settings().get_or_create().await.unwrap();
        assert_eq!(reread.company_name, "Banda General Dealers");
    }

    #[tokio::test]
    async fn test_update_logo() {
        let db = test_db().await;

        let updated = db
            .settings()
            .update_logo("/media/logos/abc123.png")
            .await
            .unwrap();
        assert_eq!(
            updated.company_logo_url.as_deref(),
            Some("/media/logos/abc123.png")
        );

        let reread = db.settings().get_or_create().await.unwrap();
        assert_eq!(
            reread.company_logo_url.as_deref(),
            Some("/media/logos/abc123.png")
        );
    }
}
