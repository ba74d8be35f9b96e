//! Shared application state.

use std::sync::Arc;

use ancestra_db::{Database, DbConfig};

use crate::config::AppConfig;

/// State shared by every request handler.
///
/// Cloning is cheap: the database wraps a connection pool and the
/// configuration sits behind an [`Arc`].
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Open the database and assemble the shared state.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let db = Database::new(
            DbConfig::new(&config.database_path)
                .max_connections(5)
                .run_migrations(true),
        )
        .await?;

        Ok(Self {
            db,
            config: Arc::new(config.clone()),
        })
    }
}
