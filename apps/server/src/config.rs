//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Fallback signing secret for local development only.
const DEV_JWT_SECRET: &str = "ancestra-dev-secret-change-in-production";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database file path
    pub database_path: String,

    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// Access token lifetime in minutes
    pub token_expiry_minutes: i64,

    /// Root directory for uploaded files (logos, expense receipts)
    pub media_root: PathBuf,

    /// Origins allowed to call the API from a browser
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = AppConfig {
            database_path: env::var("ANCESTRA_DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:ancestra.db".to_string())
                .trim_start_matches("sqlite:")
                .to_string(),

            bind_addr: env::var("ANCESTRA_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("ANCESTRA_BIND_ADDR".to_string()))?,

            jwt_secret: match env::var("ANCESTRA_JWT_SECRET") {
                Ok(secret) if !secret.trim().is_empty() => secret,
                _ => {
                    tracing::warn!("ANCESTRA_JWT_SECRET not set, using development secret");
                    DEV_JWT_SECRET.to_string()
                }
            },

            token_expiry_minutes: env::var("ANCESTRA_TOKEN_EXPIRY_MINUTES")
                .unwrap_or_else(|_| "720".to_string()) // 12 hours
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("ANCESTRA_TOKEN_EXPIRY_MINUTES".to_string())
                })?,

            media_root: env::var("ANCESTRA_MEDIA_ROOT")
                .unwrap_or_else(|_| "media".to_string())
                .into(),

            cors_origins: parse_origin_list(
                &env::var("ANCESTRA_CORS_ORIGINS").unwrap_or_default(),
            ),
        };

        Ok(config)
    }
}

/// Split a comma-separated origin list, falling back to the known frontends.
fn parse_origin_list(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() {
        vec![
            "http://localhost:5173".to_string(),
            "http://127.0.0.1:5173".to_string(),
            "https://ancestrabusiness.pages.dev".to_string(),
        ]
    } else {
        origins
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
