//! # Ancestra Server
//!
//! REST API for the business management frontend.
//!
//! ## Request flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Ancestra API Server                              │
//! │                                                                         │
//! │  Frontend ───► HTTP (8000) ───► Handlers ───► SQLite                   │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │                   media/                                                │
//! │           (logos, expense receipts)                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod api;
mod auth;
mod config;
mod error;
mod media;
mod pdf;
mod receipt;
mod state;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ancestra_server=info,tower_http=info".into()),
        )
        .init();

    info!("Starting Ancestra API server...");

    // Load configuration
    let config = AppConfig::load()?;
    info!(
        db = %config.database_path,
        media = %config.media_root.display(),
        "Configuration loaded"
    );

    // Uploaded logos and expense receipts land under the media root
    media::ensure_media_dirs(&config.media_root).await?;

    // Connect to database and run migrations
    let state = AppState::new(&config).await?;
    info!("Connected to SQLite");

    let cors = build_cors(&config)?;
    let app = api::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// CORS policy for the browser frontend.
///
/// Credentialed requests forbid the `*` origin, so the allowed origins come
/// from configuration. `Content-Disposition` is exposed so the frontend can
/// read filenames off PDF and CSV downloads.
fn build_cors(config: &AppConfig) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::with_capacity(config.cors_origins.len());
    for origin in &config.cors_origins {
        origins.push(
            HeaderValue::from_str(origin)
                .map_err(|e| anyhow::anyhow!("invalid CORS origin {origin:?}: {e}"))?,
        );
    }

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .expose_headers([header::CONTENT_DISPOSITION]))
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
