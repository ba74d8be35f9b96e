//! Uploaded-file storage and serving.
//!
//! Logos and expense receipts are written under the media root with generated
//! names and served back at `/media/{subdir}/{file}`. The database stores the
//! relative path; URL assembly happens at response time.

use std::path::{Path as FsPath, PathBuf};

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// URL prefix for stored media.
pub const MEDIA_URL: &str = "/media";

/// Subdirectory for company logos.
pub const LOGO_DIR: &str = "logos";

/// Subdirectory for expense receipt files.
pub const RECEIPT_DIR: &str = "expense_receipts";

/// Create the media directories if they do not exist yet.
pub async fn ensure_media_dirs(root: &FsPath) -> std::io::Result<()> {
    tokio::fs::create_dir_all(root.join(LOGO_DIR)).await?;
    tokio::fs::create_dir_all(root.join(RECEIPT_DIR)).await?;
    Ok(())
}

/// Write uploaded bytes under `subdir` with a generated filename.
///
/// Returns the path relative to the media root, e.g.
/// `expense_receipts/3f2a….png`.
pub async fn save_upload(
    root: &FsPath,
    subdir: &str,
    extension: &str,
    bytes: &[u8],
) -> Result<String, ApiError> {
    let filename = format!("{}{extension}", Uuid::new_v4().simple());
    let relative = format!("{subdir}/{filename}");

    tokio::fs::write(root.join(subdir).join(&filename), bytes)
        .await
        .map_err(|err| ApiError::Internal(format!("Failed to store upload: {err}")))?;

    Ok(relative)
}

/// Build the public URL for a stored receipt path.
///
/// Absolute URLs pass through untouched so externally hosted receipts keep
/// working.
pub fn receipt_url(stored: Option<&str>) -> Option<String> {
    let path = stored?.trim();
    if path.is_empty() {
        return None;
    }
    if path.starts_with("http://") || path.starts_with("https://") {
        return Some(path.to_string());
    }
    Some(format!("{MEDIA_URL}/{}", path.trim_start_matches('/')))
}

/// Delete a previously stored logo once it has been replaced.
///
/// Only files we wrote ourselves are touched; external URLs and anything
/// outside the logo directory are ignored. Removal failures are logged and
/// swallowed since the new logo is already in place.
pub async fn delete_stored_logo(root: &FsPath, url: &str) {
    let prefix = format!("{MEDIA_URL}/{LOGO_DIR}/");
    let Some(filename) = url.strip_prefix(&prefix) else {
        return;
    };
    if filename.is_empty() || filename.contains('/') {
        return;
    }

    if let Err(err) = tokio::fs::remove_file(root.join(LOGO_DIR).join(filename)).await {
        tracing::debug!(error = %err, filename, "Could not remove replaced logo");
    }
}

/// GET /media/{*path} - serve a stored file.
pub async fn serve_media(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    // Reject traversal attempts before touching the filesystem.
    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(ApiError::NotFound("File not found".to_string()));
    }

    let full: PathBuf = state.config.media_root.join(&path);
    let bytes = tokio::fs::read(&full)
        .await
        .map_err(|_| ApiError::NotFound("File not found".to_string()))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type_for(&path))],
        bytes,
    )
        .into_response())
}

/// Guess a content type from the file extension.
pub fn content_type_for(path: &str) -> &'static str {
    let extension = path.rsplit('.').next().unwrap_or_default();
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_url_prefixes_relative_paths() {
        assert_eq!(
            receipt_url(Some("expense_receipts/a.png")).as_deref(),
            Some("/media/expense_receipts/a.png")
        );
        assert_eq!(
            receipt_url(Some("/expense_receipts/a.png")).as_deref(),
            Some("/media/expense_receipts/a.png")
        );
    }

    #[test]
    fn receipt_url_passes_absolute_urls_through() {
        assert_eq!(
            receipt_url(Some("https://cdn.test/r.pdf")).as_deref(),
            Some("https://cdn.test/r.pdf")
        );
    }

    #[test]
    fn receipt_url_hides_empty_paths() {
        assert_eq!(receipt_url(None), None);
        assert_eq!(receipt_url(Some("   ")), None);
    }

    #[test]
    fn content_types_cover_upload_formats() {
        assert_eq!(content_type_for("logos/a.PNG"), "image/png");
        assert_eq!(content_type_for("r.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("r.webp"), "image/webp");
        assert_eq!(content_type_for("logo.svg"), "image/svg+xml");
        assert_eq!(content_type_for("r.pdf"), "application/pdf");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
