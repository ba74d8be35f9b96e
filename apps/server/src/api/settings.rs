//! Receipt settings endpoints, including the logo upload.

use ancestra_core::{ReceiptSettings, ReceiptSettingsUpdate, Role};
use axum::extract::{Multipart, State};
use axum::{Extension, Json};

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::media;
use crate::state::AppState;

fn ensure_owner(user: &CurrentUser) -> Result<(), ApiError> {
    if user.role == Role::Owner {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Only owners can update receipt settings".to_string(),
        ))
    }
}

fn logo_extension(content_type: Option<&str>) -> Result<&'static str, ApiError> {
    match content_type {
        Some("image/png") => Ok(".png"),
        Some("image/jpeg") | Some("image/jpg") => Ok(".jpg"),
        Some("image/webp") => Ok(".webp"),
        Some("image/svg+xml") => Ok(".svg"),
        _ => Err(ApiError::UnsupportedMedia(
            "Unsupported image type. Upload PNG, JPG, WEBP, or SVG files.".to_string(),
        )),
    }
}

/// GET /api/settings/receipt
pub async fn read_settings(State(state): State<AppState>) -> ApiResult<ReceiptSettings> {
    Ok(Json(state.db.settings().get_or_create().await?))
}

/// PUT /api/settings/receipt
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ReceiptSettingsUpdate>,
) -> ApiResult<ReceiptSettings> {
    ensure_owner(&user)?;

    let settings = state.db.settings().update(&payload).await?;
    state
        .db
        .activity()
        .log(&user.id, "settings_updated", "Updated receipt settings")
        .await?;

    Ok(Json(settings))
}

/// POST /api/settings/receipt/logo
pub async fn upload_logo(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> ApiResult<ReceiptSettings> {
    ensure_owner(&user)?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?
    {
        if field.name() == Some("file") {
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|err| ApiError::BadRequest(err.to_string()))?;
            upload = Some((content_type, bytes));
        }
    }

    let (content_type, bytes) = upload.ok_or_else(|| {
        ApiError::UnsupportedMedia(
            "Unsupported image type. Upload PNG, JPG, WEBP, or SVG files.".to_string(),
        )
    })?;
    let extension = logo_extension(content_type.as_deref())?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty.".to_string()));
    }

    let previous = state.db.settings().get_or_create().await?.company_logo_url;

    let stored =
        media::save_upload(&state.config.media_root, media::LOGO_DIR, extension, &bytes).await?;
    let logo_url = format!("{}/{stored}", media::MEDIA_URL);

    if let Some(old_url) = previous {
        media::delete_stored_logo(&state.config.media_root, &old_url).await;
    }

    let settings = state.db.settings().update_logo(&logo_url).await?;
    state
        .db
        .activity()
        .log(&user.id, "settings_updated", "Updated company logo")
        .await?;

    Ok(Json(settings))
}
