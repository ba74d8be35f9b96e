//! Account registration, login, and the current-user endpoint.

use ancestra_core::validation::{validate_full_name, validate_password, validate_username};
use ancestra_core::{CoreError, LoginRequest, RegisterUser, TokenResponse, UserProfile};
use ancestra_db::DbError;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::auth::{create_token, hash_password, verify_password, CurrentUser};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUser>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let username = validate_username(&payload.username)?;
    let full_name = validate_full_name(&payload.full_name)?;
    validate_password(&payload.password)?;

    let hashed = hash_password(&payload.password)
        .map_err(|err| ApiError::Internal(format!("Failed to hash password: {err}")))?;

    let user = state
        .db
        .users()
        .create(&username, &full_name, payload.role, &hashed)
        .await
        .map_err(|err| match err {
            DbError::UniqueViolation { .. } => {
                ApiError::BadRequest(CoreError::DuplicateUsername.to_string())
            }
            other => other.into(),
        })?;

    state
        .db
        .activity()
        .log(
            &user.id,
            "employee_created",
            &format!("Registered employee {}", user.full_name),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let user = state
        .db
        .users()
        .get_by_username(&payload.username)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Incorrect credentials".to_string()))?;

    if !verify_password(&payload.password, &user.hashed_password) {
        return Err(ApiError::Unauthorized("Incorrect credentials".to_string()));
    }

    let token = create_token(
        &user.username,
        &state.config.jwt_secret,
        state.config.token_expiry_minutes,
    )
    .map_err(|err| ApiError::Internal(format!("Failed to issue token: {err}")))?;

    Ok(Json(TokenResponse::bearer(token)))
}

/// GET /api/auth/me
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<UserProfile> {
    Json(UserProfile {
        id: user.id,
        username: user.username,
        full_name: user.full_name,
        role: user.role,
    })
}
