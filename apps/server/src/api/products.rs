//! Product catalog endpoints, including CSV export and import.

use ancestra_core::csv;
use ancestra_core::validation::{
    non_empty, validate_amount, validate_category, validate_product_name, validate_stock_level,
};
use ancestra_core::{ImportReport, NewProduct, Product, ProductUpdate};
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use crate::api::ensure_management;
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /api/products
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Vec<Product>> {
    Ok(Json(state.db.products().list().await?))
}

/// POST /api/products
pub async fn create_product(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    ensure_management(&user)?;

    let product = NewProduct {
        name: validate_product_name(&payload.name)?,
        product_code: payload.product_code.as_deref().and_then(non_empty),
        category: validate_category(&payload.category)?,
        price: validate_amount(payload.price, "price")?,
        quantity: validate_stock_level(payload.quantity, "quantity")?,
        reorder_level: validate_stock_level(payload.reorder_level, "reorder_level")?,
    };

    let created = state.db.products().create(&product, &user.id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/products/{product_id}
pub async fn update_product(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(product_id): Path<String>,
    Json(payload): Json<ProductUpdate>,
) -> ApiResult<Product> {
    ensure_management(&user)?;

    let update = ProductUpdate {
        name: payload.name.as_deref().map(validate_product_name).transpose()?,
        product_code: payload.product_code.as_deref().and_then(non_empty),
        category: payload.category.as_deref().map(validate_category).transpose()?,
        price: payload
            .price
            .map(|price| validate_amount(price, "price"))
            .transpose()?,
        quantity: payload
            .quantity
            .map(|quantity| validate_stock_level(quantity, "quantity"))
            .transpose()?,
        reorder_level: payload
            .reorder_level
            .map(|level| validate_stock_level(level, "reorder_level"))
            .transpose()?,
    };

    Ok(Json(
        state.db.products().update(&product_id, &update, &user.id).await?,
    ))
}

/// DELETE /api/products/{product_id}
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(product_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ensure_management(&user)?;
    state.db.products().delete(&product_id, &user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/products/export
pub async fn export_products(State(state): State<AppState>) -> Result<Response, ApiError> {
    let products = state.db.products().list().await?;
    let body = csv::export_products(&products);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=products.csv"),
        ],
        body,
    )
        .into_response())
}

/// POST /api/products/import
pub async fn import_products(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> ApiResult<ImportReport> {
    ensure_management(&user)?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|err| ApiError::BadRequest(err.to_string()))?;
            upload = Some((filename, bytes));
        }
    }

    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("Upload must be a CSV file".to_string()))?;
    if !filename.to_lowercase().ends_with(".csv") {
        return Err(ApiError::BadRequest("Upload must be a CSV file".to_string()));
    }

    let text = String::from_utf8(bytes.to_vec()).map_err(|_| {
        ApiError::BadRequest("Unable to decode CSV file; use UTF-8 encoding.".to_string())
    })?;
    if text.trim().is_empty() {
        return Ok(Json(ImportReport::default()));
    }

    let rows = csv::parse_import(&text).map_err(|err| ApiError::BadRequest(err.to_string()))?;
    Ok(Json(state.db.products().import(&rows, &user.id).await?))
}
