//! Sale recording, history queries, and printable receipts.

use ancestra_core::time::to_cat;
use ancestra_core::{NewSale, SaleRead, SaleReceipt};
use ancestra_db::SaleFilter;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::receipt;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SalesQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub customer: Option<String>,
    pub product_id: Option<String>,
    #[serde(default)]
    pub mine: bool,
}

/// POST /api/sales
///
/// Any authenticated role can record a sale; stock checks and receipt
/// numbering happen inside the repository transaction.
pub async fn create_sale(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<NewSale>,
) -> Result<(StatusCode, Json<SaleRead>), ApiError> {
    let (sale, items) = state.db.sales().create(&payload, &user.id).await?;
    Ok((StatusCode::CREATED, Json(SaleRead::from_parts(sale, items))))
}

/// GET /api/sales
pub async fn list_sales(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<SalesQuery>,
) -> ApiResult<Vec<SaleRead>> {
    let filter = SaleFilter {
        start_date: query.start_date,
        end_date: query.end_date,
        customer: query.customer,
        product_id: query.product_id,
        created_by: query.mine.then(|| user.id.clone()),
    };

    let sales = state.db.sales().list(&filter).await?;
    Ok(Json(
        sales
            .into_iter()
            .map(|(sale, items)| SaleRead::from_parts(sale, items))
            .collect(),
    ))
}

/// GET /api/sales/{sale_id}/receipt
pub async fn sale_receipt(
    State(state): State<AppState>,
    Path(sale_id): Path<String>,
) -> ApiResult<SaleReceipt> {
    let sale = state
        .db
        .sales()
        .get_by_id(&sale_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Sale not found".to_string()))?;
    let items = state.db.sales().items(&sale.id).await?;
    let settings = state.db.settings().get_or_create().await?;

    let logo_src = receipt::resolve_logo_src(
        &state.config.media_root,
        settings.company_logo_url.as_deref(),
    )
    .await;
    let qr_code = receipt::qr_data_uri(&receipt::qr_payload(&settings, &sale))?;
    let html = receipt::build_receipt_markup(&settings, &sale, &items, logo_src.as_deref(), &qr_code);

    let receipt_number = sale.receipt_number.clone();
    let issued_at = to_cat(sale.created_at);

    Ok(Json(SaleReceipt {
        sale: SaleRead::from_parts(sale, items),
        receipt_number,
        issued_at,
        html,
        qr_code,
        company_name: settings.company_name,
        company_logo_url: settings.company_logo_url,
        company_tagline: settings.company_tagline,
        footer_message: settings.footer_message,
    }))
}
