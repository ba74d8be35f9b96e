//! Quotation PDF generation.
//!
//! Quotations are not persisted; the endpoint prices the requested items,
//! takes the next number from the counter, and streams back the rendered
//! document.

use ancestra_core::quote::{compute_totals, QuoteLine};
use ancestra_core::validation::validate_tax_rate;
use ancestra_core::QuotationRequest;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::ApiError;
use crate::pdf;
use crate::state::AppState;

/// POST /api/quotations/generate-pdf
pub async fn generate_pdf(
    State(state): State<AppState>,
    Json(payload): Json<QuotationRequest>,
) -> Result<Response, ApiError> {
    validate_tax_rate(payload.tax_rate)?;

    let mut lines = Vec::with_capacity(payload.items.len());
    for item in &payload.items {
        let product = state
            .db
            .products()
            .get_by_id(&item.product_id)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("Product with ID {} not found", item.product_id))
            })?;
        lines.push(QuoteLine::new(product.name, item.quantity, item.unit_price));
    }
    let totals = compute_totals(&lines, payload.tax_rate);

    let settings = state.db.settings().get_or_create().await?;
    let company_name = if settings.company_name.is_empty() {
        "Your Company Inc.".to_string()
    } else {
        settings.company_name
    };
    let company_address = settings
        .company_address
        .filter(|address| !address.is_empty())
        .unwrap_or_else(|| "1234 Company St, Company Town, ST 12345".to_string());

    let quote_number = state.db.quotations().next_number().await?;

    let document = pdf::QuotationDocument {
        quote_number: quote_number.clone(),
        quote_date: payload.quote_date,
        due_date: payload.due_date,
        customer_name: payload.customer_name,
        customer_address: payload.customer_address,
        customer_city: payload.customer_city,
        company_name,
        company_address,
        lines,
        totals,
        tax_rate: payload.tax_rate,
        terms: payload.terms,
    };

    let bytes = tokio::task::spawn_blocking(move || pdf::build_quotation_pdf(&document))
        .await
        .map_err(|err| ApiError::Internal(format!("Quotation rendering task failed: {err}")))??;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{quote_number}.pdf\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
