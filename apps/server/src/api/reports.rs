//! Reporting endpoints: the JSON summary and its PDF export.

use ancestra_core::time::now_cat;
use ancestra_core::ReportSummary;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::{ApiError, ApiResult};
use crate::pdf;
use crate::state::AppState;

/// GET /api/reports/summary
pub async fn summary(State(state): State<AppState>) -> ApiResult<ReportSummary> {
    Ok(Json(state.db.reports().summary().await?))
}

/// GET /api/reports/export
pub async fn export_report(State(state): State<AppState>) -> Result<Response, ApiError> {
    let summary = state.db.reports().summary().await?;
    let issued = now_cat();

    let bytes = tokio::task::spawn_blocking(move || pdf::build_report_pdf(&summary, issued))
        .await
        .map_err(|err| ApiError::Internal(format!("Report rendering task failed: {err}")))??;

    let filename = format!("ancestra_report_{}.pdf", issued.format("%Y%m%d"));
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        bytes,
    )
        .into_response())
}
