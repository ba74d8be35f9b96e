//! HTTP route handlers.
//!
//! Routes are split into an open router (health, auth, media) and a
//! protected router behind the bearer-token middleware. Role checks beyond
//! "logged in" happen inside the handlers.

pub mod auth;
pub mod employees;
pub mod expenses;
pub mod health;
pub mod products;
pub mod quotations;
pub mod reports;
pub mod sales;
pub mod settings;

use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::auth::{require_auth, CurrentUser};
use crate::error::ApiError;
use crate::media;
use crate::state::AppState;

/// Guard for owner/manager-only operations.
pub fn ensure_management(user: &CurrentUser) -> Result<(), ApiError> {
    if user.role.is_management() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Insufficient permissions".to_string()))
    }
}

/// Assemble the application router.
pub fn create_router(state: AppState) -> Router {
    let open = Router::new()
        .route("/api/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/media/{*path}", get(media::serve_media));

    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product),
        )
        .route("/api/products/export", get(products::export_products))
        .route("/api/products/import", post(products::import_products))
        .route(
            "/api/products/{product_id}",
            put(products::update_product).delete(products::delete_product),
        )
        .route("/api/sales", get(sales::list_sales).post(sales::create_sale))
        .route("/api/sales/{sale_id}/receipt", get(sales::sale_receipt))
        .route(
            "/api/expenses",
            get(expenses::list_expenses).post(expenses::create_expense),
        )
        .route(
            "/api/expenses/{expense_id}",
            put(expenses::update_expense).delete(expenses::delete_expense),
        )
        .route("/api/reports/summary", get(reports::summary))
        .route("/api/reports/export", get(reports::export_report))
        .route(
            "/api/settings/receipt",
            get(settings::read_settings).put(settings::update_settings),
        )
        .route("/api/settings/receipt/logo", post(settings::upload_logo))
        .route("/api/employees", get(employees::list_employees))
        .route("/api/employees/{employee_id}", delete(employees::delete_employee))
        .route("/api/quotations/generate-pdf", post(quotations::generate_pdf))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new().merge(open).merge(protected).with_state(state)
}
