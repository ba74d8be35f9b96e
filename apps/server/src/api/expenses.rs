//! Expense ledger endpoints.
//!
//! Creation is multipart so an optional receipt file can ride along with the
//! form fields; updates are plain JSON and never touch the stored file.

use ancestra_core::validation::{validate_amount, validate_category, validate_description};
use ancestra_core::{Expense, ExpenseRead, ExpenseUpdate, ValidationError};
use ancestra_db::ExpenseFilter;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::ensure_management;
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::media;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExpensesQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<String>,
}

fn missing(field: &str) -> ApiError {
    ValidationError::Required {
        field: field.to_string(),
    }
    .into()
}

fn receipt_extension(content_type: Option<&str>) -> Result<&'static str, ApiError> {
    match content_type {
        Some("image/png") => Ok(".png"),
        Some("image/jpeg") | Some("image/jpg") => Ok(".jpg"),
        Some("image/webp") => Ok(".webp"),
        Some("application/pdf") => Ok(".pdf"),
        _ => Err(ApiError::BadRequest(
            "Unsupported receipt type. Upload PNG, JPG, WEBP, or PDF files.".to_string(),
        )),
    }
}

fn to_expense_read(expense: Expense) -> ExpenseRead {
    ExpenseRead {
        id: expense.id,
        description: expense.description,
        category: expense.category,
        amount: expense.amount,
        expense_date: expense.expense_date,
        receipt_url: media::receipt_url(expense.receipt_path.as_deref()),
    }
}

/// POST /api/expenses
pub async fn create_expense(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ExpenseRead>), ApiError> {
    ensure_management(&user)?;

    let mut description = None;
    let mut category = None;
    let mut amount = None;
    let mut expense_date = None;
    let mut receipt = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?
    {
        let read_text = |err: axum::extract::multipart::MultipartError| {
            ApiError::BadRequest(err.to_string())
        };
        match field.name() {
            Some("description") => description = Some(field.text().await.map_err(read_text)?),
            Some("category") => category = Some(field.text().await.map_err(read_text)?),
            Some("amount") => amount = Some(field.text().await.map_err(read_text)?),
            Some("expense_date") => expense_date = Some(field.text().await.map_err(read_text)?),
            Some("receipt") => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(read_text)?;
                receipt = Some((content_type, bytes));
            }
            _ => {}
        }
    }

    let description = validate_description(&description.ok_or_else(|| missing("description"))?)?;
    let category = validate_category(&category.ok_or_else(|| missing("category"))?)?;
    let amount: f64 = amount
        .ok_or_else(|| missing("amount"))?
        .trim()
        .parse()
        .map_err(|_| {
            ApiError::from(ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: "expected a number".to_string(),
            })
        })?;
    let amount = validate_amount(amount, "Amount")?;
    let expense_date: NaiveDate = expense_date
        .ok_or_else(|| missing("expense_date"))?
        .trim()
        .parse()
        .map_err(|_| {
            ApiError::from(ValidationError::InvalidFormat {
                field: "expense_date".to_string(),
                reason: "expected YYYY-MM-DD".to_string(),
            })
        })?;

    let receipt_path = match receipt {
        Some((content_type, bytes)) => {
            let extension = receipt_extension(content_type.as_deref())?;
            if bytes.is_empty() {
                return Err(ApiError::BadRequest(
                    "Uploaded receipt file is empty.".to_string(),
                ));
            }
            Some(
                media::save_upload(&state.config.media_root, media::RECEIPT_DIR, extension, &bytes)
                    .await?,
            )
        }
        None => None,
    };

    let expense = Expense {
        id: Uuid::new_v4().to_string(),
        description,
        category,
        amount,
        expense_date,
        receipt_path,
    };
    state.db.expenses().create(&expense, &user.id).await?;

    Ok((StatusCode::CREATED, Json(to_expense_read(expense))))
}

/// GET /api/expenses
pub async fn list_expenses(
    State(state): State<AppState>,
    Query(query): Query<ExpensesQuery>,
) -> ApiResult<Vec<ExpenseRead>> {
    let filter = ExpenseFilter {
        start_date: query.start_date,
        end_date: query.end_date,
        category: query.category,
    };

    let expenses = state.db.expenses().list(&filter).await?;
    Ok(Json(expenses.into_iter().map(to_expense_read).collect()))
}

/// PUT /api/expenses/{expense_id}
pub async fn update_expense(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(expense_id): Path<String>,
    Json(payload): Json<ExpenseUpdate>,
) -> ApiResult<ExpenseRead> {
    ensure_management(&user)?;

    if let Some(amount) = payload.amount {
        validate_amount(amount, "Amount")?;
    }

    let expense = state
        .db
        .expenses()
        .update(&expense_id, &payload, &user.id)
        .await?;
    Ok(Json(to_expense_read(expense)))
}

/// DELETE /api/expenses/{expense_id}
///
/// The stored receipt file is left on disk; only the ledger row goes away.
pub async fn delete_expense(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(expense_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ensure_management(&user)?;
    state.db.expenses().delete(&expense_id, &user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
