//! Employee management: the staff overview and account deletion.

use ancestra_core::{EmployeeActivity, EmployeeSummary};
use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::api::ensure_management;
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /api/employees
///
/// One summary per account: role permissions, sales totals over several
/// windows, and the five most recent audit entries.
pub async fn list_employees(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Vec<EmployeeSummary>> {
    ensure_management(&user)?;

    let users = state.db.users().list().await?;
    let mut summaries = Vec::with_capacity(users.len());

    for employee in users {
        let sales = state.db.reports().employee_sales(&employee.id).await?;
        let recent = state.db.activity().recent_for_user(&employee.id, 5).await?;

        summaries.push(EmployeeSummary {
            id: employee.id,
            full_name: employee.full_name,
            username: employee.username,
            role: employee.role,
            permissions: employee
                .role
                .permissions()
                .iter()
                .map(|permission| permission.to_string())
                .collect(),
            sales,
            recent_activity: recent
                .into_iter()
                .map(|entry| EmployeeActivity {
                    action: entry.action,
                    description: entry.description,
                    created_at: entry.created_at,
                })
                .collect(),
        });
    }

    Ok(Json(summaries))
}

/// DELETE /api/employees/{employee_id}
///
/// Deletes only the account. Sales and audit entries the employee created
/// stay behind with their user reference cleared.
pub async fn delete_employee(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(employee_id): Path<String>,
) -> ApiResult<Value> {
    ensure_management(&user)?;

    if employee_id == user.id {
        return Err(ApiError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }

    let employee = state
        .db
        .users()
        .get_by_id(&employee_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".to_string()))?;

    state.db.users().delete(&employee.id).await?;
    state
        .db
        .activity()
        .log(
            &user.id,
            "employee_deleted",
            &format!("Deleted employee {}", employee.full_name),
        )
        .await?;

    Ok(Json(json!({
        "message": format!(
            "Employee '{}' deleted successfully. Their sales and activity data has been preserved.",
            employee.full_name
        )
    })))
}
