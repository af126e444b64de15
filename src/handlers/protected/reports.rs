// handlers/protected/reports.rs - /api/reports

use axum::extract::{Extension, Json, State};
use serde_json::Value;

use crate::auth::Role;
use crate::database::Collection;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Tenant};
use crate::services::reports;
use crate::state::AppState;

const AUTHORS: &[Role] = &[Role::Teacher, Role::SchoolAdmin];

/// POST /api/reports/attendance - body: { classId, startDate, endDate }
pub async fn attendance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Json(body): Json<Value>,
) -> ApiResult {
    user.require_role(AUTHORS)?;
    let class_id = body
        .get("classId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("Class ID is required"))?;
    let class = state.store.find_by_id(Collection::Classes, class_id).await;
    let class = tenant.visible(class, "Class not found")?;

    let report = reports::attendance_report(&state.store, &class, &user.id, &body).await;
    Ok(ApiResponse::ok()
        .with("report", report)
        .message("Attendance report generated successfully"))
}

/// POST /api/reports/performance - body: { studentId, classId, term }
pub async fn performance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Json(body): Json<Value>,
) -> ApiResult {
    user.require_role(AUTHORS)?;
    let report = reports::performance_report(&state.store, tenant.id(), &user.id, &body).await;
    Ok(ApiResponse::ok()
        .with("report", report)
        .message("Performance report generated successfully"))
}
