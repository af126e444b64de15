// handlers/protected/billing.rs - /api/billing

use axum::extract::{Extension, Json, Path, State};
use serde_json::Value;

use super::schools::update_subscription;
use crate::auth::Role;
use crate::database::Collection;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::billing;
use crate::state::AppState;

/// GET /api/billing/school/:schoolId - plan, fee, usage and change history
pub async fn school(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(school_id): Path<String>,
) -> ApiResult {
    user.require_role(&[Role::SuperAdmin, Role::SchoolAdmin])?;
    if !user.is_super_admin() && user.school_id.as_deref() != Some(school_id.as_str()) {
        return Err(ApiError::not_found("School not found"));
    }

    let school = state
        .store
        .find_by_id(Collection::Schools, &school_id)
        .await
        .ok_or_else(|| ApiError::not_found("School not found"))?;

    let summary = billing::summary(&state.store, &school).await;
    Ok(ApiResponse::ok().with("billing", summary))
}

/// PUT /api/billing/school/:schoolId/subscription (super-admin)
pub async fn subscription(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(school_id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult {
    user.require_role(&[Role::SuperAdmin])?;
    let school = update_subscription(&state, &user, &school_id, &body).await?;
    Ok(ApiResponse::ok().with("school", school).message("Subscription updated successfully"))
}
