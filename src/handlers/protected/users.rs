// handlers/protected/users.rs - /api/users

use axum::extract::{Extension, Json, Path, State};
use serde_json::Value;

use super::schools::pick_truthy;
use crate::auth::Role;
use crate::database::{Collection, Record};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Tenant};
use crate::state::AppState;

const ADMINS: &[Role] = &[Role::SuperAdmin, Role::SchoolAdmin];

/// GET /api/users - users of the tenant's school, without password hashes
pub async fn list(State(state): State<AppState>, Extension(tenant): Extension<Tenant>) -> ApiResult {
    let users: Vec<Record> = state
        .store
        .find(Collection::Users, &tenant.scope(Filter::new()))
        .await
        .into_iter()
        .map(|u| u.without("password"))
        .collect();
    Ok(ApiResponse::ok().with("users", users))
}

/// GET /api/users/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Path(id): Path<String>,
) -> ApiResult {
    let user = load_user(&state, &tenant, &id).await?;
    Ok(ApiResponse::ok().with("user", user.without("password")))
}

/// PUT /api/users/:id - name, email, role and isActive
pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult {
    caller.require_role(ADMINS)?;
    load_user(&state, &tenant, &id).await?;

    let mut patch = pick_truthy(&body, &["name", "email", "role"]);
    if let Some(active) = body.get("isActive").and_then(Value::as_bool) {
        patch.set("isActive", active);
    }

    if let Some(role) = patch.get_str("role") {
        let role: Role = role.parse().map_err(ApiError::bad_request)?;
        if role.is_super_admin() && !caller.is_super_admin() {
            return Err(ApiError::forbidden("Insufficient permissions"));
        }
    }
    if let Some(email) = patch.get_str("email") {
        if let Some(existing) = state.store.user_by_email(email).await {
            if existing.id() != Some(id.as_str()) {
                return Err(ApiError::bad_request("User with this email already exists"));
            }
        }
    }

    let user = state.store.update(Collection::Users, &id, patch).await?;
    Ok(ApiResponse::ok()
        .with("user", user.without("password"))
        .message("User updated successfully"))
}

/// DELETE /api/users/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Path(id): Path<String>,
) -> ApiResult {
    caller.require_role(ADMINS)?;
    load_user(&state, &tenant, &id).await?;

    let removed = state.store.delete(Collection::Users, &id).await?;
    tracing::info!(user = %id, by = %caller.id, "user deleted");
    Ok(ApiResponse::ok()
        .with("user", removed.without("password"))
        .message("User deleted successfully"))
}

async fn load_user(state: &AppState, tenant: &Tenant, id: &str) -> Result<Record, ApiError> {
    let user = state.store.find_by_id(Collection::Users, id).await;
    tenant.visible(user, "User not found")
}
