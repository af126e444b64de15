// handlers/protected/auth.rs - /api/auth account endpoints (register, me, profile, password)

use axum::extract::{Extension, Json, State};
use serde_json::Value;

use super::schools::pick_truthy;
use crate::auth::{password, Role};
use crate::database::{Collection, Record};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// POST /api/auth/register - super-admins register anyone, school-admins
/// register non-super-admins into their own school
pub async fn register(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> ApiResult {
    caller.require_role(&[Role::SuperAdmin, Role::SchoolAdmin])?;

    let field = |name: &str| body.get(name).and_then(Value::as_str).map(str::trim).filter(|v| !v.is_empty());
    let (Some(email), Some(plain), Some(name), Some(role)) =
        (field("email"), field("password"), field("name"), field("role"))
    else {
        return Err(ApiError::bad_request("Required fields missing"));
    };
    let role: Role = role.parse().map_err(ApiError::bad_request)?;

    let school_id = if caller.is_super_admin() {
        field("schoolId").map(str::to_string)
    } else {
        if role.is_super_admin() {
            return Err(ApiError::forbidden("Insufficient permissions"));
        }
        caller.school_id.clone()
    };

    if state.store.user_by_email(email).await.is_some() {
        return Err(ApiError::bad_request("User already exists"));
    }

    let hashed = password::hash(plain.to_string(), state.config.security.bcrypt_cost).await?;
    let user = Record::new()
        .with("email", email)
        .with("password", hashed)
        .with("name", name)
        .with("role", role.as_str())
        .with("schoolId", school_id)
        .with("avatar", avatar_url(name))
        .with("isActive", true);

    let created = state.store.create(Collection::Users, user).await;
    tracing::info!(user = ?created.id(), role = %role, by = %caller.id, "user registered");

    Ok(ApiResponse::created()
        .with("user", created.without("password"))
        .message("User created successfully"))
}

/// GET /api/auth/me
pub async fn me(Extension(user): Extension<AuthUser>) -> ApiResult {
    Ok(ApiResponse::ok().with("user", user.record))
}

/// PUT /api/auth/profile - name and avatar only
pub async fn profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> ApiResult {
    let patch = pick_truthy(&body, &["name", "avatar"]);
    let updated = state.store.update(Collection::Users, &user.id, patch).await?;
    Ok(ApiResponse::ok()
        .with("user", updated.without("password"))
        .message("Profile updated successfully"))
}

/// PUT /api/auth/change-password - body: { currentPassword, newPassword }
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> ApiResult {
    let field = |name: &str| body.get(name).and_then(Value::as_str).filter(|v| !v.is_empty());
    let (Some(current), Some(next)) = (field("currentPassword"), field("newPassword")) else {
        return Err(ApiError::bad_request("Current and new password are required"));
    };

    let stored = state
        .store
        .find_by_id(Collection::Users, &user.id)
        .await
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let hashed = stored.get_str("password").unwrap_or_default().to_string();

    if !password::verify(current.to_string(), hashed).await? {
        return Err(ApiError::bad_request("Current password is incorrect"));
    }

    let hashed = password::hash(next.to_string(), state.config.security.bcrypt_cost).await?;
    state
        .store
        .update(Collection::Users, &user.id, Record::new().with("password", hashed))
        .await?;

    Ok(ApiResponse::ok().message("Password changed successfully"))
}

/// POST /api/auth/logout - tokens are stateless, the client discards its copy
pub async fn logout(Extension(user): Extension<AuthUser>) -> ApiResult {
    tracing::debug!(user = %user.id, "logout");
    Ok(ApiResponse::ok().message("Logged out successfully"))
}

fn avatar_url(name: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(name.as_bytes()).collect();
    format!("https://ui-avatars.com/api/?name={}&background=random", encoded)
}
