// handlers/protected/notifications.rs - /api/notifications

use axum::extract::{Extension, Json, Path, State};
use serde_json::{json, Value};

use crate::auth::Role;
use crate::database::{Collection, Record};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Tenant};
use crate::services::notifications::NotificationEvent;
use crate::state::AppState;

/// GET /api/notifications - newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
) -> ApiResult {
    let notifications = state.notifications().for_user(&user.id, tenant.id()).await;
    Ok(ApiResponse::ok().with("notifications", notifications))
}

/// POST /api/notifications - send one notification to a user of the school
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Json(body): Json<Value>,
) -> ApiResult {
    user.require_role(&[Role::SuperAdmin, Role::SchoolAdmin, Role::Teacher])?;
    let school_id = tenant.require()?;

    let mut data = Record::from_api_input(body)?;
    data.require(&["userId", "title", "message"])?;

    let recipient = data.user_id().unwrap_or_default().to_string();
    let visible = state
        .store
        .find_by_id(Collection::Users, &recipient)
        .await
        .is_some_and(|u| tenant.permits(&u));
    if !visible {
        return Err(ApiError::not_found("User not found"));
    }

    data.set("schoolId", school_id).set("senderId", user.id.as_str());
    if data.get("type").is_none() {
        data.set("type", "message");
    }

    let notification = state.notifications().create(data).await;
    Ok(ApiResponse::created()
        .with("notification", notification)
        .message("Notification sent successfully"))
}

/// POST /api/notifications/announce - announcement to every user of the school
pub async fn announce(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Json(body): Json<Value>,
) -> ApiResult {
    user.require_role(&[Role::SuperAdmin, Role::SchoolAdmin])?;
    let school_id = tenant.require()?;

    let message = body
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Message is required"))?;

    let sent = state
        .notifications()
        .send_event(NotificationEvent::SchoolAnnouncement, &json!({ "message": message }), school_id)
        .await;
    tracing::info!(school = school_id, recipients = sent.len(), "announcement sent");

    Ok(ApiResponse::created()
        .with("notifications", sent)
        .message("Announcement sent successfully"))
}

/// GET /api/notifications/unread/count
pub async fn unread_count(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult {
    let count = state.notifications().unread(&user.id).await.len();
    Ok(ApiResponse::ok().with("count", count))
}

/// PUT /api/notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult {
    let notification = state
        .notifications()
        .mark_read(&id, &user.id)
        .await
        .map_err(|_| ApiError::not_found("Notification not found"))?;
    Ok(ApiResponse::ok()
        .with("notification", notification)
        .message("Notification marked as read"))
}

/// PUT /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
) -> ApiResult {
    let count = state.notifications().mark_all_read(&user.id, tenant.id()).await?;
    Ok(ApiResponse::ok()
        .with("count", count)
        .message("All notifications marked as read"))
}

/// DELETE /api/notifications/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult {
    state
        .notifications()
        .delete(&id, &user.id)
        .await
        .map_err(|_| ApiError::not_found("Notification not found"))?;
    Ok(ApiResponse::ok().message("Notification deleted successfully"))
}
