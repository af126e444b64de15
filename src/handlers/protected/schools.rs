// handlers/protected/schools.rs - /api/schools
//
// Schools are the tenants themselves, so a non-super-admin caller can only
// see the school they belong to.

use axum::extract::{Extension, Json, Path, State};
use serde_json::{json, Value};

use crate::auth::Role;
use crate::database::{Collection, Record};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::billing;
use crate::services::notifications::NotificationEvent;
use crate::state::AppState;

/// Fields a school update may change
const EDITABLE: &[&str] = &["name", "address", "phone", "email", "website", "subscriptionPlan"];

/// GET /api/schools - every school (super-admin)
pub async fn list(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult {
    user.require_role(&[Role::SuperAdmin])?;
    let schools = state.store.find(Collection::Schools, &Filter::new()).await;
    Ok(ApiResponse::ok().with("schools", schools))
}

/// POST /api/schools - create a school (super-admin)
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> ApiResult {
    user.require_role(&[Role::SuperAdmin])?;

    let input = Record::from_api_input(body)?;
    input.require(&["name", "address", "phone", "email"])?;

    let premium = input.get_str("subscriptionPlan") == Some("premium");
    let mut school = Record::new();
    for field in ["name", "address", "phone", "email"] {
        school.set(field, input.value_of(field).clone());
    }
    school
        .set("website", input.get_str("website").unwrap_or(""))
        .set("subscriptionPlan", input.get_str("subscriptionPlan").unwrap_or("basic"))
        .set("subscriptionStatus", "active")
        .set("maxStudents", if premium { 2000 } else { 800 })
        .set("maxTeachers", if premium { 150 } else { 60 });

    let school = state.store.create(Collection::Schools, school).await;
    tracing::info!(school = school.id().unwrap_or_default(), "school created");
    Ok(ApiResponse::created().with("school", school).message("School created successfully"))
}

/// GET /api/schools/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult {
    let school = load_school(&state, &user, &id).await?;
    Ok(ApiResponse::ok().with("school", school))
}

/// PUT /api/schools/:id - super-admin, or the school's own admin
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult {
    user.require_role(&[Role::SuperAdmin, Role::SchoolAdmin])?;
    load_school(&state, &user, &id).await?;

    let patch = pick_truthy(&body, EDITABLE);
    let school = state.store.update(Collection::Schools, &id, patch).await?;
    Ok(ApiResponse::ok().with("school", school).message("School updated successfully"))
}

/// GET /api/schools/:id/stats
pub async fn stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult {
    load_school(&state, &user, &id).await?;
    let stats = state.store.school_stats(&id).await;
    Ok(ApiResponse::ok().with("stats", stats))
}

/// GET /api/schools/:id/users
pub async fn users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult {
    load_school(&state, &user, &id).await?;
    let users: Vec<Record> = state
        .store
        .users_by_school(&id)
        .await
        .into_iter()
        .map(|u| u.without("password"))
        .collect();
    Ok(ApiResponse::ok().with("users", users))
}

/// PUT /api/schools/:id/subscription - change plan or status (super-admin)
pub async fn subscription(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult {
    user.require_role(&[Role::SuperAdmin])?;
    let school = update_subscription(&state, &user, &id, &body).await?;
    Ok(ApiResponse::ok().with("school", school).message("Subscription updated successfully"))
}

/// Apply a plan/status change and append it to the billing history. Moving
/// a school off `active` warns its school-admins.
pub async fn update_subscription(
    state: &AppState,
    user: &AuthUser,
    school_id: &str,
    body: &Value,
) -> Result<Record, ApiError> {
    if state.store.find_by_id(Collection::Schools, school_id).await.is_none() {
        return Err(ApiError::not_found("School not found"));
    }

    let patch = pick_truthy(body, &["subscriptionPlan", "subscriptionStatus"]);
    let school = state.store.update(Collection::Schools, school_id, patch).await?;
    billing::record_change(&state.store, &school, &user.id).await;
    tracing::info!(school = school_id, by = %user.id, "subscription changed");

    let status_changed = body.get("subscriptionStatus").and_then(Value::as_str).is_some();
    if status_changed && school.get_str("subscriptionStatus") != Some("active") {
        let expiry = billing::next_billing_date().format("%Y-%m-%d").to_string();
        state
            .notifications()
            .send_event(NotificationEvent::SubscriptionExpiring, &json!({ "expiryDate": expiry }), school_id)
            .await;
    }
    Ok(school)
}

/// A school visible to the caller; other schools look missing
async fn load_school(state: &AppState, user: &AuthUser, id: &str) -> Result<Record, ApiError> {
    let visible = user.is_super_admin() || user.school_id.as_deref() == Some(id);
    let school = if visible {
        state.store.find_by_id(Collection::Schools, id).await
    } else {
        None
    };
    school.ok_or_else(|| ApiError::not_found("School not found"))
}

/// Copy the listed fields that are present and non-empty
pub(crate) fn pick_truthy(body: &Value, fields: &[&str]) -> Record {
    let mut patch = Record::new();
    for field in fields {
        match body.get(*field) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => {}
            Some(Value::String(s)) if s.is_empty() => {}
            Some(value) => {
                patch.set(*field, value.clone());
            }
        }
    }
    patch
}
