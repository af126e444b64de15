// handlers/protected/students.rs - /api/students, enrolled students of the tenant's school

use axum::extract::{Extension, Json, Path, State};
use serde_json::Value;

use super::resource::ResourceSpec;
use crate::auth::Role;
use crate::database::Collection;
use crate::middleware::{ApiResult, AuthUser, Tenant};
use crate::services::notifications::NotificationEvent;
use crate::state::AppState;

const STUDENTS: ResourceSpec = ResourceSpec {
    collection: Collection::Students,
    singular: "student",
    plural: "students",
    label: "Student",
    writers: &[Role::SchoolAdmin],
    required: &["firstName", "lastName"],
    created_event: Some(NotificationEvent::NewStudent),
};

pub async fn list(State(state): State<AppState>, Extension(tenant): Extension<Tenant>) -> ApiResult {
    STUDENTS.list(&state, &tenant).await
}

pub async fn get(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Path(id): Path<String>,
) -> ApiResult {
    STUDENTS.get(&state, &tenant, &id).await
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Json(body): Json<Value>,
) -> ApiResult {
    STUDENTS.create(&state, &user, &tenant, body).await
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult {
    STUDENTS.update(&state, &user, &tenant, &id, body).await
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Path(id): Path<String>,
) -> ApiResult {
    STUDENTS.delete(&state, &user, &tenant, &id).await
}
