// handlers/protected/classes.rs - /api/classes, timetabled classes of the tenant's school

use axum::extract::{Extension, Json, Path, State};
use serde_json::Value;

use super::resource::ResourceSpec;
use crate::auth::Role;
use crate::database::Collection;
use crate::middleware::{ApiResult, AuthUser, Tenant};
use crate::state::AppState;

const CLASSES: ResourceSpec = ResourceSpec {
    collection: Collection::Classes,
    singular: "class",
    plural: "classes",
    label: "Class",
    writers: &[Role::SchoolAdmin],
    required: &["name"],
    created_event: None,
};

pub async fn list(State(state): State<AppState>, Extension(tenant): Extension<Tenant>) -> ApiResult {
    CLASSES.list(&state, &tenant).await
}

pub async fn get(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Path(id): Path<String>,
) -> ApiResult {
    CLASSES.get(&state, &tenant, &id).await
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Json(body): Json<Value>,
) -> ApiResult {
    CLASSES.create(&state, &user, &tenant, body).await
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult {
    CLASSES.update(&state, &user, &tenant, &id, body).await
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Path(id): Path<String>,
) -> ApiResult {
    CLASSES.delete(&state, &user, &tenant, &id).await
}
