// handlers/protected/assignments.rs - /api/assignments

use axum::extract::{Extension, Json, Path, State};
use serde_json::Value;

use super::resource::ResourceSpec;
use crate::auth::Role;
use crate::database::{Collection, Record};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Tenant};
use crate::services::notifications::NotificationEvent;
use crate::state::AppState;

const ASSIGNMENTS: ResourceSpec = ResourceSpec {
    collection: Collection::Assignments,
    singular: "assignment",
    plural: "assignments",
    label: "Assignment",
    writers: &[Role::Teacher, Role::SchoolAdmin],
    required: &["title", "classId"],
    // announced by `create` with the class name filled in
    created_event: None,
};

/// GET /api/assignments/class/:classId
pub async fn list_for_class(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Path(class_id): Path<String>,
) -> ApiResult {
    let filter = tenant.scope(Filter::new().eq("classId", class_id));
    let assignments = state.store.find(Collection::Assignments, &filter).await;
    Ok(ApiResponse::ok().with("assignments", assignments))
}

/// GET /api/assignments/student/:studentId - assignments of the classes
/// matching the student's grade and section
pub async fn list_for_student(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Path(student_id): Path<String>,
) -> ApiResult {
    let student = state.store.find_by_id(Collection::Students, &student_id).await;
    let student = tenant.visible(student, "Student not found")?;

    let class_filter = Filter::new()
        .eq("schoolId", student.value_of("schoolId").clone())
        .eq("grade", student.value_of("grade").clone())
        .eq("section", student.value_of("section").clone());
    let class_ids: Vec<Value> = state
        .store
        .find(Collection::Classes, &class_filter)
        .await
        .iter()
        .filter_map(|c| c.id().map(Value::from))
        .collect();

    let assignments = state
        .store
        .find(Collection::Assignments, &Filter::new().one_of("classId", class_ids))
        .await;
    Ok(ApiResponse::ok().with("assignments", assignments))
}

/// POST /api/assignments - students of the school are notified
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Json(body): Json<Value>,
) -> ApiResult {
    user.require_role(ASSIGNMENTS.writers)?;
    let class = match body.get("classId").and_then(Value::as_str) {
        Some(class_id) => Some(class_in_school(&state, &tenant, class_id).await?),
        None => None,
    };
    let assignment = ASSIGNMENTS.insert(&state, &user, &tenant, body).await?;

    if let Some(school_id) = assignment.school_id() {
        let mut event = assignment.clone();
        if let Some(name) = class.as_ref().and_then(|c| c.get_str("name")) {
            event.set("className", name);
        }
        state
            .notifications()
            .send_event(NotificationEvent::NewAssignment, &event.into_value(), school_id)
            .await;
    }

    Ok(ASSIGNMENTS.created_response(assignment))
}

/// PUT /api/assignments/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult {
    user.require_role(ASSIGNMENTS.writers)?;
    if let Some(class_id) = body.get("classId").and_then(Value::as_str) {
        class_in_school(&state, &tenant, class_id).await?;
    }
    ASSIGNMENTS.update(&state, &user, &tenant, &id, body).await
}

/// DELETE /api/assignments/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Path(id): Path<String>,
) -> ApiResult {
    ASSIGNMENTS.delete(&state, &user, &tenant, &id).await
}

/// An assignment's class must belong to the school the request is scoped to
async fn class_in_school(state: &AppState, tenant: &Tenant, class_id: &str) -> Result<Record, ApiError> {
    let class = state.store.find_by_id(Collection::Classes, class_id).await;
    let class = tenant.visible(class, "Class not found")?;
    match tenant.id() {
        Some(school_id) if class.school_id() != Some(school_id) => Err(ApiError::not_found("Class not found")),
        _ => Ok(class),
    }
}
