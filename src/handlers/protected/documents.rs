// handlers/protected/documents.rs - /api/documents
//
// A document is visible to its owner and, for admins, to anyone managing
// the same school.

use axum::{
    extract::{Extension, Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::auth::Role;
use crate::database::{Collection, Record};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Tenant};
use crate::state::AppState;

/// GET /api/documents - the caller's documents in the tenant's school
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
) -> ApiResult {
    let filter = tenant.scope(Filter::new().eq("userId", user.id.as_str()));
    let documents = state.store.find(Collection::Documents, &filter).await;
    Ok(ApiResponse::ok().with("documents", documents))
}

/// GET /api/documents/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Path(id): Path<String>,
) -> ApiResult {
    let document = load_document(&state, &user, &tenant, &id).await?;
    Ok(ApiResponse::ok().with("document", document))
}

/// GET /api/documents/download/:id - stored content as a PDF attachment
pub async fn download(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let document = load_document(&state, &user, &tenant, &id).await?;
    let filename = document.get_str("filename").unwrap_or("document.pdf").replace('"', "");
    let content = document.get_str("content").unwrap_or_default().to_string();

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        content,
    )
        .into_response())
}

/// DELETE /api/documents/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Path(id): Path<String>,
) -> ApiResult {
    load_document(&state, &user, &tenant, &id).await?;
    let removed = state.store.delete(Collection::Documents, &id).await?;
    Ok(ApiResponse::ok()
        .with("document", removed)
        .message("Document deleted successfully"))
}

async fn load_document(state: &AppState, user: &AuthUser, tenant: &Tenant, id: &str) -> Result<Record, ApiError> {
    let admin = user.has_role(&[Role::SuperAdmin, Role::SchoolAdmin]);
    state
        .store
        .find_by_id(Collection::Documents, id)
        .await
        .filter(|d| d.user_id() == Some(user.id.as_str()) || (admin && tenant.permits(d)))
        .ok_or_else(|| ApiError::not_found("Document not found"))
}
