use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::header::CONTENT_TYPE,
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use super::auth::AuthUser;
use crate::database::Record;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::state::AppState;

/// The school a request is scoped to
#[derive(Clone, Debug, PartialEq)]
pub struct Tenant {
    pub school_id: Option<String>,
    /// Super-admin requests may read any school's records
    pub unrestricted: bool,
}

impl Tenant {
    pub fn id(&self) -> Option<&str> {
        self.school_id.as_deref()
    }

    /// The tenant id, or 400 when the request has none
    pub fn require(&self) -> Result<&str, ApiError> {
        self.id().ok_or_else(|| ApiError::bad_request("School ID required"))
    }

    /// Whether a stored record is visible to this request
    pub fn permits(&self, record: &Record) -> bool {
        self.unrestricted || (self.school_id.is_some() && record.school_id() == self.id())
    }

    /// Restrict a filter to the tenant's school, if any
    pub fn scope(&self, filter: Filter) -> Filter {
        filter.eq_opt("schoolId", self.id())
    }

    /// A by-id lookup result, with other schools' records treated as missing
    pub fn visible(&self, record: Option<Record>, not_found: &str) -> Result<Record, ApiError> {
        record
            .filter(|r| self.permits(r))
            .ok_or_else(|| ApiError::not_found(not_found))
    }
}

/// Resolves the tenant for an authenticated request.
///
/// Super-admins pick a school through `schoolId` in the query string or JSON
/// body, or stay unscoped. Everybody else is pinned to their own school.
pub async fn tenant_middleware(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Access token required"))?;

    let (tenant, mut request) = if auth_user.is_super_admin() {
        let (school_id, request) = requested_school(request, state.config.server.max_request_size_bytes).await?;
        (Tenant { school_id, unrestricted: true }, request)
    } else {
        let school_id = auth_user
            .school_id
            .clone()
            .ok_or_else(|| ApiError::forbidden("No school assigned to user"))?;
        (Tenant { school_id: Some(school_id), unrestricted: false }, request)
    };

    tracing::debug!(user = %auth_user.id, school = ?tenant.school_id, "tenant resolved");
    request.extensions_mut().insert(tenant);
    Ok(next.run(request).await)
}

/// `schoolId` from the query string, else from a JSON body
async fn requested_school(request: Request, limit: usize) -> Result<(Option<String>, Request), ApiError> {
    if let Some(query) = request.uri().query() {
        let from_query = url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, v)| k == "schoolId" && !v.is_empty())
            .map(|(_, v)| v.into_owned());
        if from_query.is_some() {
            return Ok((from_query, request));
        }
    }

    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if !is_json {
        return Ok((None, request));
    }

    // Buffer the body so the handler can still read it
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, limit)
        .await
        .map_err(|_| ApiError::bad_request("Request body too large"))?;
    let from_body = serde_json::from_slice::<Value>(&bytes)
        .ok()
        .and_then(|v| v.get("schoolId").and_then(Value::as_str).map(str::to_string))
        .filter(|s| !s.is_empty());

    Ok((from_body, Request::from_parts(parts, Body::from(bytes))))
}
