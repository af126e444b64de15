use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{validate_jwt, Role};
use crate::database::{Collection, Record};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user context, loaded from the store for every request
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    /// `None` when the stored role is not one we know
    pub role: Option<Role>,
    pub school_id: Option<String>,
    /// The user record without its password hash
    pub record: Record,
}

impl AuthUser {
    pub fn from_record(record: Record) -> Option<Self> {
        let record = record.without("password");
        Some(Self {
            id: record.id()?.to_string(),
            role: record.get_str("role").and_then(|r| r.parse().ok()),
            school_id: record.school_id().map(str::to_string),
            record,
        })
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Some(Role::SuperAdmin)
    }

    pub fn has_role(&self, roles: &[Role]) -> bool {
        self.role.is_some_and(|role| roles.contains(&role))
    }

    /// 403 unless the caller holds one of `roles`
    pub fn require_role(&self, roles: &[Role]) -> Result<(), ApiError> {
        if self.has_role(roles) {
            Ok(())
        } else {
            tracing::warn!(user = %self.id, role = ?self.role, "insufficient permissions");
            Err(ApiError::forbidden("Insufficient permissions"))
        }
    }
}

/// JWT authentication middleware that validates tokens and attaches the user
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).ok_or_else(|| ApiError::unauthorized("Access token required"))?;

    let auth_user = authenticate(&state, &token).await?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Resolve a bearer token to an active user
pub async fn authenticate(state: &AppState, token: &str) -> Result<AuthUser, ApiError> {
    let claims = validate_jwt(token, &state.config.security).map_err(|e| {
        tracing::warn!("token rejected: {}", e);
        ApiError::forbidden("Invalid or expired token")
    })?;

    state
        .store
        .find_by_id(Collection::Users, &claims.sub)
        .await
        .filter(Record::is_active)
        .and_then(AuthUser::from_record)
        .ok_or_else(|| {
            tracing::warn!(user = %claims.sub, "token for missing or inactive user");
            ApiError::forbidden("User not found or inactive")
        })
}

/// Extract JWT token from the Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}
