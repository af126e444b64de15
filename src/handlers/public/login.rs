// handlers/public/login.rs - POST /api/auth/login
//
// Passwords are checked against their bcrypt hash. With SECURITY_DEMO_LOGIN
// enabled any password is accepted for a known email.

use axum::extract::{Json, State};
use serde_json::Value;

use crate::auth::{generate_jwt, password};
use crate::database::{timestamp, Collection, Record};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /api/auth/login - body: { email, password }
pub async fn login(State(state): State<AppState>, Json(body): Json<Value>) -> ApiResult {
    let field = |name: &str| body.get(name).and_then(Value::as_str).filter(|v| !v.is_empty());
    let (Some(email), Some(plain)) = (field("email"), field("password")) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    let Some(user) = state.store.user_by_email(email).await else {
        tracing::info!(email, "login rejected: unknown email");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    let security = &state.config.security;
    if !security.demo_login {
        let hashed = user.get_str("password").unwrap_or_default().to_string();
        if !password::verify(plain.to_string(), hashed).await? {
            tracing::info!(email, "login rejected: bad password");
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
    }

    if !user.is_active() {
        return Err(ApiError::forbidden("Account is deactivated"));
    }

    let id = user.id().unwrap_or_default().to_string();
    let user = state
        .store
        .update(Collection::Users, &id, Record::new().with("lastLogin", timestamp()))
        .await?;
    let token = generate_jwt(&id, security)?;

    tracing::info!(user = %id, "login succeeded");
    Ok(ApiResponse::ok()
        .with("user", user.without("password"))
        .with("token", token)
        .message("Login successful"))
}
