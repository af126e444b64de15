use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Keyed JSON envelope: `{ "<resource>": ..., "message": ... }`
#[derive(Debug)]
pub struct ApiResponse {
    body: Map<String, Value>,
    status_code: StatusCode,
    /// First serialization failure, reported as a 500
    failure: Option<String>,
}

impl ApiResponse {
    /// Create a successful API response with default 200 status
    pub fn ok() -> Self {
        Self::with_status(StatusCode::OK)
    }

    /// Create a 201 Created response
    pub fn created() -> Self {
        Self::with_status(StatusCode::CREATED)
    }

    /// Create an API response with custom status code
    pub fn with_status(status_code: StatusCode) -> Self {
        Self {
            body: Map::new(),
            status_code,
            failure: None,
        }
    }

    /// Add a keyed value to the envelope
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.body.insert(key.to_string(), value);
            }
            Err(e) => {
                self.failure.get_or_insert_with(|| format!("{}: {}", key, e));
            }
        }
        self
    }

    pub fn message(self, message: &str) -> Self {
        self.with("message", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status_code
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        if let Some(failure) = self.failure {
            tracing::error!("Failed to serialize response data: {}", failure);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to serialize response data",
                    "code": "INTERNAL_SERVER_ERROR"
                })),
            )
                .into_response();
        }

        (self.status_code, Json(Value::Object(self.body))).into_response()
    }
}

// Convenience type alias
pub type ApiResult = Result<ApiResponse, crate::error::ApiError>;
