// handlers/public/health.rs - GET /api/health

use axum::response::Json;
use serde_json::{json, Value};

use crate::database::timestamp;

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": timestamp(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
