// handlers/protected/ai.rs - /api/ai assistant endpoints

use axum::extract::{Extension, Json, Query, State};
use serde::Deserialize;
use serde_json::{json, Value};

use super::chat::{clear_for, messages_for};
use crate::database::{timestamp, Collection, Record};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Tenant};
use crate::services::ai::{self, VOICE_TRANSCRIPTION};
use crate::services::documents::{self, DocumentType};
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// POST /api/ai/chat - body: { message }
pub async fn chat(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Json(body): Json<Value>,
) -> ApiResult {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Message is required"))?;

    let (response, saved) = converse(&state, &user, &tenant, message).await;
    Ok(ApiResponse::ok()
        .with("response", response)
        .with("messageId", saved.id())
        .with("timestamp", saved.value_of("timestamp")))
}

/// POST /api/ai/voice - fixed transcription answered like a chat message
pub async fn voice(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
) -> ApiResult {
    let (response, _) = converse(&state, &user, &tenant, VOICE_TRANSCRIPTION).await;
    Ok(ApiResponse::ok()
        .with("transcription", VOICE_TRANSCRIPTION)
        .with("response", response)
        .message("Voice command processed successfully"))
}

/// POST /api/ai/generate-document - body: { type, data }
pub async fn generate_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Json(body): Json<Value>,
) -> ApiResult {
    let (Some(kind), Some(data)) = (body.get("type").and_then(Value::as_str), body.get("data")) else {
        return Err(ApiError::bad_request("Document type and data are required"));
    };
    let kind = DocumentType::parse(kind).ok_or_else(|| ApiError::bad_request("Invalid document type"))?;

    let school = school_of(&state, &tenant).await;
    let generated = documents::generate(kind, data, school.as_ref())?;

    let record = Record::new()
        .with("userId", user.id.as_str())
        .with("schoolId", tenant.id())
        .with("type", kind.as_str())
        .with("filename", generated.filename.as_str())
        .with("content", generated.content.as_str())
        .with("data", data.clone());
    let saved = state.store.create(Collection::Documents, record).await;
    let id = saved.id().unwrap_or_default();

    Ok(ApiResponse::ok()
        .with(
            "document",
            json!({
                "id": id,
                "type": generated.kind,
                "filename": generated.filename,
                "content": generated.content,
                "downloadUrl": format!("/api/documents/download/{}", id),
            }),
        )
        .message("Document generated successfully"))
}

/// GET /api/ai/chat-history?limit=N - the last N messages in chronological order
pub async fn chat_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult {
    let mut messages = messages_for(&state, &user.id).await;
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let skip = messages.len().saturating_sub(limit);
    let messages: Vec<Record> = messages.drain(skip..).collect();
    Ok(ApiResponse::ok().with("messages", messages))
}

/// DELETE /api/ai/chat-history
pub async fn clear_history(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult {
    clear_for(&state, &user.id).await?;
    Ok(ApiResponse::ok().message("Chat history cleared successfully"))
}

/// GET /api/ai/suggestions
pub async fn suggestions(Extension(user): Extension<AuthUser>) -> ApiResult {
    Ok(ApiResponse::ok().with("suggestions", ai::suggestions(user.role)))
}

/// Answer `message` and keep the exchange in the caller's chat history
async fn converse(state: &AppState, user: &AuthUser, tenant: &Tenant, message: &str) -> (String, Record) {
    let school = school_of(state, tenant).await;
    let response = state.ai.respond(message, user.role, school.as_ref()).await;

    let entry = Record::new()
        .with("userId", user.id.as_str())
        .with("schoolId", tenant.id())
        .with("message", message)
        .with("response", response.as_str())
        .with("timestamp", timestamp());
    let saved = state.store.create(Collection::ChatMessages, entry).await;
    (response, saved)
}

async fn school_of(state: &AppState, tenant: &Tenant) -> Option<Record> {
    match tenant.id() {
        Some(id) => state.store.find_by_id(Collection::Schools, id).await,
        None => None,
    }
}
