// handlers/protected/chat.rs - /api/chat assistant conversation history

use axum::extract::{Extension, State};

use crate::database::{Collection, Record};
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /api/chat/history - the caller's assistant messages, oldest first
pub async fn history(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult {
    let messages = messages_for(&state, &user.id).await;
    Ok(ApiResponse::ok().with("messages", messages))
}

/// DELETE /api/chat/history
pub async fn clear(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult {
    let removed = clear_for(&state, &user.id).await?;
    tracing::debug!(user = %user.id, removed, "chat history cleared");
    Ok(ApiResponse::ok().message("Chat history cleared successfully"))
}

/// All chat messages of a user in chronological order
pub(crate) async fn messages_for(state: &AppState, user_id: &str) -> Vec<Record> {
    let mut messages = state
        .store
        .find(Collection::ChatMessages, &Filter::new().eq("userId", user_id))
        .await;
    messages.sort_by(|a, b| a.datetime("timestamp").cmp(&b.datetime("timestamp")));
    messages
}

pub(crate) async fn clear_for(state: &AppState, user_id: &str) -> Result<usize, crate::database::StoreError> {
    let messages = messages_for(state, user_id).await;
    for message in &messages {
        if let Some(id) = message.id() {
            state.store.delete(Collection::ChatMessages, id).await?;
        }
    }
    Ok(messages.len())
}
