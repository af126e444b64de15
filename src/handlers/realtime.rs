// handlers/realtime.rs - GET /ws?token=<jwt> room-based realtime channel
//
// Each joined room gets a forwarding task that drains the room's broadcast
// receiver into the connection's outgoing queue, skipping events this
// connection published itself.

use std::collections::HashMap;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio::task::JoinHandle;

use crate::error::ApiError;
use crate::middleware::{authenticate, AuthUser};
use crate::realtime::{ClientMessage, ConnectionId, RoomHub, ServerMessage};
use crate::state::AppState;

/// Outgoing queue per connection
const OUTBOX_CAPACITY: usize = 64;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Access token required"))?;
    let user = authenticate(&state, &token).await?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state.hub.clone(), user)))
}

async fn handle_socket(socket: WebSocket, hub: RoomHub, user: AuthUser) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(OUTBOX_CAPACITY);

    let mut conn = Connection::new(hub, user, tx);
    tracing::info!(user = %conn.user.id, connection = conn.id, "websocket connected");

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("failed to encode server message: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => conn.on_text(&text).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(connection = conn.id, "websocket receive error: {}", e);
                break;
            }
        }
    }

    conn.close().await;
    writer.abort();
}

struct Connection {
    id: ConnectionId,
    hub: RoomHub,
    user: AuthUser,
    outbox: mpsc::Sender<ServerMessage>,
    rooms: HashMap<String, JoinHandle<()>>,
}

impl Connection {
    fn new(hub: RoomHub, user: AuthUser, outbox: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            id: hub.next_connection_id(),
            hub,
            user,
            outbox,
            rooms: HashMap::new(),
        }
    }

    async fn reply(&self, message: ServerMessage) {
        // the writer only stops once the socket is gone
        let _ = self.outbox.send(message).await;
    }

    async fn on_text(&mut self, text: &str) {
        let message = match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(connection = self.id, "unreadable client message: {}", e);
                self.reply(ServerMessage::error("Invalid message")).await;
                return;
            }
        };

        match message {
            ClientMessage::JoinSchool { school_id } => {
                if self.may_use_school(&school_id) {
                    self.join(RoomHub::school_room(&school_id)).await;
                } else {
                    self.reply(ServerMessage::error("Cannot join another school")).await;
                }
            }
            ClientMessage::JoinUser { user_id } => {
                if self.user.is_super_admin() || user_id == self.user.id {
                    self.join(RoomHub::user_room(&user_id)).await;
                } else {
                    self.reply(ServerMessage::error("Cannot join another user")).await;
                }
            }
            ClientMessage::ChatMessage { school_id, mut payload } => {
                if !self.may_use_school(&school_id) {
                    self.reply(ServerMessage::error("Cannot message another school")).await;
                    return;
                }
                payload.insert("schoolId".into(), Value::from(school_id.as_str()));
                self.hub.publish(
                    &RoomHub::school_room(&school_id),
                    Some(self.id),
                    ServerMessage::NewMessage(payload),
                );
            }
            ClientMessage::Notification { user_id, mut payload } => {
                payload.insert("userId".into(), Value::from(user_id.as_str()));
                self.hub.publish(
                    &RoomHub::user_room(&user_id),
                    Some(self.id),
                    ServerMessage::NewNotification(payload),
                );
            }
            ClientMessage::Ping { ts } => self.reply(ServerMessage::Pong { ts }).await,
        }
    }

    fn may_use_school(&self, school_id: &str) -> bool {
        self.user.is_super_admin() || self.user.school_id.as_deref() == Some(school_id)
    }

    async fn join(&mut self, room: String) {
        if !self.rooms.contains_key(&room) {
            let outbox = self.outbox.clone();
            let mut events = self.hub.subscribe(&room);
            let me = self.id;
            let name = room.clone();

            let task = tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(event) if event.origin == Some(me) => continue,
                        Ok(event) => {
                            if outbox.send(event.message.clone()).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(room = %name, skipped, "slow websocket client skipped events");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });
            self.rooms.insert(room.clone(), task);
        }

        tracing::debug!(connection = self.id, room = %room, "joined room");
        self.reply(ServerMessage::Joined { room }).await;
    }

    async fn close(&mut self) {
        for (_, task) in self.rooms.drain() {
            task.abort();
            // the receiver is only released once the aborted task is dropped
            let _ = task.await;
        }
        self.hub.prune();
        tracing::info!(user = %self.user.id, connection = self.id, "websocket disconnected");
    }
}
