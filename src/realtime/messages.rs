use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Incoming WebSocket messages from the client
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    JoinSchool {
        #[serde(rename = "schoolId")]
        school_id: String,
    },
    JoinUser {
        #[serde(rename = "userId")]
        user_id: String,
    },
    /// Relayed to the school room, minus the sender
    ChatMessage {
        #[serde(rename = "schoolId")]
        school_id: String,
        #[serde(flatten)]
        payload: Map<String, Value>,
    },
    /// Relayed to the user room, minus the sender
    Notification {
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(flatten)]
        payload: Map<String, Value>,
    },
    Ping {
        ts: i64,
    },
}

/// Outgoing WebSocket messages to the client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Joined { room: String },
    NewMessage(Map<String, Value>),
    NewNotification(Map<String, Value>),
    Error { message: String },
    Pong { ts: i64 },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_message_keeps_extra_fields() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "chatMessage",
            "schoolId": "school-1",
            "text": "hello"
        }))
        .unwrap();
        match msg {
            ClientMessage::ChatMessage { school_id, payload } => {
                assert_eq!(school_id, "school-1");
                assert_eq!(payload.get("text"), Some(&json!("hello")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn server_messages_are_type_tagged() {
        let mut body = Map::new();
        body.insert("text".to_string(), json!("hi"));
        let value = serde_json::to_value(ServerMessage::NewMessage(body)).unwrap();
        assert_eq!(value, json!({ "type": "newMessage", "text": "hi" }));

        let value = serde_json::to_value(ServerMessage::Joined { room: "user-1".into() }).unwrap();
        assert_eq!(value, json!({ "type": "joined", "room": "user-1" }));
    }
}
