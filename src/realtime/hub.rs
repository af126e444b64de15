//! Room-based pub/sub for connected WebSocket clients.
//!
//! Each room has a lazily created `broadcast::Sender`. Publishing is
//! best-effort: rooms without subscribers drop the event and lagging
//! receivers skip ahead.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;

use super::messages::ServerMessage;

/// Per-room buffer size
const ROOM_CAPACITY: usize = 256;

/// Identifies one WebSocket connection so relays can skip their sender
pub type ConnectionId = u64;

/// An event delivered to a room
#[derive(Debug, Clone)]
pub struct RoomEvent {
    /// Connection that produced the event, or `None` for server-side events
    pub origin: Option<ConnectionId>,
    pub message: ServerMessage,
}

#[derive(Clone, Default)]
pub struct RoomHub {
    rooms: Arc<DashMap<String, broadcast::Sender<Arc<RoomEvent>>>>,
    next_connection: Arc<AtomicU64>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn school_room(school_id: &str) -> String {
        format!("school-{}", school_id)
    }

    pub fn user_room(user_id: &str) -> String {
        format!("user-{}", user_id)
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_connection.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Subscribe to every future event in `room`, creating it if needed
    pub fn subscribe(&self, room: &str) -> broadcast::Receiver<Arc<RoomEvent>> {
        self.rooms
            .entry(room.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .value()
            .subscribe()
    }

    /// Whether anyone is currently listening in `room`
    pub fn has_subscribers(&self, room: &str) -> bool {
        self.rooms.get(room).map(|tx| tx.receiver_count() > 0).unwrap_or(false)
    }

    /// Send to every subscriber of `room`; returns how many receivers got it
    pub fn publish(&self, room: &str, origin: Option<ConnectionId>, message: ServerMessage) -> usize {
        let Some(sender) = self.rooms.get(room) else {
            return 0;
        };
        let delivered = sender.send(Arc::new(RoomEvent { origin, message })).unwrap_or(0);
        tracing::debug!(room, delivered, "room event published");
        delivered
    }

    /// Drop rooms nobody listens to any more
    pub fn prune(&self) {
        self.rooms.retain(|_, tx| tx.receiver_count() > 0);
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_room_subscribers_only() {
        let hub = RoomHub::new();
        let mut school = hub.subscribe("school-1");
        let mut other = hub.subscribe("school-2");

        let sent = hub.publish("school-1", Some(7), ServerMessage::Pong { ts: 1 });
        assert_eq!(sent, 1);

        let event = school.recv().await.unwrap();
        assert_eq!(event.origin, Some(7));
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn publish_to_empty_room_is_dropped() {
        let hub = RoomHub::new();
        assert_eq!(hub.publish("user-x", None, ServerMessage::Pong { ts: 0 }), 0);
        assert!(!hub.has_subscribers("user-x"));
    }

    #[test]
    fn prune_removes_abandoned_rooms() {
        let hub = RoomHub::new();
        let rx = hub.subscribe("user-1");
        assert!(hub.has_subscribers("user-1"));
        drop(rx);
        hub.prune();
        assert_eq!(hub.room_count(), 0);
    }
}
