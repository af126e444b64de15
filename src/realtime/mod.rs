pub mod hub;
pub mod messages;

pub use hub::{ConnectionId, RoomEvent, RoomHub};
pub use messages::{ClientMessage, ServerMessage};
