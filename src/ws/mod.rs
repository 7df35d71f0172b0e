//! WebSocket relay core: broadcast hub and connection adapter.

mod connection;
mod hub;
mod message;

pub use connection::{MAX_MESSAGE_BYTES, handle_socket};
pub use hub::{Hub, HubError, HubHandle};
pub use message::{ConnId, Connection, HubCommand, RoomStat, WireMessage};

/// Maximum number of members per room.
pub const ROOM_CAPACITY: usize = 50;

/// Maximum number of pending messages per connection mailbox.
pub const MAILBOX_CAPACITY: usize = 256;

/// Capacity of the hub's ingress queue.
pub const INGRESS_CAPACITY: usize = 128;
