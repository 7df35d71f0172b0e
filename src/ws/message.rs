//! Hub ingress protocol and wire types.

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Identity of a single WebSocket connection.
pub type ConnId = Uuid;

/// Hub-side handle to one connection: its display name and the sending
/// end of its mailbox. The hub never owns the connection itself;
/// dropping the mailbox sender is the signal for the writer half to
/// shut the transport down.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnId,
    pub username: String,
    pub mailbox: mpsc::Sender<String>,
}

/// A chat message as it travels to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub room: String,
    pub sender: String,
    pub content: String,
}

/// Member count of a single non-empty room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomStat {
    pub name: String,
    pub count: usize,
}

/// Requests accepted by the hub over its ingress channel.
#[derive(Debug)]
pub enum HubCommand {
    /// Add a connection to a room, subject to the capacity limit.
    Register { conn: Connection, room: String },
    /// Remove a connection from a room. Idempotent.
    Unregister { conn_id: ConnId, room: String },
    /// Persist a message and fan it out to every member of a room.
    Broadcast {
        room: String,
        sender: String,
        content: String,
    },
    /// Report member counts for all non-empty rooms.
    Stats {
        reply: oneshot::Sender<Vec<RoomStat>>,
    },
    /// Report whether a room is at capacity.
    IsFull {
        room: String,
        reply: oneshot::Sender<bool>,
    },
}
