//! The broadcast hub: one task that owns all room membership.
//!
//! Every mutation of room state arrives over the hub's ingress channel
//! and is applied by a single serialized loop, so membership needs no
//! locking. The message log is the only state shared across the loop
//! boundary and carries its own lock.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::store::{MessageLog, StoredMessage};

use super::message::{ConnId, Connection, HubCommand, RoomStat, WireMessage};
use super::{INGRESS_CAPACITY, ROOM_CAPACITY};

/// Error returned by [`HubHandle`] operations.
#[derive(Debug, Error)]
pub enum HubError {
    /// The hub task has stopped and can no longer service requests.
    #[error("hub is no longer running")]
    HubClosed,
}

/// Cloneable handle for submitting requests to the hub task.
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Submit a connection for membership in `room`.
    ///
    /// Fire-and-forget: an over-capacity registration is resolved inside
    /// the hub by closing the connection's mailbox, not reported here.
    pub async fn register(&self, conn: Connection, room: String) -> Result<(), HubError> {
        self.tx
            .send(HubCommand::Register { conn, room })
            .await
            .map_err(|_| HubError::HubClosed)
    }

    /// Remove a connection from `room`. Idempotent.
    pub async fn unregister(&self, conn_id: ConnId, room: String) -> Result<(), HubError> {
        self.tx
            .send(HubCommand::Unregister { conn_id, room })
            .await
            .map_err(|_| HubError::HubClosed)
    }

    /// Broadcast `content` from `sender` to every member of `room`.
    pub async fn broadcast(
        &self,
        room: String,
        sender: String,
        content: String,
    ) -> Result<(), HubError> {
        self.tx
            .send(HubCommand::Broadcast {
                room,
                sender,
                content,
            })
            .await
            .map_err(|_| HubError::HubClosed)
    }

    /// Member counts for all currently non-empty rooms, as one
    /// consistent snapshot.
    pub async fn stats(&self) -> Result<Vec<RoomStat>, HubError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(HubCommand::Stats { reply })
            .await
            .map_err(|_| HubError::HubClosed)?;
        rx.await.map_err(|_| HubError::HubClosed)
    }

    /// Whether `room` is at capacity. Advisory: registration re-checks
    /// and its answer is the authoritative one.
    pub async fn is_room_full(&self, room: &str) -> Result<bool, HubError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(HubCommand::IsFull {
                room: room.to_string(),
                reply,
            })
            .await
            .map_err(|_| HubError::HubClosed)?;
        rx.await.map_err(|_| HubError::HubClosed)
    }
}

/// Room membership coordinator. Create with [`Hub::new`], then drive it
/// by spawning [`Hub::run`].
pub struct Hub {
    ingress: mpsc::Receiver<HubCommand>,
    rooms: HashMap<String, HashMap<ConnId, Connection>>,
    log: Arc<MessageLog>,
}

impl Hub {
    pub fn new(log: Arc<MessageLog>) -> (Self, HubHandle) {
        let (tx, ingress) = mpsc::channel(INGRESS_CAPACITY);
        (
            Self {
                ingress,
                rooms: HashMap::new(),
                log,
            },
            HubHandle { tx },
        )
    }

    /// Process ingress requests one at a time, FIFO, until every handle
    /// is dropped.
    pub async fn run(mut self) {
        while let Some(cmd) = self.ingress.recv().await {
            match cmd {
                HubCommand::Register { conn, room } => self.register(conn, &room).await,
                HubCommand::Unregister { conn_id, room } => self.unregister(conn_id, &room),
                HubCommand::Broadcast {
                    room,
                    sender,
                    content,
                } => self.broadcast(room, sender, content).await,
                HubCommand::Stats { reply } => {
                    let _ = reply.send(self.stats());
                }
                HubCommand::IsFull { room, reply } => {
                    let _ = reply.send(self.member_count(&room) >= ROOM_CAPACITY);
                }
            }
        }
        tracing::info!("hub ingress closed, stopping");
    }

    fn member_count(&self, room: &str) -> usize {
        self.rooms.get(room).map_or(0, |members| members.len())
    }

    async fn register(&mut self, conn: Connection, room: &str) {
        if self.member_count(room) >= ROOM_CAPACITY {
            tracing::warn!("room '{}' full, rejecting client '{}'", room, conn.username);
            // Dropping `conn` closes its mailbox; the writer half
            // observes the closure and shuts the transport down.
            return;
        }

        // History snapshot taken in the same hub turn as registration:
        // the joiner sees exactly the history plus everything broadcast
        // after this turn.
        for stored in self.log.read(room).await {
            let payload = match serde_json::to_string(&stored) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!("failed to encode history entry: {}", e);
                    continue;
                }
            };
            if conn.mailbox.try_send(payload).is_err() {
                tracing::warn!(
                    "mailbox of '{}' cannot absorb history of room '{}', dropping join",
                    conn.username,
                    room
                );
                return;
            }
        }

        let username = conn.username.clone();
        let members = self.rooms.entry(room.to_string()).or_default();
        members.insert(conn.id, conn);
        tracing::info!(
            "client '{}' registered in room '{}', members: {}",
            username,
            room,
            members.len()
        );
    }

    fn unregister(&mut self, conn_id: ConnId, room: &str) {
        let Some(members) = self.rooms.get_mut(room) else {
            return;
        };
        let Some(conn) = members.remove(&conn_id) else {
            return;
        };
        tracing::info!(
            "client '{}' unregistered from room '{}', members: {}",
            conn.username,
            room,
            members.len()
        );
        if members.is_empty() {
            self.rooms.remove(room);
        }
    }

    async fn broadcast(&mut self, room: String, sender: String, content: String) {
        let wire = WireMessage {
            room,
            sender,
            content,
        };
        let payload = match serde_json::to_string(&wire) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("failed to encode message: {}", e);
                return;
            }
        };

        // Append under the log's own lock before any fan-out.
        self.log
            .append(StoredMessage::new(&wire.room, &wire.sender, &wire.content))
            .await;

        let Some(members) = self.rooms.get_mut(&wire.room) else {
            return;
        };
        // A member whose mailbox cannot take the message right now is
        // evicted in the same pass; a stuck socket must never stall the
        // rest of the room.
        members.retain(|_, member| match member.mailbox.try_send(payload.clone()) {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(
                    "mailbox of '{}' is not keeping up, evicting from room '{}'",
                    member.username,
                    wire.room
                );
                false
            }
        });
        if members.is_empty() {
            self.rooms.remove(&wire.room);
        }
    }

    fn stats(&self) -> Vec<RoomStat> {
        self.rooms
            .iter()
            .map(|(name, members)| RoomStat {
                name: name.clone(),
                count: members.len(),
            })
            .collect()
    }
}
