//! Append-only per-room message history.
//!
//! The log is the one piece of state shared between the hub loop and
//! external read handlers, so it carries its own lock instead of
//! relying on the hub's serialization.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::common::time::now_rfc3339;

/// A message as persisted in a room's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: String,
    pub room: String,
    pub sender: String,
    pub content: String,
    pub created_at: String,
    pub kind: String,
}

impl StoredMessage {
    /// Persisted form of a broadcast message: fresh unique identifier,
    /// current timestamp, kind `"message"`.
    pub fn new(room: &str, sender: &str, content: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            room: room.to_string(),
            sender: sender.to_string(),
            content: content.to_string(),
            created_at: now_rfc3339(),
            kind: "message".to_string(),
        }
    }
}

/// Room-keyed append-only history. `append` is called only by the hub,
/// in broadcast order; `read` may be called from any task.
#[derive(Debug, Default)]
pub struct MessageLog {
    rooms: RwLock<HashMap<String, Vec<StoredMessage>>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to its room's history.
    pub async fn append(&self, message: StoredMessage) {
        let mut rooms = self.rooms.write().await;
        rooms.entry(message.room.clone()).or_default().push(message);
    }

    /// Snapshot of a room's history in append order. Unknown rooms
    /// yield an empty history, not an error.
    pub async fn read(&self, room: &str) -> Vec<StoredMessage> {
        let rooms = self.rooms.read().await;
        rooms.get(room).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn append_preserves_broadcast_order() {
        let log = MessageLog::new();
        for content in ["one", "two", "three"] {
            log.append(StoredMessage::new("lobby", "alice", content))
                .await;
        }

        let history = log.read("lobby").await;
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["one", "two", "three"]);
    }

    #[tokio::test]
    async fn unknown_room_reads_as_empty() {
        let log = MessageLog::new();
        assert!(log.read("nowhere").await.is_empty());
    }

    #[tokio::test]
    async fn identifiers_are_unique() {
        let log = MessageLog::new();
        log.append(StoredMessage::new("lobby", "alice", "hi")).await;
        log.append(StoredMessage::new("lobby", "alice", "hi")).await;

        let history = log.read("lobby").await;
        assert_ne!(history[0].id, history[1].id);
    }

    #[tokio::test]
    async fn rooms_do_not_share_history() {
        let log = MessageLog::new();
        log.append(StoredMessage::new("lobby", "alice", "hi")).await;
        log.append(StoredMessage::new("den", "bob", "yo")).await;

        assert_eq!(log.read("lobby").await.len(), 1);
        assert_eq!(log.read("den").await.len(), 1);
        assert_eq!(log.read("den").await[0].sender, "bob");
    }

    #[tokio::test]
    async fn concurrent_reads_observe_a_consistent_prefix() {
        let log = Arc::new(MessageLog::new());
        let writer = {
            let log = log.clone();
            tokio::spawn(async move {
                for i in 0..100 {
                    log.append(StoredMessage::new("lobby", "alice", &i.to_string()))
                        .await;
                }
            })
        };

        // Reads interleaved with appends must always see a prefix of
        // the append order, never a reordering.
        for _ in 0..20 {
            let history = log.read("lobby").await;
            for (i, message) in history.iter().enumerate() {
                assert_eq!(message.content, i.to_string());
            }
            tokio::task::yield_now().await;
        }

        writer.await.unwrap();
        assert_eq!(log.read("lobby").await.len(), 100);
    }

    #[test]
    fn stored_message_serializes_camel_case() {
        let message = StoredMessage::new("lobby", "alice", "hi");
        let value = serde_json::to_value(&message).unwrap();
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["kind"], "message");
        assert_eq!(value["room"], "lobby");
    }
}
