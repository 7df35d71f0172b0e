//! Shared message history store.

mod message_log;

pub use message_log::{MessageLog, StoredMessage};
