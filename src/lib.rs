//! Room-scoped WebSocket message relay.
//!
//! Clients join named rooms over WebSocket and broadcast text messages
//! to every member of their room. A single hub task owns all membership
//! state; per-room history lives in a shared message log.

pub mod common;
pub mod server;
pub mod store;
pub mod ws;
