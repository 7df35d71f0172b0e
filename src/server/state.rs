//! Server state and connection parameters.

use std::sync::Arc;

use serde::Deserialize;

use crate::{store::MessageLog, ws::HubHandle};

/// Query parameters accepted by the join endpoint.
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub room: Option<String>,
    pub username: Option<String>,
}

/// Shared application state, built once at startup and injected into
/// every handler.
pub struct AppState {
    /// Handle for submitting requests to the hub task.
    pub hub: HubHandle,
    /// Per-room message history, shared with the hub.
    pub log: Arc<MessageLog>,
}
