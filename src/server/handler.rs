//! HTTP and WebSocket endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, ws::WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;

use crate::{
    store::StoredMessage,
    ws::{MAX_MESSAGE_BYTES, RoomStat, handle_socket},
};

use super::state::{AppState, ConnectQuery};

/// Room joined when the client does not name one.
const DEFAULT_ROOM: &str = "general";

/// Display name used when the client does not supply one.
const DEFAULT_USERNAME: &str = "Anonymous";

/// Join endpoint: capacity pre-flight, then upgrade, then registration.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let room = query
        .room
        .filter(|room| !room.is_empty())
        .unwrap_or_else(|| DEFAULT_ROOM.to_string());
    let username = query
        .username
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_USERNAME.to_string());

    // Advisory check before the relatively expensive upgrade; the
    // registration inside the hub re-checks and is authoritative.
    let full = state
        .hub
        .is_room_full(&room)
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;
    if full {
        tracing::warn!("room '{}' full, rejecting join of '{}'", room, username);
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(ws
        .max_message_size(MAX_MESSAGE_BYTES)
        .on_upgrade(move |socket| handle_socket(socket, state.hub.clone(), room, username)))
}

/// Member counts for all currently non-empty rooms.
pub async fn get_room_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoomStat>>, StatusCode> {
    let stats = state
        .hub
        .stats()
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;
    Ok(Json(stats))
}

/// Response body of the history endpoint.
#[derive(Debug, Serialize)]
pub struct RoomMessages {
    pub messages: Vec<StoredMessage>,
}

/// Full history of one room, oldest first. Unknown rooms read as empty.
pub async fn get_room_messages(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Json<RoomMessages> {
    let messages = state.log.read(&room).await;
    Json(RoomMessages { messages })
}

/// Health check endpoint.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
