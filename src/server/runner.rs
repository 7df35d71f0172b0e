//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::{store::MessageLog, ws::HubHandle};

use super::{
    handler::{get_room_messages, get_room_stats, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Build the relay's router around shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/health", get(health_check))
        .route("/api/rooms", get(get_room_stats))
        .route("/api/rooms/{room}/messages", get(get_room_messages))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the relay server.
///
/// # Arguments
///
/// * `host` - The host address to bind to (e.g., "127.0.0.1")
/// * `port` - The port number to bind to (e.g., 8080)
pub async fn run_server(
    host: String,
    port: u16,
    hub: HubHandle,
    log: Arc<MessageLog>,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState { hub, log });
    let app = router(state);

    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("room relay listening on {}", listener.local_addr()?);
    tracing::info!("Connect to: ws://{}/ws", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown gracefully");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
