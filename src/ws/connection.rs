//! Per-connection duplex halves bridging the socket and the hub.
//!
//! The reader half turns inbound text frames into broadcast requests;
//! the writer half drains the connection's mailbox onto the socket and
//! keeps the connection alive with periodic pings. The halves share no
//! state: mailbox closure and transport closure are the only
//! termination signals between them.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at, timeout, timeout_at};
use uuid::Uuid;

use super::MAILBOX_CAPACITY;
use super::hub::HubHandle;
use super::message::Connection;

/// How long a single socket write may take.
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// How long to wait for inbound traffic before the connection is
/// considered dead. Refreshed on every pong.
const PONG_TIMEOUT: Duration = Duration::from_secs(60);

/// Ping interval, 9/10 of the pong window.
const PING_PERIOD: Duration = Duration::from_secs(54);

/// Maximum size of a single inbound message, in bytes.
pub const MAX_MESSAGE_BYTES: usize = 512;

/// Run both halves of an upgraded connection until either terminates,
/// then unregister from the hub exactly once.
pub async fn handle_socket(socket: WebSocket, hub: HubHandle, room: String, username: String) {
    let conn_id = Uuid::new_v4();
    let (mailbox_tx, mailbox_rx) = mpsc::channel(MAILBOX_CAPACITY);

    let conn = Connection {
        id: conn_id,
        username: username.clone(),
        mailbox: mailbox_tx,
    };
    if hub.register(conn, room.clone()).await.is_err() {
        tracing::warn!("hub unavailable, dropping connection of '{}'", username);
        return;
    }

    let (sender, receiver) = socket.split();

    let mut read_task = tokio::spawn(read_pump(
        receiver,
        hub.clone(),
        room.clone(),
        username.clone(),
    ));
    let mut write_task = tokio::spawn(write_pump(sender, mailbox_rx));

    // Whichever half finishes first takes the other down with it.
    tokio::select! {
        _ = &mut read_task => write_task.abort(),
        _ = &mut write_task => read_task.abort(),
    };

    if hub.unregister(conn_id, room.clone()).await.is_err() {
        tracing::warn!("hub unavailable during unregister of '{}'", username);
    }
    tracing::info!("client '{}' disconnected from room '{}'", username, room);
}

/// Reader half: forward inbound text frames to the hub as broadcast
/// requests. Terminates on read error, close frame, or an expired read
/// deadline.
async fn read_pump(
    mut receiver: SplitStream<WebSocket>,
    hub: HubHandle,
    room: String,
    username: String,
) {
    let mut deadline = Instant::now() + PONG_TIMEOUT;
    loop {
        let frame = match timeout_at(deadline, receiver.next()).await {
            Err(_) => {
                tracing::warn!("client '{}' missed the liveness window, closing", username);
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                tracing::warn!("read error from '{}': {}", username, e);
                break;
            }
            Ok(Some(Ok(frame))) => frame,
        };
        match frame {
            Message::Text(text) => {
                if hub
                    .broadcast(room.clone(), username.clone(), text.to_string())
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Message::Pong(_) => {
                deadline = Instant::now() + PONG_TIMEOUT;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}

/// Writer half: drain the mailbox onto the socket, coalescing whatever
/// is already queued into a single flush, and ping on a fixed interval.
/// A closed mailbox is the unregistration signal: send a close frame
/// and stop.
async fn write_pump(mut sender: SplitSink<WebSocket, Message>, mut mailbox: mpsc::Receiver<String>) {
    let mut heartbeat = interval_at(Instant::now() + PING_PERIOD, PING_PERIOD);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            pending = mailbox.recv() => match pending {
                Some(payload) => {
                    let batch = async {
                        sender.feed(Message::Text(payload.into())).await?;
                        // Drain whatever arrived since the last write so
                        // a burst goes out in one flush.
                        while let Ok(next) = mailbox.try_recv() {
                            sender.feed(Message::Text(next.into())).await?;
                        }
                        sender.flush().await
                    };
                    match timeout(WRITE_TIMEOUT, batch).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            tracing::warn!("write error: {}", e);
                            break;
                        }
                        Err(_) => {
                            tracing::warn!("write deadline expired, closing");
                            break;
                        }
                    }
                }
                None => {
                    // The hub closed the mailbox: unregistered or evicted.
                    let _ = timeout(WRITE_TIMEOUT, sender.send(Message::Close(None))).await;
                    break;
                }
            },
            _ = heartbeat.tick() => {
                let ping = sender.send(Message::Ping(Vec::new().into()));
                if !matches!(timeout(WRITE_TIMEOUT, ping).await, Ok(Ok(()))) {
                    tracing::warn!("ping not written within the deadline, closing");
                    break;
                }
            }
        }
    }
}
