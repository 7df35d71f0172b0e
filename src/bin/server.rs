//! Room-scoped WebSocket broadcast relay server.
//!
//! Clients join a named room over `/ws` and every text message they
//! send is broadcast to the whole room.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin roomcast-server
//! cargo run --bin roomcast-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;

use roomcast::{common::logger::setup_logger, server::run_server, store::MessageLog, ws::Hub};

#[derive(Parser, Debug)]
#[command(name = "roomcast-server")]
#[command(about = "Room-scoped WebSocket broadcast relay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    let log = Arc::new(MessageLog::new());
    let (hub, handle) = Hub::new(log.clone());
    tokio::spawn(hub.run());

    if let Err(e) = run_server(args.host, args.port, handle, log).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
