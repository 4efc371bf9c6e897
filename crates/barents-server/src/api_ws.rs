//! WebSocket live-feed handler.
//!
//! `GET /ws` upgrades the connection and registers the viewer with the
//! shared [`FeedRegistry`]. From then on the viewer receives each newly
//! accepted sighting as one JSON text frame. The channel is one-way:
//! inbound frames other than close are read and discarded.

use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Extension, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Per-viewer delivery buffer. A viewer that falls this many sightings
/// behind starts losing individual messages, not the connection.
const VIEWER_BUFFER: usize = 256;

/// Handler for `GET /ws`.
pub async fn ws_handler(
    Extension(state): Extension<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drives one viewer connection until it closes.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (tx, mut rx) = mpsc::channel::<String>(VIEWER_BUFFER);
    let subscriber = state.feed.register(tx).await;
    tracing::info!("live viewer connected");

    // Forward broadcast sightings to the socket.
    let send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    // Drain inbound frames so pings and closes are processed. Anything
    // else from the client carries no meaning here.
    while let Some(Ok(msg)) = ws_receiver.next().await {
        if let Message::Close(_) = msg {
            break;
        }
    }

    state.feed.unregister(subscriber).await;
    send_task.abort();
    tracing::info!("live viewer disconnected");
}
