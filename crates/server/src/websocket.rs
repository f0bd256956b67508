//! WebSocket handling
//!
//! `/ws` streams every `UiNotification` to the companion UI as a JSON text
//! frame. Inbound frames are only used for ping/close.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::state::AppState;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Frames queued for one client
enum OutboundMessage {
    Text(String),
    Pong(Bytes),
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let conn_id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);

    let Some(mut feed) = state.presenter().subscribe() else {
        warn!(
            component = "websocket",
            event = "ws.connection.no_feed",
            connection_id = conn_id,
            "Presenter offers no live feed, closing connection"
        );
        return;
    };

    info!(
        component = "websocket",
        event = "ws.connection.opened",
        connection_id = conn_id,
        "WebSocket connection opened"
    );

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<OutboundMessage>(100);

    let send_task = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let frame = match msg {
                OutboundMessage::Text(json) => Message::Text(json.into()),
                OutboundMessage::Pong(data) => Message::Pong(data),
            };
            if ws_tx.send(frame).await.is_err() {
                break;
            }
        }
    });

    let forward_tx = outbound_tx.clone();
    let forward_task = tokio::spawn(async move {
        loop {
            match feed.recv().await {
                Ok(notification) => {
                    let json = match serde_json::to_string(&notification) {
                        Ok(json) => json,
                        Err(e) => {
                            error!(
                                component = "websocket",
                                event = "ws.send.serialize_failed",
                                connection_id = conn_id,
                                error = %e,
                                "Failed to serialize notification"
                            );
                            continue;
                        }
                    };
                    if forward_tx.send(OutboundMessage::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        component = "websocket",
                        event = "ws.feed.lagged",
                        connection_id = conn_id,
                        skipped,
                        "Client fell behind, notifications skipped"
                    );
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Ping(data)) => {
                if outbound_tx.send(OutboundMessage::Pong(data)).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {
                debug!(
                    component = "websocket",
                    connection_id = conn_id,
                    "Ignoring inbound frame"
                );
            }
            Err(e) => {
                debug!(
                    component = "websocket",
                    event = "ws.recv.error",
                    connection_id = conn_id,
                    error = %e,
                    "WebSocket receive error"
                );
                break;
            }
        }
    }

    forward_task.abort();
    send_task.abort();

    info!(
        component = "websocket",
        event = "ws.connection.closed",
        connection_id = conn_id,
        "WebSocket connection closed"
    );
}
