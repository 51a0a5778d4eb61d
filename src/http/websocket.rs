//! WebSocket client connections.
//!
//! # Responsibilities
//! - Complete the upgrade handshake on the WebSocket path
//! - Track each connection until it closes
//! - Send a close frame (1001, going away) when the gateway stops
//!
//! Frames from the client are read and discarded; the client protocol lives
//! outside this crate.

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};

use crate::http::server::AppState;

/// Upgrade handler mounted on the WebSocket path.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let guard = state.connections.track();
    tracing::debug!(connection_id = %guard.id(), "WebSocket connected");

    loop {
        tokio::select! {
            _ = state.shutdown.wait() => {
                let frame = CloseFrame {
                    code: close_code::AWAY,
                    reason: "server shutting down".into(),
                };
                let _ = socket.send(Message::Close(Some(frame))).await;
                break;
            }
            message = socket.recv() => match message {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(connection_id = %guard.id(), error = %e, "WebSocket error");
                    break;
                }
            },
        }
    }

    tracing::debug!(connection_id = %guard.id(), "WebSocket disconnected");
}
