//! WebSocket upgrade handler and message dispatch.
//!
//! Each connected client receives:
//! 1. A full [`WorkspaceSnapshot`] on connect.
//! 2. One [`WsMessage`] per store event, analysis result or settings change.
//!
//! Clients can edit blocks over the same socket; the resulting store events
//! come back to every client, the sender included.

use std::sync::Arc;

use ain_rs::workspace::Workspace;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt, stream::SplitSink};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, warn};

use crate::broadcast::WsMessage;
use crate::snapshot::WorkspaceSnapshot;

/// Shared state for WebSocket handlers.
#[derive(Clone)]
pub struct WsState {
    pub workspace: Arc<Mutex<Workspace>>,
    pub broadcast_tx: broadcast::Sender<WsMessage>,
}

/// GET /ws: WebSocket upgrade handler.
pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(ws_state): State<WsState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, ws_state))
}

async fn snapshot_message(workspace: &Mutex<Workspace>) -> WsMessage {
    let ws = workspace.lock().await;
    WsMessage::Snapshot {
        data: WorkspaceSnapshot::from_workspace(&ws).to_json(),
    }
}

async fn handle_socket(socket: WebSocket, ws_state: WsState) {
    let (mut sink, mut stream) = socket.split();

    // Subscribe before the snapshot so no event falls between the two.
    let mut broadcast_rx = ws_state.broadcast_tx.subscribe();

    let snapshot = snapshot_message(&ws_state.workspace).await;
    if ws_send(&mut sink, &snapshot).await.is_err() {
        return;
    }
    debug!("WebSocket client connected");

    let workspace_for_resync = ws_state.workspace.clone();
    let forward_task = tokio::spawn(async move {
        loop {
            match broadcast_rx.recv().await {
                Ok(msg) => {
                    if ws_send(&mut sink, &msg).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("WebSocket client lagged by {n} messages, resending snapshot");
                    let msg = snapshot_message(&workspace_for_resync).await;
                    if ws_send(&mut sink, &msg).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(text) => handle_client_message(&text, &ws_state.workspace).await,
            Message::Close(_) => break,
            _ => {}
        }
    }

    debug!("WebSocket client disconnected");
    forward_task.abort();
}

#[derive(serde::Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Add { content: String },
    Edit { id: String, content: String },
    Delete { id: String },
    Reorder { dragged_id: String, target_id: String },
    Clear,
}

/// Apply a JSON command from a client. Malformed or unknown commands are
/// ignored.
async fn handle_client_message(text: &str, workspace: &Mutex<Workspace>) {
    let Ok(msg) = serde_json::from_str::<ClientMessage>(text) else {
        debug!("Ignoring malformed WebSocket message");
        return;
    };

    let mut ws = workspace.lock().await;
    let applied = match msg {
        ClientMessage::Add { content } => ws.add_text(&content).is_some(),
        ClientMessage::Edit { id, content } => ws.edit(&id, &content),
        ClientMessage::Delete { id } => ws.delete(&id),
        ClientMessage::Reorder {
            dragged_id,
            target_id,
        } => ws.move_block(&dragged_id, &target_id),
        ClientMessage::Clear => {
            ws.clear();
            true
        }
    };
    if !applied {
        debug!("WebSocket command had no effect");
    }
}

async fn ws_send(sink: &mut SplitSink<WebSocket, Message>, msg: &WsMessage) -> Result<(), ()> {
    let json = serde_json::to_string(msg).unwrap_or_default();
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
