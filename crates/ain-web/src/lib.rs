//! Browser-facing server for one `ain-rs` composer workspace.
//!
//! `ain-web` exposes a [`Workspace`] over a REST API and a WebSocket
//! endpoint. Every block store mutation is pushed to connected clients, so a
//! front end can render the composer without polling.
//!
//! # Quick start
//!
//! ```ignore
//! use ain_rs::prelude::*;
//! use ain_web::{WebConfig, observe_workspace, spawn_web};
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//!
//! let (ws_tx, _) = tokio::sync::broadcast::channel(256);
//! let workspace = observe_workspace(Workspace::open(ComposerConfig::from_env())?, &ws_tx);
//! let workspace = Arc::new(Mutex::new(workspace));
//!
//! let addr = spawn_web(workspace, ws_tx, WebConfig::default()).await?;
//! println!("Composer: http://{addr}");
//! ```
//!
//! # Architecture
//!
//! ```text
//! Workspace ──StoreEvent──▶ WebBroadcastObserver ──WsMessage──▶ WebSocket clients
//!     ▲                                                               │
//!     └────────── /api/blocks, /api/suggestions, ws commands ─────────┘
//! ```
//!
//! The workspace lives in an `Arc<tokio::sync::Mutex<_>>`. Reorder analysis
//! takes its snapshot under the lock and waits out the simulated latency
//! without it, so edits made meanwhile are not blocked.

mod api;
pub mod broadcast;
mod server;
pub mod snapshot;
mod ws;

pub use broadcast::{WebBroadcastObserver, WsMessage};
pub use snapshot::WorkspaceSnapshot;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use ain_rs::compose::{CompositeObserver, LoggingObserver};
use ain_rs::workspace::Workspace;
use tokio::sync::Mutex;

/// Configuration for the web server.
pub struct WebConfig {
    /// Address to bind to. Default: `127.0.0.1:3001`.
    pub bind_addr: SocketAddr,
    /// Directory of a built front end to serve for non-API paths.
    ///
    /// If `None`, only API/WS endpoints are served.
    pub static_dir: Option<PathBuf>,
    /// WebSocket broadcast channel capacity. Default: 256.
    ///
    /// Clients that fall behind by this many messages receive a fresh
    /// snapshot.
    pub broadcast_capacity: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            static_dir: None,
            broadcast_capacity: 256,
        }
    }
}

/// Route the workspace's store events to both the log and `broadcast_tx`.
pub fn observe_workspace(
    workspace: Workspace,
    broadcast_tx: &tokio::sync::broadcast::Sender<WsMessage>,
) -> Workspace {
    workspace.with_observer(
        CompositeObserver::new()
            .with(LoggingObserver)
            .with(WebBroadcastObserver::new(broadcast_tx.clone())),
    )
}

/// Spawn the web server on a Tokio task and return the bound address.
///
/// The server runs until the Tokio runtime shuts down.
///
/// # Arguments
///
/// * `workspace`: the shared workspace, already passed through
///   [`observe_workspace`] with the same sender.
/// * `broadcast_tx`: sender half of the WebSocket broadcast channel.
/// * `config`: server configuration.
pub async fn spawn_web(
    workspace: Arc<Mutex<Workspace>>,
    broadcast_tx: tokio::sync::broadcast::Sender<WsMessage>,
    config: WebConfig,
) -> std::io::Result<SocketAddr> {
    let router = server::build_router(workspace, broadcast_tx, config.static_dir);
    server::start_server(router, config.bind_addr).await
}
