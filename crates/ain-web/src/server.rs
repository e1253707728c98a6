//! Axum server setup and router construction.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use ain_rs::workspace::Workspace;
use axum::Router;
use axum::routing::{get, post, put};
use tokio::sync::{Mutex, broadcast};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::api::{self, AppState};
use crate::broadcast::WsMessage;
use crate::ws::{self, WsState};

/// Build the full axum router.
///
/// The router serves:
/// - WebSocket at `/ws`
/// - REST API at `/api/*`
/// - Optional static files for a built front end
pub fn build_router(
    workspace: Arc<Mutex<Workspace>>,
    broadcast_tx: broadcast::Sender<WsMessage>,
    static_dir: Option<PathBuf>,
) -> Router {
    let app_state = AppState {
        workspace: workspace.clone(),
        broadcast_tx: broadcast_tx.clone(),
    };
    let ws_state = WsState {
        workspace,
        broadcast_tx,
    };

    // Open CORS for a front-end dev server on another port.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .with_state(ws_state);

    let api_routes = Router::new()
        .route("/api/state", get(api::get_state))
        .route(
            "/api/blocks",
            post(api::post_block).delete(api::clear_blocks),
        )
        .route(
            "/api/blocks/{id}",
            put(api::put_block).delete(api::delete_block),
        )
        .route("/api/blocks/reorder", post(api::post_reorder))
        .route("/api/blocks/import", post(api::post_import))
        .route("/api/blocks/export", get(api::get_export))
        .route("/api/voice", post(api::post_voice))
        .route("/api/quality", get(api::get_quality))
        .route(
            "/api/suggestions",
            post(api::post_suggestions).delete(api::cancel_suggestions),
        )
        .route("/api/suggestions/apply", post(api::post_apply))
        .route("/api/prompt", get(api::get_prompt))
        .route("/api/templates", get(api::get_templates))
        .route("/api/templates/{id}", post(api::post_template))
        .route("/api/settings", put(api::put_settings))
        .with_state(app_state);

    let mut router = Router::new().merge(ws_routes).merge(api_routes).layer(cors);

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
}

/// Bind `bind_addr`, serve `router` on a Tokio task and return the bound
/// address.
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!("Web server stopped: {e}");
        }
    });

    Ok(addr)
}
