//! # Observer Gateway
//!
//! HTTP surface of a node.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /` | main monitor page |
//! | `GET /monitor2`, `GET /monitor3` | alternative pages |
//! | `GET /d3/:file` | visualization scripts |
//! | `GET /events` | WebSocket snapshot channel |
//! | `GET /snapshot` | current snapshot document |
//! | `POST /actions` | local entity lifecycle report |
//!
//! Missing assets answer 503, unknown paths 404.

pub mod assets;
pub mod observer;

pub use assets::{Asset, AssetStore};
pub use observer::{ObserverReply, ObserverSession};

use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use shard_topology::{error_document, Action, TopologyApi, TopologyError, TopologyHandle};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Shared state for gateway handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Local topology core
    pub topology: TopologyHandle,
    /// Static assets
    pub assets: Arc<AssetStore>,
}

impl GatewayState {
    /// Bundle a topology handle with an asset store.
    pub fn new(topology: TopologyHandle, assets: AssetStore) -> Self {
        Self {
            topology,
            assets: Arc::new(assets),
        }
    }
}

/// Build the gateway router.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(main_page))
        .route("/monitor2", get(second_page))
        .route("/monitor3", get(third_page))
        .route("/d3/:file", get(script))
        .route("/events", get(events))
        .route("/snapshot", get(snapshot))
        .route("/actions", post(submit_action))
        .fallback(not_found)
        .with_state(state)
}

/// Serve `router` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = ?listener.local_addr().ok(), "Observer gateway listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn main_page(State(state): State<GatewayState>) -> Response {
    asset_response(state.assets.page(assets::MAIN_PAGE).await)
}

async fn second_page(State(state): State<GatewayState>) -> Response {
    asset_response(state.assets.page(assets::SECOND_PAGE).await)
}

async fn third_page(State(state): State<GatewayState>) -> Response {
    asset_response(state.assets.page(assets::THIRD_PAGE).await)
}

async fn script(State(state): State<GatewayState>, Path(file): Path<String>) -> Response {
    asset_response(state.assets.script(&file).await)
}

async fn events(State(state): State<GatewayState>, ws: WebSocketUpgrade) -> Response {
    let session = ObserverSession::new(state.topology.publisher());
    ws.on_upgrade(move |socket| session.serve(socket))
}

async fn snapshot(State(state): State<GatewayState>) -> Response {
    json_response(StatusCode::OK, state.topology.render_snapshot())
}

async fn submit_action(State(state): State<GatewayState>, body: String) -> Response {
    let mut action = match Action::from_json(&body) {
        Ok(action) => action,
        Err(e) => {
            debug!(error = %e, "Rejected action body");
            return json_response(StatusCode::BAD_REQUEST, error_document(&e.to_string()));
        }
    };
    // Reported here, so this node is the origin.
    action.forward = true;

    match state.topology.submit(action).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e @ TopologyError::Decode(_)) => {
            json_response(StatusCode::BAD_REQUEST, error_document(&e.to_string()))
        }
        Err(e) => {
            warn!(error = %e, "Action not queued");
            json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                error_document(&e.to_string()),
            )
        }
    }
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn asset_response(result: Result<Asset, TopologyError>) -> Response {
    match result {
        Ok(asset) => ([(header::CONTENT_TYPE, asset.content_type)], asset.body).into_response(),
        Err(e) => {
            warn!(error = %e, "Asset request failed");
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}

fn json_response(status: StatusCode, document: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], document).into_response()
}
