use std::{net::SocketAddr, sync::Arc};

use axum::{Extension, Json, Router, routing::get};
use tokio::sync::watch;

use crate::{
    errors,
    liveness::LivenessTracker,
    registry::{EquipmentStore, record::EquipmentList},
};

// Read-only view over the running service.
#[derive(Debug, Clone)]
pub struct StatusState {
    pub store: Arc<EquipmentStore>,
    pub tracker: Arc<LivenessTracker>,
}

pub fn router(state: StatusState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/status", get(get_status))
        .route("/peers", get(list_peers))
        .route("/equipments", get(list_equipments))
        .layer(Extension(state))
}

pub async fn run_server(
    addr: SocketAddr,
    state: StatusState,
    shutdown: watch::Receiver<bool>,
) -> errors::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| errors::Errors::SocketBindError(format!("{}: {}", addr, e)))?;

    log::info!("HTTP status server is running on {}", addr);

    serve(listener, state, shutdown).await
}

// Serve on an already bound listener until the stop flag is raised.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: StatusState,
    mut shutdown: watch::Receiver<bool>,
) -> errors::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            loop {
                let stopping = *shutdown.borrow();
                if stopping || shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await
        .map_err(|e| errors::Errors::HttpServeError(e.to_string()))?;

    log::info!("HTTP status server stopped");

    Ok(())
}

async fn root() -> &'static str {
    "OK"
}

#[derive(Debug, PartialEq, Eq, serde::Serialize)]
pub struct StatusResponse {
    pub peer_count: usize,
    pub equipment_count: usize,
}

impl StatusResponse {
    pub async fn collect(state: &StatusState) -> Self {
        Self {
            peer_count: state.tracker.len().await,
            equipment_count: state.store.len().await,
        }
    }
}

async fn get_status(Extension(state): Extension<StatusState>) -> Json<StatusResponse> {
    Json(StatusResponse::collect(&state).await)
}

#[derive(Debug, PartialEq, Eq, serde::Serialize)]
pub struct PeersResponse {
    pub peers: Vec<PeersResponseItem>,
}

#[derive(Debug, PartialEq, Eq, serde::Serialize)]
pub struct PeersResponseItem {
    pub address: String,
    pub idle_ms: u64,
}

impl PeersResponse {
    pub async fn collect(tracker: &LivenessTracker) -> Self {
        let peers = tracker
            .snapshot()
            .await
            .into_iter()
            .map(|peer| PeersResponseItem {
                address: peer.address.to_string(),
                idle_ms: u64::try_from(peer.idle.as_millis()).unwrap_or(u64::MAX),
            })
            .collect();

        Self { peers }
    }
}

async fn list_peers(Extension(state): Extension<StatusState>) -> Json<PeersResponse> {
    Json(PeersResponse::collect(&state.tracker).await)
}

async fn list_equipments(Extension(state): Extension<StatusState>) -> Json<EquipmentList> {
    Json(state.store.get_all().await)
}
