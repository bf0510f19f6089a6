pub mod codec;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod http;
pub mod liveness;
pub mod os;
pub mod registry;
pub mod service;
pub mod sweep;

use std::{net::SocketAddr, sync::Arc};

use config::{
    HTTP_PORT, PEER_EVENT_CHANNEL_SIZE, PEER_TIMEOUT, SNAPSHOT_PATH, SWEEP_INTERVAL, UDP_PORT,
};
use dispatch::Dispatcher;
use liveness::{LivenessTracker, event::log_peer_events};
use registry::EquipmentStore;
use service::DatagramService;
use tokio::sync::{mpsc, watch};

#[cfg(target_os = "linux")]
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn setup_logging() {
    unsafe {
        if std::env::var("RUST_LOG").is_err() {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    log::info!("Loading equipment snapshot...");

    // A missing or unreadable snapshot aborts startup.
    let store = match EquipmentStore::load((*SNAPSHOT_PATH).clone()).await {
        Ok(store) => Arc::new(store),
        Err(error) => {
            log::error!("Refusing to start: {}", error);
            return Err(error.into());
        }
    };

    let (event_sender, event_receiver) = mpsc::channel(PEER_EVENT_CHANNEL_SIZE);
    let tracker = Arc::new(LivenessTracker::with_events(*PEER_TIMEOUT, event_sender));

    let (shutdown_sender, shutdown) = watch::channel(false);

    let service = DatagramService::bind(
        SocketAddr::from(([0, 0, 0, 0], *UDP_PORT)),
        Dispatcher::new(store.clone()),
        tracker.clone(),
    )
    .await?;

    log::info!("Starting background tasks...");

    let event_logger = tokio::spawn(log_peer_events(event_receiver));

    let sweeper = sweep::spawn_sweeper(
        tracker.clone(),
        service.socket(),
        *SWEEP_INTERVAL,
        shutdown.clone(),
    );

    let http_server = tokio::spawn({
        let state = http::StatusState {
            store: store.clone(),
            tracker: tracker.clone(),
        };
        let addr = SocketAddr::from(([0, 0, 0, 0], *HTTP_PORT));
        let shutdown = shutdown.clone();

        async move {
            if let Err(e) = http::run_server(addr, state, shutdown).await {
                log::error!("HTTP server error: {}", e);
            }
        }
    });

    os::spawn_shutdown_listener(shutdown_sender);

    service.run(shutdown).await;

    let (sweeper_result, http_result) = tokio::join!(sweeper, http_server);
    os::report_task_end("sweeper", sweeper_result);
    os::report_task_end("HTTP server", http_result);

    tracker.clear().await;
    event_logger.abort();

    log::info!("Server stopped");

    Ok(())
}
