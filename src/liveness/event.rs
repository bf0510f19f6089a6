use std::net::SocketAddr;

use tokio::sync::mpsc::Receiver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerEvent {
    Connected(SocketAddr),
    Disconnected(SocketAddr),
}

// Drain peer lifecycle events into the log until every sender is dropped.
pub async fn log_peer_events(mut receiver: Receiver<PeerEvent>) {
    while let Some(event) = receiver.recv().await {
        match event {
            PeerEvent::Connected(peer) => log::info!("Peer connected: {}", peer),
            PeerEvent::Disconnected(peer) => log::info!("Peer disconnected: {}", peer),
        }
    }

    log::debug!("Peer event channel closed");
}
