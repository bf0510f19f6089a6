use std::{net::SocketAddr, sync::Arc};

use tokio::{net::UdpSocket, sync::watch};

use crate::{
    codec::{self, Response},
    config::MAX_DATAGRAM_SIZE,
    dispatch::Dispatcher,
    errors,
    liveness::LivenessTracker,
};

// Receive loop: one datagram in, at most one reply out to its origin.
#[derive(Debug)]
pub struct DatagramService {
    socket: Arc<UdpSocket>,
    dispatcher: Dispatcher,
    tracker: Arc<LivenessTracker>,
}

impl DatagramService {
    pub async fn bind(
        addr: SocketAddr,
        dispatcher: Dispatcher,
        tracker: Arc<LivenessTracker>,
    ) -> errors::Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| errors::Errors::SocketBindError(format!("{}: {}", addr, e)))?;

        Ok(Self::new(Arc::new(socket), dispatcher, tracker))
    }

    pub fn new(
        socket: Arc<UdpSocket>,
        dispatcher: Dispatcher,
        tracker: Arc<LivenessTracker>,
    ) -> Self {
        Self {
            socket,
            dispatcher,
            tracker,
        }
    }

    pub fn socket(&self) -> Arc<UdpSocket> {
        self.socket.clone()
    }

    // Handle one payload from `peer`. Blank payloads produce no reply.
    pub async fn handle_datagram(&self, payload: &[u8], peer: SocketAddr) -> Option<Response> {
        self.tracker.touch(peer).await;

        let text = String::from_utf8_lossy(payload);
        if text.trim().is_empty() {
            log::info!("Empty message received from {}", peer);
            return None;
        }

        log::info!("Message received from {}: {}", peer, text.trim());

        let response = match codec::decode(payload) {
            Ok(request) => self.dispatcher.dispatch(request, peer).await,
            Err(error) => {
                log::warn!("Rejected message from {}: {}", peer, error);
                Response::Error(error.to_string())
            }
        };

        Some(response)
    }

    // Serve until the shutdown signal flips. Failures on a single datagram never end the loop.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];

        match self.socket.local_addr() {
            Ok(addr) => log::info!("UDP service listening on {}", addr),
            Err(e) => log::warn!("UDP service started, local address unknown: {}", e),
        }

        loop {
            if *shutdown.borrow() {
                break;
            }

            let (len, peer) = tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                received = self.socket.recv_from(&mut buffer) => match received {
                    Ok(received) => received,
                    Err(e) => {
                        log::error!("Failed to receive datagram: {}", e);
                        continue;
                    }
                },
            };

            // stop raised while the datagram was arriving
            if *shutdown.borrow() {
                break;
            }

            let Some(response) = self.handle_datagram(&buffer[..len], peer).await else {
                continue;
            };

            if let Err(error) = self.reply(&response, peer).await {
                log::error!("{}", error);
            }
        }

        log::info!("UDP service stopped");
    }

    async fn reply(&self, response: &Response, peer: SocketAddr) -> errors::Result<()> {
        let payload = codec::encode(response);

        self.socket
            .send_to(&payload, peer)
            .await
            .map_err(|e| errors::Errors::SocketSendError(format!("reply to {}: {}", peer, e)))?;

        Ok(())
    }
}
