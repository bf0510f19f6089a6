use std::{
    collections::HashMap,
    net::SocketAddr,
    time::{Duration, Instant},
};

use tokio::{
    net::UdpSocket,
    sync::{RwLock, mpsc::Sender, mpsc::error::TrySendError},
};

use crate::{config::PROBE_PAYLOAD, liveness::event::PeerEvent};

pub mod event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub address: SocketAddr,
    pub idle: Duration,
}

// Tracks when each peer was last heard from.
//
// Shared between the receive loop (touch) and the sweeper (evict + probe).
// Each operation takes the map lock once, so a sweep never observes half an update.
#[derive(Debug)]
pub struct LivenessTracker {
    peers: RwLock<HashMap<SocketAddr, Instant>>,
    timeout: Duration,
    event_sender: Option<Sender<PeerEvent>>,
}

impl LivenessTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            peers: RwLock::new(HashMap::new()),
            timeout,
            event_sender: None,
        }
    }

    pub fn with_events(timeout: Duration, event_sender: Sender<PeerEvent>) -> Self {
        Self {
            event_sender: Some(event_sender),
            ..Self::new(timeout)
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // Record a datagram from `peer`. Returns true when the peer was not tracked before.
    pub async fn touch(&self, peer: SocketAddr) -> bool {
        self.touch_at(peer, Instant::now()).await
    }

    pub async fn touch_at(&self, peer: SocketAddr, now: Instant) -> bool {
        let is_new = self.peers.write().await.insert(peer, now).is_none();

        if is_new {
            self.publish(PeerEvent::Connected(peer));
        }

        is_new
    }

    // Remove every peer idle for longer than the timeout.
    pub async fn evict_expired(&self, now: Instant) -> Vec<SocketAddr> {
        let evicted: Vec<SocketAddr> = {
            let mut peers = self.peers.write().await;

            let expired: Vec<SocketAddr> = peers
                .iter()
                .filter(|(_, last_seen)| now.saturating_duration_since(**last_seen) > self.timeout)
                .map(|(peer, _)| *peer)
                .collect();

            for peer in &expired {
                peers.remove(peer);
            }

            expired
        };

        for peer in &evicted {
            self.publish(PeerEvent::Disconnected(*peer));
        }

        evicted
    }

    // Send a probe to every tracked peer. A failed send is logged and skipped.
    // Returns the number of probes that went out.
    pub async fn probe_all(&self, socket: &UdpSocket) -> usize {
        let targets = self.addresses().await;
        let mut sent = 0;

        for peer in targets {
            match socket.send_to(PROBE_PAYLOAD, peer).await {
                Ok(_) => {
                    log::debug!("Probe sent to {}", peer);
                    sent += 1;
                }
                Err(e) => log::warn!("Failed to send probe to {}: {}", peer, e),
            }
        }

        sent
    }

    pub async fn addresses(&self) -> Vec<SocketAddr> {
        self.peers.read().await.keys().copied().collect()
    }

    pub async fn snapshot(&self) -> Vec<PeerInfo> {
        let now = Instant::now();
        let mut peers: Vec<PeerInfo> = self
            .peers
            .read()
            .await
            .iter()
            .map(|(address, last_seen)| PeerInfo {
                address: *address,
                idle: now.saturating_duration_since(*last_seen),
            })
            .collect();

        peers.sort_by_key(|peer| peer.address);
        peers
    }

    pub async fn contains(&self, peer: &SocketAddr) -> bool {
        self.peers.read().await.contains_key(peer)
    }

    pub async fn len(&self) -> usize {
        self.peers.read().await.len()
    }

    pub async fn clear(&self) {
        self.peers.write().await.clear();
    }

    fn publish(&self, event: PeerEvent) {
        let Some(sender) = &self.event_sender else {
            return;
        };

        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                log::warn!("Peer event channel full, dropping {:?}", event)
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LivenessTracker;
    use crate::liveness::event::PeerEvent;
    use std::{
        net::SocketAddr,
        time::{Duration, Instant},
    };
    use tokio::net::UdpSocket;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[tokio::test]
    async fn test_touch_reports_new_peers_only() {
        let tracker = LivenessTracker::new(Duration::from_secs(30));

        assert!(tracker.touch(addr(1000)).await);
        assert!(!tracker.touch(addr(1000)).await);
        assert!(tracker.touch(addr(1001)).await);
        assert_eq!(tracker.len().await, 2);
    }

    #[tokio::test]
    async fn test_silent_peer_is_evicted() {
        let tracker = LivenessTracker::new(Duration::from_secs(30));
        let start = Instant::now();
        tracker.touch_at(addr(1000), start).await;
        tracker.touch_at(addr(1001), start + Duration::from_secs(25)).await;

        // exactly at the timeout the peer is still alive
        assert!(tracker.evict_expired(start + Duration::from_secs(30)).await.is_empty());

        let evicted = tracker.evict_expired(start + Duration::from_secs(31)).await;

        assert_eq!(evicted, vec![addr(1000)]);
        assert!(!tracker.contains(&addr(1000)).await);
        assert!(tracker.contains(&addr(1001)).await);
    }

    #[tokio::test]
    async fn test_regular_peer_is_never_evicted() {
        let tracker = LivenessTracker::new(Duration::from_secs(30));
        let start = Instant::now();

        for cycle in 0..100u64 {
            let now = start + Duration::from_secs(cycle * 10);
            tracker.touch_at(addr(1000), now).await;
            assert!(tracker.evict_expired(now + Duration::from_secs(10)).await.is_empty());
        }

        assert!(tracker.contains(&addr(1000)).await);
    }

    #[tokio::test]
    async fn test_evicted_peer_reenters_as_new() {
        let tracker = LivenessTracker::new(Duration::from_secs(30));
        let start = Instant::now();
        tracker.touch_at(addr(1000), start).await;
        tracker.evict_expired(start + Duration::from_secs(60)).await;

        assert!(tracker.touch_at(addr(1000), start + Duration::from_secs(61)).await);
    }

    #[tokio::test]
    async fn test_events_are_published() {
        let (sender, mut receiver) = tokio::sync::mpsc::channel(8);
        let tracker = LivenessTracker::with_events(Duration::from_secs(30), sender);
        let start = Instant::now();

        tracker.touch_at(addr(1000), start).await;
        tracker.touch_at(addr(1000), start).await;
        tracker.evict_expired(start + Duration::from_secs(31)).await;

        assert_eq!(receiver.recv().await, Some(PeerEvent::Connected(addr(1000))));
        assert_eq!(receiver.recv().await, Some(PeerEvent::Disconnected(addr(1000))));
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_event_channel_does_not_block() {
        let (sender, _receiver) = tokio::sync::mpsc::channel(1);
        let tracker = LivenessTracker::with_events(Duration::from_secs(30), sender);

        for port in 0..10 {
            tracker.touch(addr(2000 + port)).await;
        }

        assert_eq!(tracker.len().await, 10);
    }

    #[tokio::test]
    async fn test_probe_failure_does_not_stop_other_probes() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let tracker = LivenessTracker::new(Duration::from_secs(30));

        // an IPv6 target cannot be reached from an IPv4 socket
        tracker.touch("[::1]:9".parse().unwrap()).await;
        tracker.touch(client.local_addr().unwrap()).await;

        let sent = tracker.probe_all(&server).await;

        assert_eq!(sent, 1);
        let mut buf = [0u8; 16];
        let (len, from) = tokio::time::timeout(Duration::from_secs(2), client.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..len], b"PING");
        assert_eq!(from, server.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_clear_forgets_every_peer() {
        let tracker = LivenessTracker::new(Duration::from_secs(30));
        tracker.touch(addr(1000)).await;
        tracker.touch(addr(1001)).await;

        tracker.clear().await;

        assert_eq!(tracker.len().await, 0);
        assert!(tracker.snapshot().await.is_empty());
        // next datagram starts a fresh session
        assert!(tracker.touch(addr(1000)).await);
    }

    #[tokio::test]
    async fn test_concurrent_touch_and_sweep() {
        let tracker = std::sync::Arc::new(LivenessTracker::new(Duration::from_secs(30)));
        let mut handles = vec![];

        for task in 0..8u16 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..50u16 {
                    tracker.touch(addr(10000 + task * 100 + i)).await;
                    tracker.evict_expired(Instant::now()).await;
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(tracker.len().await, 400);
    }
}
