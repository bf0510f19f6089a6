use std::{sync::Arc, time::Duration};

use tokio::{net::UdpSocket, sync::watch, task::JoinHandle};

use crate::liveness::LivenessTracker;

// Run one sweep: drop peers past the timeout, then probe the ones that remain.
pub async fn sweep_once(tracker: &LivenessTracker, socket: &UdpSocket) {
    let evicted = tracker.evict_expired(std::time::Instant::now()).await;
    if !evicted.is_empty() {
        log::info!("Sweep evicted {} idle peer(s)", evicted.len());
    }

    let probed = tracker.probe_all(socket).await;
    log::debug!("Sweep probed {} peer(s)", probed);
}

// Start the periodic sweeper. The first sweep runs one interval after start.
// The shutdown signal is checked between sweeps; a running sweep is not interrupted.
pub fn spawn_sweeper(
    tracker: Arc<LivenessTracker>,
    socket: Arc<UdpSocket>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);

        log::info!(
            "Sweeper started (interval {:?}, timeout {:?})",
            interval,
            tracker.timeout()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if *shutdown.borrow() {
                        break;
                    }
                    sweep_once(&tracker, &socket).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        log::info!("Sweeper stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::spawn_sweeper;
    use crate::liveness::LivenessTracker;
    use std::{sync::Arc, time::Duration};
    use tokio::{net::UdpSocket, sync::watch};

    #[tokio::test]
    async fn test_sweeper_evicts_and_probes() {
        let server = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let live = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let silent: std::net::SocketAddr = "127.0.0.1:9".parse().unwrap();
        let tracker = Arc::new(LivenessTracker::new(Duration::from_millis(150)));
        let (shutdown_sender, shutdown) = watch::channel(false);

        tracker.touch(silent).await;
        let handle = spawn_sweeper(
            tracker.clone(),
            server.clone(),
            Duration::from_millis(50),
            shutdown,
        );

        // keep one peer chatty while the other goes quiet
        let mut buf = [0u8; 16];
        let mut probes = 0;
        for _ in 0..8 {
            tracker.touch(live.local_addr().unwrap()).await;
            if let Ok(Ok((len, _))) =
                tokio::time::timeout(Duration::from_millis(60), live.recv_from(&mut buf)).await
            {
                assert_eq!(&buf[..len], b"PING");
                probes += 1;
            }
        }

        assert!(!tracker.contains(&silent).await);
        assert!(tracker.contains(&live.local_addr().unwrap()).await);
        assert!(probes > 0);

        shutdown_sender.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown_before_first_tick() {
        let server = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let tracker = Arc::new(LivenessTracker::new(Duration::from_secs(30)));
        let (shutdown_sender, shutdown) = watch::channel(false);

        let handle = spawn_sweeper(tracker, server, Duration::from_secs(3600), shutdown);
        shutdown_sender.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
