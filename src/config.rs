use std::{cell::LazyCell, path::PathBuf, time::Duration};

pub const UDP_DEFAULT_PORT: u16 = 9876;
pub const HTTP_DEFAULT_PORT: u16 = 9877;
pub const SNAPSHOT_DEFAULT_PATH: &str = "data/equipments.json";
pub const SWEEP_INTERVAL_DEFAULT_SECS: u64 = 10;
pub const PEER_TIMEOUT_DEFAULT_SECS: u64 = 30;

// Largest payload a single UDP datagram can carry over IPv4.
pub const MAX_DATAGRAM_SIZE: usize = 65507;

pub const PROBE_PAYLOAD: &[u8] = b"PING";

// Capacity of the peer lifecycle event channel.
pub const PEER_EVENT_CHANNEL_SIZE: usize = 256;

pub const UDP_PORT: LazyCell<u16> = LazyCell::new(|| env_or("EQUIPD_UDP_PORT", UDP_DEFAULT_PORT));

pub const HTTP_PORT: LazyCell<u16> =
    LazyCell::new(|| env_or("EQUIPD_HTTP_PORT", HTTP_DEFAULT_PORT));

pub const SNAPSHOT_PATH: LazyCell<PathBuf> = LazyCell::new(|| {
    std::env::var("EQUIPD_SNAPSHOT_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(SNAPSHOT_DEFAULT_PATH))
});

// tokio intervals must be non-zero.
pub const SWEEP_INTERVAL: LazyCell<Duration> = LazyCell::new(|| {
    Duration::from_secs(env_or("EQUIPD_SWEEP_INTERVAL_SECS", SWEEP_INTERVAL_DEFAULT_SECS).max(1))
});

pub const PEER_TIMEOUT: LazyCell<Duration> = LazyCell::new(|| {
    Duration::from_secs(env_or("EQUIPD_PEER_TIMEOUT_SECS", PEER_TIMEOUT_DEFAULT_SECS))
});

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(default)
}
