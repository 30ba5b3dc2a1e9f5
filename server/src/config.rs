//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use wire::Limits;

/// Tunables for the server's pools, loop cadence, and limits.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the listener binds.
    pub addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_sessions: usize,
    /// Segment size of the read pool; also the per-readiness receive bound.
    pub read_segment: usize,
    /// Segment size of the write pool.
    pub write_segment: usize,
    /// Arena backing the read pool, in bytes.
    pub read_arena: usize,
    /// Arena backing the write pool, in bytes.
    pub write_arena: usize,
    /// Frame limits applied to inbound traffic.
    pub limits: Limits,
    /// Fixed world tick cadence.
    pub tick_interval: Duration,
    /// Keepalive (and time update) cadence per play session.
    pub keep_alive_interval: Duration,
    /// Movement broadcast cadence per play session.
    pub movement_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 25565)),
            max_sessions: 4096,
            read_segment: 512,
            write_segment: 512,
            read_arena: 4 * 1024 * 1024,
            write_arena: 4 * 1024 * 1024,
            limits: Limits::default(),
            tick_interval: Duration::from_millis(50),
            keep_alive_interval: Duration::from_secs(10),
            movement_interval: Duration::from_millis(100),
        }
    }
}

impl Config {
    /// Small pools and a loopback ephemeral port, for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            max_sessions: 16,
            read_arena: 256 * 1024,
            write_arena: 1024 * 1024,
            limits: Limits::for_testing(),
            ..Self::default()
        }
    }
}
