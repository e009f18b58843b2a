//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::broadcast::DEFAULT_WRITE_TIMEOUT;
use crate::registry::config::DEFAULT_CAPACITY;

/// Default address for the live fan-out listener
pub const DEFAULT_FANOUT_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8000);

/// Fan-out listener options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent viewers; the oldest is evicted beyond this
    pub max_clients: usize,

    /// Upper bound on writing one frame to one viewer
    pub write_timeout: Duration,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Size of the buffer used to drain unsolicited inbound bytes
    pub read_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_FANOUT_ADDR,
            max_clients: DEFAULT_CAPACITY,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            tcp_nodelay: true, // Status lines are tiny, send them immediately
            read_buffer_size: 1024,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum concurrent viewers (at least 1)
    pub fn max_clients(mut self, max: usize) -> Self {
        self.max_clients = max.max(1);
        self
    }

    /// Set the per-write timeout
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn tcp_nodelay(mut self, enabled: bool) -> Self {
        self.tcp_nodelay = enabled;
        self
    }
}
