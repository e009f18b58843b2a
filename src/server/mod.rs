//! Live fan-out server
//!
//! Accepts viewer connections, admits them into the registry and keeps them
//! open until they are closed by a peer, a failed write, eviction or shutdown.

pub mod config;
pub mod handler;
pub mod listener;

pub use config::ServerConfig;
pub use handler::DisconnectReason;
pub use listener::FanoutServer;
