//! Live parking occupancy fan-out
//!
//! Pushes per-camera occupancy state to a bounded set of TCP viewers as
//! newline-delimited JSON, and serves the same state over a small HTTP API.
//!
//! # Modules
//!
//! - `registry`: Capacity-bounded, oldest-first set of viewer connections
//! - `broadcast`: Frame encoding and best-effort fan-out
//! - `server`: TCP accept loop, admission and keep-alive handlers
//! - `status`: Status storage and the update trigger
//! - `api`: HTTP endpoints that drive the trigger
//! - `stats`: Fan-out counters
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use occupancy_fanout::{FanoutServer, MemoryStatusStore, ServerConfig, StatusTrigger};
//!
//! #[tokio::main]
//! async fn main() -> occupancy_fanout::Result<()> {
//!     let server = FanoutServer::new(ServerConfig::default().max_clients(5));
//!     let trigger = StatusTrigger::new(
//!         server.broadcaster(),
//!         Arc::new(MemoryStatusStore::new()),
//!         vec!["cam1".to_string()],
//!     );
//!
//!     tokio::spawn(async move {
//!         trigger
//!             .notify("cam1", serde_json::json!({"available_slots": 3}))
//!             .await;
//!     });
//!
//!     server.run().await
//! }
//! ```

pub mod api;
pub mod broadcast;
pub mod error;
pub mod registry;
pub mod server;
pub mod stats;
pub mod status;

pub use broadcast::{Broadcaster, StatusPayload};
pub use error::{Error, Result};
pub use registry::{ClientConnection, ConnectionRegistry, RegistryConfig};
pub use server::{FanoutServer, ServerConfig};
pub use stats::{FanoutStats, StatsSnapshot};
pub use status::{FileStatusStore, MemoryStatusStore, StatusStore, StatusTrigger};
