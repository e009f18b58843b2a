//! Connection registry for live viewers
//!
//! The registry holds every connected viewer in admission order and enforces
//! the client cap by evicting the oldest viewer when a new one arrives.
//!
//! # Architecture
//!
//! ```text
//!                    Arc<ConnectionRegistry>
//!               ┌──────────────────────────────┐
//!               │ Mutex<VecDeque<              │
//!               │   Arc<ClientConnection>>>    │
//!               │  oldest ─────────► newest    │
//!               └──────┬───────────────┬───────┘
//!                      │               │
//!          register()/remove()     snapshot()
//!                      │               │
//!                [accept loop]   [Broadcaster]──► send() ──► TCP
//! ```
//!
//! Eviction and removal hand the connection back to the caller, which closes
//! it once the lock is released. `ClientConnection::close` is idempotent, so
//! the eviction path and the keep-alive handler may both call it.

pub mod config;
pub mod connection;
pub mod store;

pub use config::RegistryConfig;
pub use connection::ClientConnection;
pub use store::ConnectionRegistry;
