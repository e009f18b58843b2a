//! Status fan-out to every registered viewer
//!
//! A publish pass encodes the frame once, snapshots the registry, and writes
//! to every viewer concurrently outside the registry lock. A write that fails
//! or times out closes its connection on the spot; such viewers are removed
//! from the registry once the pass ends. Nothing is retried and nothing is
//! reported back to the publisher.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinSet;

use crate::registry::{ClientConnection, ConnectionRegistry};
use crate::stats::FanoutStats;

use super::frame::StatusPayload;

/// Default bound on a single frame write
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Pushes status frames to all registered connections
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    stats: Arc<FanoutStats>,
    write_timeout: Duration,
}

impl Broadcaster {
    /// Create a broadcaster over `registry`
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        stats: Arc<FanoutStats>,
        write_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            stats,
            write_timeout,
        }
    }

    /// Get a reference to the connection registry
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Get a reference to the server statistics
    pub fn stats(&self) -> &Arc<FanoutStats> {
        &self.stats
    }

    /// Send `{key: value}\n` to every registered viewer
    pub async fn publish(&self, key: impl Into<String>, value: Value) {
        self.publish_payload(&StatusPayload::new(key, value)).await;
    }

    /// Send an already built payload to every registered viewer
    pub async fn publish_payload(&self, payload: &StatusPayload) {
        let frame = match payload.encode() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(camera = payload.key(), error = %e, "Failed to encode status");
                return;
            }
        };

        let clients = self.registry.snapshot().await;
        if clients.is_empty() {
            tracing::trace!(camera = payload.key(), "No viewers connected, skipping push");
            self.stats.record_publish(0, 0);
            return;
        }

        // Handles stay here so a write task that dies still gets its viewer pruned
        let mut pending: HashMap<u64, Arc<ClientConnection>> =
            HashMap::with_capacity(clients.len());
        let mut writes = JoinSet::new();
        for conn in clients {
            let frame = frame.clone();
            let timeout = self.write_timeout;
            pending.insert(conn.id(), Arc::clone(&conn));
            writes.spawn(async move {
                let result = conn.send(&frame, timeout).await;
                (conn.id(), result)
            });
        }

        let mut delivered = 0u64;
        let mut failed: Vec<Arc<ClientConnection>> = Vec::new();

        while let Some(joined) = writes.join_next().await {
            match joined {
                Ok((id, Ok(()))) => {
                    pending.remove(&id);
                    delivered += 1;
                }
                Ok((id, Err(e))) => {
                    if let Some(conn) = pending.remove(&id) {
                        tracing::warn!(
                            client_id = id,
                            peer = %conn.peer_addr(),
                            error = %e,
                            "Dropping viewer after failed write"
                        );
                        failed.push(conn);
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Fan-out write task failed");
                }
            }
        }

        for (id, conn) in pending.drain() {
            tracing::warn!(
                client_id = id,
                peer = %conn.peer_addr(),
                "Dropping viewer after aborted write"
            );
            failed.push(conn);
        }

        if !failed.is_empty() {
            let ids: Vec<u64> = failed.iter().map(|c| c.id()).collect();
            self.registry.remove_many(&ids).await;

            for conn in &failed {
                conn.close().await;
            }
        }

        tracing::debug!(
            camera = payload.key(),
            bytes = frame.len(),
            delivered = delivered,
            dropped = failed.len(),
            "Status pushed"
        );

        self.stats.record_publish(delivered, failed.len() as u64);
    }
}
