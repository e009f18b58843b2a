//! Connection registry implementation
//!
//! Ordered, capacity-bounded set of live client connections. The lock is only
//! ever held for handle manipulation; callers do all network I/O (writes,
//! closing evicted clients) after it is released.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::config::RegistryConfig;
use super::connection::ClientConnection;

/// Registry of connected viewers, oldest first
pub struct ConnectionRegistry {
    connections: Mutex<VecDeque<Arc<ClientConnection>>>,
    config: RegistryConfig,
}

impl ConnectionRegistry {
    /// Create a registry with default capacity
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        let config = RegistryConfig::default().capacity(config.capacity);

        Self {
            connections: Mutex::new(VecDeque::with_capacity(config.capacity)),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Maximum number of registered connections
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Add a connection at the tail
    ///
    /// When the registry is full, the oldest connection is removed first and
    /// returned so the caller can shut it down outside the lock.
    pub async fn register(&self, conn: Arc<ClientConnection>) -> Option<Arc<ClientConnection>> {
        let mut connections = self.connections.lock().await;

        let evicted = if connections.len() >= self.config.capacity {
            connections.pop_front()
        } else {
            None
        };

        tracing::debug!(
            client_id = conn.id(),
            peer = %conn.peer_addr(),
            evicted = ?evicted.as_ref().map(|c| c.id()),
            "Client registered"
        );

        connections.push_back(conn);
        evicted
    }

    /// Remove a connection if present
    ///
    /// Returns `false` when it was already gone; that is not an error.
    pub async fn remove(&self, conn: &ClientConnection) -> bool {
        let mut connections = self.connections.lock().await;

        match connections.iter().position(|c| c.id() == conn.id()) {
            Some(index) => {
                connections.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every connection whose ID is in `ids`, in one lock acquisition
    ///
    /// Returns how many were actually removed.
    pub async fn remove_many(&self, ids: &[u64]) -> usize {
        if ids.is_empty() {
            return 0;
        }

        let mut connections = self.connections.lock().await;
        let before = connections.len();
        connections.retain(|c| !ids.contains(&c.id()));
        before - connections.len()
    }

    /// Copy of the current connections, oldest first
    pub async fn snapshot(&self) -> Vec<Arc<ClientConnection>> {
        self.connections.lock().await.iter().cloned().collect()
    }

    /// Remove and return every connection
    pub async fn drain(&self) -> Vec<Arc<ClientConnection>> {
        self.connections.lock().await.drain(..).collect()
    }

    /// Number of registered connections
    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Whether no connection is registered
    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::DuplexStream;

    use super::*;

    fn connection(id: u64) -> (Arc<ClientConnection>, DuplexStream) {
        let (client, viewer) = tokio::io::duplex(256);
        let addr = format!("127.0.0.1:{}", 41000 + id).parse().unwrap();
        (Arc::new(ClientConnection::new(id, addr, client)), viewer)
    }

    fn ids(conns: &[Arc<ClientConnection>]) -> Vec<u64> {
        conns.iter().map(|c| c.id()).collect()
    }

    #[tokio::test]
    async fn test_register_below_capacity() {
        let registry = ConnectionRegistry::new();
        let (a, _va) = connection(1);

        assert!(registry.register(a).await.is_none());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_register_evicts_oldest() {
        let registry = ConnectionRegistry::with_config(RegistryConfig::default().capacity(2));
        let (a, _va) = connection(1);
        let (b, _vb) = connection(2);
        let (c, _vc) = connection(3);

        assert!(registry.register(a).await.is_none());
        assert!(registry.register(b).await.is_none());

        let evicted = registry.register(c).await.unwrap();
        assert_eq!(evicted.id(), 1);
        assert_eq!(ids(&registry.snapshot().await), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_never_exceeds_capacity() {
        let registry = ConnectionRegistry::with_config(RegistryConfig::default().capacity(3));
        let mut viewers = Vec::new();

        for id in 1..=10 {
            let (conn, viewer) = connection(id);
            viewers.push(viewer);
            let evicted = registry.register(conn).await;

            assert!(registry.len().await <= 3);
            if id > 3 {
                assert_eq!(evicted.map(|c| c.id()), Some(id - 3));
            }
        }

        assert_eq!(ids(&registry.snapshot().await), vec![8, 9, 10]);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (a, _va) = connection(1);
        let (b, _vb) = connection(2);
        registry.register(a.clone()).await;
        registry.register(b).await;

        assert!(registry.remove(&a).await);
        assert!(!registry.remove(&a).await);
        assert_eq!(ids(&registry.snapshot().await), vec![2]);
    }

    #[tokio::test]
    async fn test_remove_many() {
        let registry = ConnectionRegistry::new();
        let mut viewers = Vec::new();
        for id in 1..=4 {
            let (conn, viewer) = connection(id);
            viewers.push(viewer);
            registry.register(conn).await;
        }

        assert_eq!(registry.remove_many(&[2, 4, 9]).await, 2);
        assert_eq!(registry.remove_many(&[]).await, 0);
        assert_eq!(ids(&registry.snapshot().await), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_snapshot_is_detached() {
        let registry = ConnectionRegistry::new();
        let (a, _va) = connection(1);
        registry.register(a.clone()).await;

        let snapshot = registry.snapshot().await;
        registry.remove(&a).await;

        assert_eq!(snapshot.len(), 1);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_drain() {
        let registry = ConnectionRegistry::new();
        let (a, _va) = connection(1);
        let (b, _vb) = connection(2);
        registry.register(a).await;
        registry.register(b).await;

        assert_eq!(ids(&registry.drain().await), vec![1, 2]);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_register_respects_capacity() {
        let registry = Arc::new(ConnectionRegistry::with_config(
            RegistryConfig::default().capacity(4),
        ));
        let mut tasks = tokio::task::JoinSet::new();
        let mut viewers = Vec::new();

        for id in 1..=32 {
            let (conn, viewer) = connection(id);
            viewers.push(viewer);
            let registry = Arc::clone(&registry);
            tasks.spawn(async move { registry.register(conn).await.is_some() });
        }

        let mut evictions = 0;
        while let Some(evicted) = tasks.join_next().await {
            if evicted.unwrap() {
                evictions += 1;
            }
        }

        assert_eq!(registry.len().await, 4);
        assert_eq!(evictions, 28);
    }
}
