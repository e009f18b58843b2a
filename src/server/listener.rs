//! Fan-out server listener
//!
//! Handles the TCP accept loop, admission (with oldest-first eviction) and
//! spawns a keep-alive handler per viewer.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::broadcast::Broadcaster;
use crate::error::Result;
use crate::registry::{ClientConnection, ConnectionRegistry, RegistryConfig};
use crate::server::config::ServerConfig;
use crate::server::handler::keep_alive;
use crate::stats::FanoutStats;

/// Live status fan-out server
pub struct FanoutServer {
    config: ServerConfig,
    registry: Arc<ConnectionRegistry>,
    broadcaster: Broadcaster,
    stats: Arc<FanoutStats>,
    next_client_id: AtomicU64,
}

impl FanoutServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::with_config(
            RegistryConfig::default().capacity(config.max_clients),
        ));
        let stats = Arc::new(FanoutStats::new());
        let broadcaster = Broadcaster::new(
            Arc::clone(&registry),
            Arc::clone(&stats),
            config.write_timeout,
        );

        Self {
            config,
            registry,
            broadcaster,
            stats,
            next_client_id: AtomicU64::new(1),
        }
    }

    /// Get a reference to the connection registry
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Handle used to push status updates to viewers
    pub fn broadcaster(&self) -> Broadcaster {
        self.broadcaster.clone()
    }

    /// Get a reference to the server statistics
    pub fn stats(&self) -> &Arc<FanoutStats> {
        &self.stats
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method blocks until the process exits.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_until(listener, shutdown).await
    }

    /// Accept on an already bound listener until `shutdown` resolves
    ///
    /// Every registered viewer is closed before returning.
    pub async fn serve_until<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            max_clients = self.registry.capacity(),
            "Fan-out server listening"
        );

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
            }
            _ = self.accept_loop(&listener) => {}
        }

        self.close_all().await;
        Ok(())
    }

    async fn accept_loop(&self, listener: &TcpListener) {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    async fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        let client_id = self.next_client_id.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = self.configure_socket(&socket) {
            tracing::warn!(client_id = client_id, error = %e, "Failed to configure socket");
        }

        let (reader, writer) = socket.into_split();
        let conn = Arc::new(ClientConnection::new(client_id, peer_addr, writer));

        self.stats.record_connection();

        if let Some(evicted) = self.registry.register(Arc::clone(&conn)).await {
            self.stats.record_eviction();
            tracing::warn!(
                evicted_id = evicted.id(),
                evicted_peer = %evicted.peer_addr(),
                client_id = client_id,
                "Viewer limit reached, evicted oldest viewer"
            );
            retire(evicted);
        }

        tracing::info!(client_id = client_id, peer = %peer_addr, "Viewer connected");

        let registry = Arc::clone(&self.registry);
        let buffer_size = self.config.read_buffer_size;
        tokio::spawn(async move {
            keep_alive(conn, reader, registry, buffer_size).await;
        });
    }

    fn configure_socket(&self, socket: &TcpStream) -> std::io::Result<()> {
        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }
        Ok(())
    }

    async fn close_all(&self) {
        let remaining = self.registry.drain().await;
        let count = remaining.len();

        for conn in remaining {
            conn.close().await;
        }

        tracing::info!(closed = count, "Fan-out server stopped");
    }
}

/// Close an evicted connection off the accept path
///
/// `close` waits for any in-flight write on that connection, which can take up
/// to the write timeout. The shutdown signal fires before that wait.
fn retire(conn: Arc<ClientConnection>) -> JoinHandle<bool> {
    tokio::spawn(async move { conn.close().await })
}
