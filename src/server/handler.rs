//! Per-connection keep-alive handler
//!
//! Viewers only receive; the server never expects inbound data. The handler
//! holds the read half open, discards anything the peer sends, and waits for
//! either the peer to go away or the connection to be closed by the server
//! (eviction, failed write, shutdown).

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;

use crate::registry::{ClientConnection, ConnectionRegistry};

/// Why a keep-alive handler stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Closed by the server
    Closed,
    /// Peer sent EOF
    PeerClosed,
    /// Read failed
    ReadError,
}

impl DisconnectReason {
    fn as_str(&self) -> &'static str {
        match self {
            DisconnectReason::Closed => "closed by server",
            DisconnectReason::PeerClosed => "peer closed",
            DisconnectReason::ReadError => "read error",
        }
    }
}

/// Hold a registered connection open until it terminates
///
/// On exit the connection is removed from the registry and closed. Both steps
/// are no-ops if another path already did them.
pub async fn keep_alive<R>(
    conn: Arc<ClientConnection>,
    mut reader: R,
    registry: Arc<ConnectionRegistry>,
    buffer_size: usize,
) -> DisconnectReason
where
    R: AsyncRead + Unpin,
{
    let mut shutdown = conn.shutdown_signal();
    let mut buf = vec![0u8; buffer_size.max(1)];

    let reason = loop {
        tokio::select! {
            _ = wait_closed(&mut shutdown) => break DisconnectReason::Closed,
            read = reader.read(&mut buf) => match read {
                Ok(0) => break DisconnectReason::PeerClosed,
                Ok(n) => {
                    tracing::trace!(client_id = conn.id(), bytes = n, "Ignoring inbound bytes");
                }
                Err(e) => {
                    tracing::debug!(client_id = conn.id(), error = %e, "Read error");
                    break DisconnectReason::ReadError;
                }
            }
        }
    };

    registry.remove(&conn).await;
    conn.close().await;
    drop(reader);

    tracing::info!(
        client_id = conn.id(),
        peer = %conn.peer_addr(),
        reason = reason.as_str(),
        "Viewer disconnected"
    );

    reason
}

async fn wait_closed(signal: &mut watch::Receiver<bool>) {
    let _ = signal.wait_for(|closed| *closed).await;
}
