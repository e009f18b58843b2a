//! Registered client connection
//!
//! A `ClientConnection` owns the outbound half of one viewer's byte stream.
//! The inbound half stays with the keep-alive handler, which learns about
//! removal through the connection's shutdown signal.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{watch, Mutex};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// One live viewer connection
///
/// Writes are serialized through an async mutex so a framed message is always
/// written as a single unit, even when several publishes race.
pub struct ClientConnection {
    id: u64,
    peer_addr: SocketAddr,
    connected_at: Instant,
    writer: Mutex<Option<BoxedWriter>>,
    closed: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
}

impl ClientConnection {
    /// Wrap the outbound half of a client stream
    pub fn new<W>(id: u64, peer_addr: SocketAddr, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            id,
            peer_addr,
            connected_at: Instant::now(),
            writer: Mutex::new(Some(Box::new(writer))),
            closed: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    /// Unique connection ID, increasing in admission order
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remote peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// How long the connection has been open
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Whether the connection was closed or a write on it failed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Receiver that flips to `true` once the connection is closed
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Write one complete frame, bounded by `timeout`
    ///
    /// Writing to a closed connection fails with `NotConnected`. A failed or
    /// timed-out write may leave part of a frame on the stream, so it closes
    /// the connection before the writer lock is released; no later frame can
    /// follow the partial one.
    pub async fn send(&self, frame: &[u8], timeout: Duration) -> io::Result<()> {
        if self.is_closed() {
            return Err(not_connected());
        }

        let mut guard = self.writer.lock().await;
        if self.is_closed() {
            return Err(not_connected());
        }
        let writer = guard.as_mut().ok_or_else(not_connected)?;

        let write = async {
            writer.write_all(frame).await?;
            writer.flush().await
        };

        let result = match tokio::time::timeout(timeout, write).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "write timed out")),
        };

        if result.is_err() {
            self.mark_closed();
            // Dropping the writer releases the stream without waiting on the peer
            guard.take();
        }

        result
    }

    /// Shut down and release the stream
    ///
    /// Only the first call does any work; it returns `true`. Later calls
    /// return `false`, including after a failed `send` closed the connection.
    pub async fn close(&self) -> bool {
        if !self.mark_closed() {
            return false;
        }

        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            // Peer may already be gone
            let _ = writer.shutdown().await;
        }

        true
    }

    fn mark_closed(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.shutdown_tx.send_replace(true);
        true
    }
}

impl fmt::Debug for ClientConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConnection")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "connection closed")
}
