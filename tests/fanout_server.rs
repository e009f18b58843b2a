//! End-to-end tests for the fan-out accept loop over loopback TCP

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use occupancy_fanout::{FanoutServer, ServerConfig};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Harness {
    server: Arc<FanoutServer>,
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl Harness {
    async fn start(max_clients: usize) -> Self {
        let config = ServerConfig::default()
            .max_clients(max_clients)
            .write_timeout(Duration::from_millis(500));
        let server = Arc::new(FanoutServer::new(config));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let task = {
            let server = Arc::clone(&server);
            tokio::spawn(async move {
                let shutdown = async {
                    let _ = rx.await;
                };
                server.serve_until(listener, shutdown).await.unwrap();
            })
        };

        Self {
            server,
            addr,
            shutdown: Some(tx),
            task,
        }
    }

    async fn connect(&self) -> TcpStream {
        TcpStream::connect(self.addr).await.unwrap()
    }

    async fn wait_for_clients(&self, expected: usize, total: u64) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let active = self.server.registry().len().await;
                let accepted = self.server.stats().snapshot(active).total_connections;
                if active == expected && accepted == total {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("clients were not registered in time");
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .unwrap()
            .unwrap();
    }
}

async fn read_line(stream: &mut BufReader<TcpStream>) -> String {
    let mut line = String::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_line(&mut line))
        .await
        .unwrap()
        .unwrap();
    line
}

async fn expect_eof(stream: &mut TcpStream) {
    let mut buf = [0u8; 64];
    let n = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut buf))
        .await
        .expect("stream was not closed")
        .unwrap_or(0);
    assert_eq!(n, 0);
}

#[tokio::test]
async fn publish_reaches_every_viewer() {
    let harness = Harness::start(5).await;
    let mut viewers = Vec::new();
    for _ in 0..3 {
        viewers.push(BufReader::new(harness.connect().await));
    }
    harness.wait_for_clients(3, 3).await;

    harness
        .server
        .broadcaster()
        .publish("cam1", json!({"available_slots": 3}))
        .await;

    for viewer in &mut viewers {
        assert_eq!(
            read_line(viewer).await,
            "{\"cam1\": {\"available_slots\": 3}}\n"
        );
    }

    harness.stop().await;
}

#[tokio::test]
async fn sixth_viewer_evicts_the_first() {
    let harness = Harness::start(5).await;

    let mut first = harness.connect().await;
    harness.wait_for_clients(1, 1).await;

    let mut others = Vec::new();
    for i in 2..=5u64 {
        others.push(BufReader::new(harness.connect().await));
        harness.wait_for_clients(i as usize, i).await;
    }

    let sixth = harness.connect().await;
    harness.wait_for_clients(5, 6).await;

    expect_eof(&mut first).await;

    let snapshot = harness.server.registry().snapshot().await;
    assert_eq!(snapshot.len(), 5);
    assert_eq!(snapshot.last().unwrap().peer_addr(), sixth.local_addr().unwrap());
    assert_eq!(harness.server.stats().snapshot(5).evictions, 1);

    others.push(BufReader::new(sixth));
    harness
        .server
        .broadcaster()
        .publish("cam2", json!({"filled_slots": 7}))
        .await;
    for viewer in &mut others {
        assert_eq!(read_line(viewer).await, "{\"cam2\": {\"filled_slots\": 7}}\n");
    }

    harness.stop().await;
}

#[tokio::test]
async fn disconnected_viewer_is_unregistered() {
    let harness = Harness::start(5).await;
    let viewer = harness.connect().await;
    let _stay = harness.connect().await;
    harness.wait_for_clients(2, 2).await;

    drop(viewer);

    harness.wait_for_clients(1, 2).await;
    harness.stop().await;
}

#[tokio::test]
async fn inbound_bytes_are_ignored() {
    let harness = Harness::start(5).await;
    let mut viewer = harness.connect().await;
    harness.wait_for_clients(1, 1).await;

    viewer.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(harness.server.registry().len().await, 1);

    let mut viewer = BufReader::new(viewer);
    harness.server.broadcaster().publish("cam1", json!({})).await;
    assert_eq!(read_line(&mut viewer).await, "{\"cam1\": {}}\n");

    harness.stop().await;
}

#[tokio::test]
async fn shutdown_closes_all_viewers() {
    let harness = Harness::start(5).await;
    let mut a = harness.connect().await;
    let mut b = harness.connect().await;
    harness.wait_for_clients(2, 2).await;

    let server = Arc::clone(&harness.server);
    harness.stop().await;

    assert!(server.registry().is_empty().await);
    expect_eof(&mut a).await;
    expect_eof(&mut b).await;
}
