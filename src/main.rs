//! Occupancy fan-out server
//!
//! Run with: occupancy-server [FANOUT_ADDR] [API_ADDR] [STATUS_DIR]
//!
//! Viewers connect to FANOUT_ADDR with a plain TCP socket and receive one JSON
//! line per status change, e.g. `{"cam1": {"available_slots": 3}}`.
//! The detector (or an operator) drives updates through the HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;

use occupancy_fanout::api::{self, ApiConfig};
use occupancy_fanout::{FanoutServer, FileStatusStore, ServerConfig, StatusTrigger};

/// Parse a bind address from a command line argument.
///
/// Accepts `IP:PORT`, a bare `IP` (uses `default_port`) and `localhost`.
fn parse_bind_addr(arg: &str, default_port: u16) -> Result<SocketAddr, String> {
    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, default_port));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: occupancy-server [FANOUT_ADDR] [API_ADDR] [STATUS_DIR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  FANOUT_ADDR  Viewer listener (default: 0.0.0.0:8000)");
    eprintln!("  API_ADDR     HTTP status API (default: 0.0.0.0:9000)");
    eprintln!("  STATUS_DIR   Directory of <camera>.json files (default: status)");
    eprintln!();
    eprintln!("Set RUST_LOG to adjust logging, e.g. RUST_LOG=occupancy_fanout=debug");
}

fn parse_or_exit(arg: Option<&String>, default: SocketAddr) -> SocketAddr {
    match arg {
        Some(addr_str) => match parse_bind_addr(addr_str, default.port()) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => default,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let server_config = ServerConfig::default();
    let mut api_config = ApiConfig::default();

    let fanout_addr = parse_or_exit(args.get(1), server_config.bind_addr);
    api_config.bind_addr = parse_or_exit(args.get(2), api_config.bind_addr);
    if let Some(dir) = args.get(3) {
        api_config = api_config.status_dir(dir);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let server = FanoutServer::new(server_config.bind(fanout_addr));
    let store = Arc::new(FileStatusStore::new(&api_config.status_dir));
    let trigger = StatusTrigger::new(server.broadcaster(), store, api_config.cameras.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let wait_for_shutdown = |mut rx: watch::Receiver<bool>| async move {
        let _ = rx.wait_for(|stop| *stop).await;
    };

    let fanout_listener = TcpListener::bind(server.bind_addr()).await?;
    let api_listener = TcpListener::bind(api_config.bind_addr).await?;

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutting down");
        }
        shutdown_tx.send_replace(true);
    });

    let (fanout, api) = tokio::join!(
        server.serve_until(fanout_listener, wait_for_shutdown(shutdown_rx.clone())),
        api::serve(api_listener, trigger, wait_for_shutdown(shutdown_rx)),
    );

    if let Err(e) = fanout {
        tracing::error!(error = %e, "Fan-out server error");
    }
    if let Err(e) = api {
        tracing::error!(error = %e, "Status API error");
    }

    Ok(())
}
