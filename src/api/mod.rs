//! HTTP API for camera status
//!
//! - `GET /health` - Liveness probe
//! - `GET /cameras/:camera/status` - Stored status
//! - `PUT /cameras/:camera/status` - Store and push a new status
//! - `POST /cameras/:camera/reset` - Free every slot, store and push
//! - `GET /stats` - Fan-out counters

pub mod config;
pub mod handlers;

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;

use crate::error::Result;
use crate::status::StatusTrigger;

pub use config::ApiConfig;

/// Shared state for API handlers
pub struct ApiState {
    pub trigger: StatusTrigger,
}

/// Create the router with all endpoints
pub fn create_router(trigger: StatusTrigger) -> Router {
    let state = Arc::new(ApiState { trigger });

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/cameras/:camera/status",
            get(handlers::get_status).put(handlers::put_status),
        )
        .route("/cameras/:camera/reset", post(handlers::reset_status))
        .route("/stats", get(handlers::get_stats))
        .with_state(state)
}

/// Serve the API on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, trigger: StatusTrigger, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!(addr = %listener.local_addr()?, "Status API listening");

    axum::serve(listener, create_router(trigger))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
