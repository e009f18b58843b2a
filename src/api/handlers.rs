//! Status endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::error::Error;

use super::ApiState;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::UnknownCamera(_) => StatusCode::NOT_FOUND,
            Error::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            Error::Io(_) | Error::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Status request failed");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /cameras/:camera/status - Stored status document
pub async fn get_status(
    State(state): State<Arc<ApiState>>,
    Path(camera): Path<String>,
) -> Result<Json<Value>, Error> {
    state.trigger.status(&camera).map(Json)
}

/// PUT /cameras/:camera/status - New occupancy state from the detector
///
/// Responds with the slot counts taken from the submitted document.
pub async fn put_status(
    State(state): State<Arc<ApiState>>,
    Path(camera): Path<String>,
    Json(status): Json<Value>,
) -> Result<Json<Value>, Error> {
    let filled = status.get("filled_slots").cloned().unwrap_or(Value::Null);
    let available = status.get("available_slots").cloned().unwrap_or(Value::Null);

    state.trigger.update(&camera, status).await?;

    Ok(Json(json!({
        "filled_slots": filled,
        "available_slots": available,
    })))
}

/// POST /cameras/:camera/reset - Mark every slot free
pub async fn reset_status(
    State(state): State<Arc<ApiState>>,
    Path(camera): Path<String>,
) -> Result<Json<Value>, Error> {
    state.trigger.reset(&camera).await?;
    Ok(Json(json!({ "status": "OK" })))
}

/// GET /stats - Fan-out counters
pub async fn get_stats(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let broadcaster = state.trigger.broadcaster();
    let active = broadcaster.registry().len().await;
    Json(broadcaster.stats().snapshot(active))
}
