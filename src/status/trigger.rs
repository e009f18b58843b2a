//! Status update trigger
//!
//! Glue between the request/response layer and the fan-out: persist the new
//! state first, then push it to viewers. Fan-out never fails the caller.

use std::sync::Arc;

use serde_json::Value;

use crate::broadcast::Broadcaster;
use crate::error::{Error, Result};

use super::store::{reset_items, StatusStore};

/// Entry point for camera status changes
#[derive(Clone)]
pub struct StatusTrigger {
    broadcaster: Broadcaster,
    store: Arc<dyn StatusStore>,
    cameras: Arc<[String]>,
}

impl StatusTrigger {
    /// Trigger accepting updates for `cameras` only
    pub fn new(broadcaster: Broadcaster, store: Arc<dyn StatusStore>, cameras: Vec<String>) -> Self {
        Self {
            broadcaster,
            store,
            cameras: cameras.into(),
        }
    }

    /// Configured camera keys
    pub fn cameras(&self) -> &[String] {
        &self.cameras
    }

    /// Broadcaster used for pushes
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Push an already computed payload for `camera` to every viewer
    pub async fn notify(&self, camera: &str, payload: Value) {
        self.broadcaster.publish(camera, payload).await;
    }

    /// Current stored status for `camera`
    pub fn status(&self, camera: &str) -> Result<Value> {
        self.ensure_camera(camera)?;
        self.store.read(camera)
    }

    /// Store a new status document for `camera` and push it
    pub async fn update(&self, camera: &str, status: Value) -> Result<()> {
        self.ensure_camera(camera)?;
        if !status.is_object() {
            return Err(Error::InvalidStatus("expected a JSON object".to_string()));
        }

        self.store.write(camera, &status)?;
        tracing::debug!(camera = camera, "Status updated");

        self.notify(camera, status).await;
        Ok(())
    }

    /// Mark all slots of `camera` as free, store and push
    ///
    /// Returns how many slots were reset.
    pub async fn reset(&self, camera: &str) -> Result<usize> {
        self.ensure_camera(camera)?;

        let mut status = self.store.read(camera)?;
        let reset = reset_items(&mut status);
        self.store.write(camera, &status)?;
        tracing::info!(camera = camera, slots = reset, "Status reset");

        self.notify(camera, status).await;
        Ok(reset)
    }

    fn ensure_camera(&self, camera: &str) -> Result<()> {
        if self.cameras.iter().any(|c| c == camera) {
            Ok(())
        } else {
            Err(Error::UnknownCamera(camera.to_string()))
        }
    }
}
