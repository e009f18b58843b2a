//! Status document storage
//!
//! Each camera has one JSON document describing its parking slots. The
//! fan-out core never touches storage itself; the request/response layer
//! reads and writes through a `StatusStore` and hands the result to the
//! broadcaster.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Storage for per-camera status documents
pub trait StatusStore: Send + Sync + 'static {
    /// Read the document for `camera`; a camera with no document reads as `{}`
    fn read(&self, camera: &str) -> Result<Value>;

    /// Replace the document for `camera`
    fn write(&self, camera: &str, status: &Value) -> Result<()>;
}

/// One `<camera>.json` file per camera in a directory
#[derive(Debug, Clone)]
pub struct FileStatusStore {
    dir: PathBuf,
}

impl FileStatusStore {
    /// Store keeping one `<camera>.json` file per camera under `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the status files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, camera: &str) -> PathBuf {
        self.dir.join(format!("{}.json", camera))
    }
}

impl StatusStore for FileStatusStore {
    fn read(&self, camera: &str) -> Result<Value> {
        match fs::read(self.path_for(camera)) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Value::Object(Map::new())),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, camera: &str, status: &Value) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let mut buf = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        status.serialize(&mut ser)?;

        fs::write(self.path_for(camera), buf)?;
        Ok(())
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    documents: RwLock<HashMap<String, Value>>,
}

impl MemoryStatusStore {
    /// Empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusStore for MemoryStatusStore {
    fn read(&self, camera: &str) -> Result<Value> {
        let documents = self
            .documents
            .read()
            .map_err(|_| Error::InvalidStatus("status store lock poisoned".to_string()))?;

        Ok(documents
            .get(camera)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new())))
    }

    fn write(&self, camera: &str, status: &Value) -> Result<()> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| Error::InvalidStatus("status store lock poisoned".to_string()))?;

        documents.insert(camera.to_string(), status.clone());
        Ok(())
    }
}

/// Mark every slot in `items` as free
///
/// Returns how many slots were reset. A document without an `items` object is
/// left untouched.
pub fn reset_items(status: &mut Value) -> usize {
    let Some(items) = status.get_mut("items").and_then(Value::as_object_mut) else {
        return 0;
    };

    let mut reset = 0;
    for item in items.values_mut() {
        if let Some(slot) = item.as_object_mut() {
            slot.insert("status".to_string(), Value::Bool(false));
            reset += 1;
        }
    }
    reset
}
