//! Crate error types

use std::fmt;

/// Error type for status storage and server setup
///
/// Fan-out failures are not represented here: a client that cannot be written
/// to is dropped, never reported to the publisher.
#[derive(Debug)]
pub enum Error {
    /// I/O failure (bind, status file access)
    Io(std::io::Error),
    /// Status document could not be parsed or serialized
    Json(serde_json::Error),
    /// Camera key is not configured
    UnknownCamera(String),
    /// Status document has the wrong shape
    InvalidStatus(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Json(e) => write!(f, "JSON error: {}", e),
            Error::UnknownCamera(camera) => write!(f, "Unknown camera: {}", camera),
            Error::InvalidStatus(reason) => write!(f, "Invalid status document: {}", reason),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
