//! Request/response layer configuration

use std::net::SocketAddr;
use std::path::PathBuf;

/// Default address for the HTTP API
pub const DEFAULT_API_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 9000);

/// HTTP API options
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Directory holding `<camera>.json` status files
    pub status_dir: PathBuf,

    /// Cameras accepted by the status endpoints
    pub cameras: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_API_ADDR,
            status_dir: PathBuf::from("status"),
            cameras: vec!["cam1".to_string(), "cam2".to_string()],
        }
    }
}

impl ApiConfig {
    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the status directory
    pub fn status_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.status_dir = dir.into();
        self
    }

    /// Replace the camera list
    pub fn cameras<I, S>(mut self, cameras: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cameras = cameras.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.status_dir, PathBuf::from("status"));
        assert_eq!(config.cameras, vec!["cam1", "cam2"]);
    }

    #[test]
    fn test_builder_cameras() {
        let config = ApiConfig::default().cameras(["north", "south", "east"]);

        assert_eq!(config.cameras.len(), 3);
        assert_eq!(config.cameras[0], "north");
    }
}
