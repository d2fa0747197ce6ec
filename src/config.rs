//! Client configuration.

use std::path::PathBuf;

/// Default relay hostname.
pub const DEFAULT_HOST: &str = "vlbelintrocrypto.hevs.ch";

/// Default relay TCP port.
pub const DEFAULT_PORT: u16 = 6000;

/// Default directory for received images, relative to the working directory.
pub const DEFAULT_IMAGE_DIR: &str = "imgs";

/// Configuration for a relay session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Relay hostname or IP address.
    pub host: String,

    /// Relay TCP port.
    pub port: u16,

    /// Directory where received images are written.
    pub image_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
        }
    }
}

impl ClientConfig {
    /// Create a config for a specific endpoint, keeping the default
    /// image directory.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// The endpoint in `host:port` form.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
