//! Camera connection configuration.
//!
//! Small enough to build inline for most callers; the YAML loaders exist for
//! deployments that keep per-camera credentials in config files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::LiveStreamOptions;

fn default_port() -> u16 {
    8000
}

fn default_channel() -> u32 {
    1
}

/// Connection parameters for one camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Device hostname or IP address.
    pub host: String,
    /// Device service port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login username.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Stream channel to pull (devices number channels from 1).
    #[serde(default = "default_channel")]
    pub channel: u32,
    /// Vendor link mode; 0 is plain TCP.
    #[serde(default)]
    pub link_mode: u32,
}

impl CameraConfig {
    /// Build a config for `host` with default port, channel and link mode.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            username: username.into(),
            password: password.into(),
            channel: default_channel(),
            link_mode: 0,
        }
    }

    /// Parse a config from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Load a config from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// The live-stream options this config implies.
    pub fn stream_options(&self) -> LiveStreamOptions {
        LiveStreamOptions { channel: self.channel, link_mode: self.link_mode, window: None }
    }
}
