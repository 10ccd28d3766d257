//! Connection settings for a box.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Where the box lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Hostname or IP address of the box.
    pub host: String,
    /// HTTP port of the box.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per request timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_port() -> u16 {
    80
}

fn default_timeout_secs() -> u64 {
    crate::DEFAULT_TIMEOUT.as_secs()
}

impl Config {
    /// Settings for the box at `host` with the default port and timeout.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Parse settings from a toml string.
    pub fn from_str(config: &str) -> Result<Self> {
        Ok(toml::from_str(config)?)
    }

    /// The request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
