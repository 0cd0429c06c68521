//! Link configuration with layered sources.
//!
//! Priority chain (later overrides earlier):
//! 1. Config file (TOML), if one is given
//! 2. `WATCHPOST_*` environment variables
//! 3. CLI flags (caller supplies these as a final overlay)
//!
//! There is deliberately no built-in default host: the panel's historical
//! deployment address (`192.168.2.10`) is example configuration, never a
//! compiled-in constant.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Connect timeout applied when no source specifies one.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const ENV_HOST: &str = "WATCHPOST_HOST";
const ENV_PORT: &str = "WATCHPOST_PORT";
const ENV_CONNECT_TIMEOUT: &str = "WATCHPOST_CONNECT_TIMEOUT_SECS";

// ---------------------------------------------------------------------------
// LinkConfig
// ---------------------------------------------------------------------------

/// Fully-resolved configuration for one device link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Remote host (IP or hostname). Required, no default.
    pub host: String,
    /// Remote command-endpoint port.
    pub port: u16,
    /// How long to wait for the WebSocket handshake before failing.
    pub connect_timeout: Duration,
}

impl LinkConfig {
    /// Build a config from explicit values.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, ConfigError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }
        Ok(Self {
            host,
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    /// Replace the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// The WebSocket endpoint URL this config points at.
    pub fn endpoint_url(&self) -> String {
        format!("ws://{}:{}/", self.host, self.port)
    }
}

// ---------------------------------------------------------------------------
// PartialLinkConfig
// ---------------------------------------------------------------------------

/// One configuration layer; every field optional so layers can be merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialLinkConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub connect_timeout_secs: Option<u64>,
}

impl PartialLinkConfig {
    /// Load a layer from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load a layer from `WATCHPOST_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var(ENV_HOST).ok().filter(|h| !h.is_empty());

        let port = match std::env::var(ENV_PORT) {
            Ok(raw) => Some(raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                field: "port",
                value: raw.clone(),
            })?),
            Err(_) => None,
        };

        let connect_timeout_secs = match std::env::var(ENV_CONNECT_TIMEOUT) {
            Ok(raw) => Some(raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                field: "connect_timeout_secs",
                value: raw.clone(),
            })?),
            Err(_) => None,
        };

        Ok(Self {
            host,
            port,
            connect_timeout_secs,
        })
    }

    /// Merge another layer over this one; fields set in `over` win.
    pub fn merge(self, over: PartialLinkConfig) -> Self {
        Self {
            host: over.host.or(self.host),
            port: over.port.or(self.port),
            connect_timeout_secs: over.connect_timeout_secs.or(self.connect_timeout_secs),
        }
    }

    /// Resolve the merged layers into a usable [`LinkConfig`].
    pub fn build(self) -> Result<LinkConfig, ConfigError> {
        let host = self.host.ok_or(ConfigError::MissingHost)?;
        let port = self.port.ok_or(ConfigError::MissingPort)?;
        let mut config = LinkConfig::new(host, port)?;
        if let Some(secs) = self.connect_timeout_secs {
            config = config.with_connect_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
