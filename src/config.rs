//! # Client Configuration
//!
//! Where the client connects and how long a single receive may block.
//!
//! ## Configuration Sources
//! - JSON strings or files via `from_json()` / `from_file()`
//! - Environment variables via `from_env()`
//! - Direct instantiation with defaults
//!
//! The port may be written as a number or a numeric string:
//! `{"address": "127.0.0.1", "port": "45987"}`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{MemwireError, Result};

/// Default remote host.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1";

/// Default remote port of the emulator scripting endpoint.
pub const DEFAULT_PORT: u16 = 45987;

/// Client connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Remote host name or IP address.
    pub address: String,

    /// Remote port.
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,

    /// Receive timeout in milliseconds; absent means block indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_timeout_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            read_timeout_ms: None,
        }
    }
}

impl ClientConfig {
    /// Create a config for the given endpoint.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            read_timeout_ms: None,
        }
    }

    /// Load configuration from a JSON string.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MemwireError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Start from defaults and apply `MEMWIRE_*` environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(address) = std::env::var("MEMWIRE_ADDRESS") {
            config.address = address;
        }

        if let Ok(port) = std::env::var("MEMWIRE_PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|e| MemwireError::Config(format!("MEMWIRE_PORT={port}: {e}")))?;
        }

        if let Ok(timeout) = std::env::var("MEMWIRE_READ_TIMEOUT_MS") {
            let ms = timeout.trim().parse().map_err(|e| {
                MemwireError::Config(format!("MEMWIRE_READ_TIMEOUT_MS={timeout}: {e}"))
            })?;
            config.read_timeout_ms = Some(ms);
        }

        Ok(config)
    }

    /// Receive timeout as a `Duration`.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    /// Validate the configuration for common misconfigurations.
    ///
    /// Returns a list of problems. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.address.trim().is_empty() {
            errors.push("address must not be empty".to_string());
        }
        if self.port == 0 {
            errors.push("port must be non-zero".to_string());
        }
        // A zero socket timeout is rejected by the OS.
        if self.read_timeout_ms == Some(0) {
            errors.push("read_timeout_ms must be greater than zero".to_string());
        }

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(MemwireError::Config(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

fn deserialize_port<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text
            .trim()
            .parse()
            .map_err(|e| serde::de::Error::custom(format!("invalid port {text:?}: {e}"))),
    }
}
