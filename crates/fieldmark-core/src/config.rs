//! Connection settings for the remote search service.
//!
//! Configuration is read from a TOML file and can be overridden from the
//! environment:
//!
//! ```toml
//! [backend]
//! api_key = "xyz"
//! host = "search.internal"
//! port = 8108
//! ```
//!
//! | Variable | Field |
//! |----------|-------|
//! | `FIELDMARK_API_KEY` | `backend.api_key` |
//! | `FIELDMARK_SCHEME` | `backend.scheme` |
//! | `FIELDMARK_HOST` | `backend.host` |
//! | `FIELDMARK_PORT` | `backend.port` |
//! | `FIELDMARK_PATH` | `backend.path` |

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Settings for reaching a Typesense-compatible search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// API key sent with every request.
    #[serde(default)]
    pub api_key: String,

    /// URL scheme: "http" or "https".
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Host name or address.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path prefix when the service sits behind a proxy.
    #[serde(default)]
    pub path: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8108
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            scheme: default_scheme(),
            host: default_host(),
            port: default_port(),
            path: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    /// Base URL without a trailing slash, e.g. `http://127.0.0.1:8108`.
    pub fn base_url(&self) -> String {
        let path = self.path.trim_matches('/');
        if path.is_empty() {
            format!("{}://{}:{}", self.scheme, self.host, self.port)
        } else {
            format!("{}://{}:{}/{path}", self.scheme, self.host, self.port)
        }
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check the settings before a client is built from them.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::config(
                "backend.api_key is empty (set it in the config file or FIELDMARK_API_KEY)",
            ));
        }
        if !matches!(self.scheme.as_str(), "http" | "https") {
            return Err(Error::config(format!(
                "backend.scheme must be \"http\" or \"https\", got \"{}\"",
                self.scheme
            )));
        }
        if self.host.trim().is_empty() {
            return Err(Error::config("backend.host is empty"));
        }
        Ok(())
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Search service connection.
    #[serde(default)]
    pub backend: BackendConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Apply `FIELDMARK_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the environment in production).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = lookup("FIELDMARK_API_KEY") {
            self.backend.api_key = api_key;
        }
        if let Some(scheme) = lookup("FIELDMARK_SCHEME") {
            self.backend.scheme = scheme;
        }
        if let Some(host) = lookup("FIELDMARK_HOST") {
            self.backend.host = host;
        }
        if let Some(port) = lookup("FIELDMARK_PORT") {
            self.backend.port = port
                .parse()
                .map_err(|e| Error::config(format!("FIELDMARK_PORT=\"{port}\": {e}")))?;
        }
        if let Some(path) = lookup("FIELDMARK_PATH") {
            self.backend.path = path;
        }
        log::debug!("Resolved backend at {}", self.backend.base_url());
        Ok(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
