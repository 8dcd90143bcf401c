//! Application configuration
//!
//! Read from `~/.config/joyplay/config.toml` when present:
//!
//! ```toml
//! [server]
//! bind_address = "0.0.0.0:8080"
//!
//! [sandbox]
//! engine = "joy"
//! deadline = "2s"
//!
//! [store]
//! local_dir = "/var/lib/joyplay/snippets"
//!
//! [store.upstream]
//! base_url = "https://play.golang.org/p/"
//!
//! [artifacts.s3]
//! bucket = "joyplay"
//! prefix = "js/"
//! ```

use joyplay_sandbox::SandboxConfig;
use joyplay_store::{S3Config, StoreConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Cannot determine home directory")]
    NoHomeDir,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub sandbox: SandboxConfig,
    pub store: StoreConfig,
    /// Prebuilt host-page programs, consulted before building one
    pub artifacts: Option<ArtifactConfig>,
}

/// Read-only location of translated programs, keyed by snippet id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub s3: Option<S3Config>,
    pub local_dir: Option<PathBuf>,
}

impl ArtifactConfig {
    /// Store layout for the artifact tiers; None when nothing is configured
    pub fn store_config(&self) -> Option<StoreConfig> {
        if self.s3.is_none() && self.local_dir.is_none() {
            return None;
        }
        Some(StoreConfig {
            s3: self.s3.clone(),
            local_dir: self.local_dir.clone(),
            upstream: None,
            ..StoreConfig::default()
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

impl AppConfig {
    /// Load the user configuration, or defaults when there is none
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".config").join("joyplay").join("config.toml"))
    }

    /// Sandbox settings with the engine environment resolved from this
    /// process's environment. The only place the ambient environment is read.
    pub fn sandbox_config(&self) -> SandboxConfig {
        self.sandbox
            .clone()
            .capture_env(|name| std::env::var(name).ok())
    }
}
