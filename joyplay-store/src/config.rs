//! Snippet store configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Identity sent to the upstream origin with every fetch
pub const DEFAULT_USER_AGENT: &str = "gopherjs.org/play/ playground snippet fetcher";

/// Tier layout of the snippet store.
///
/// The first configured of `s3`, `local_dir` is the primary (write) tier;
/// with neither, snippets are kept in memory. `upstream` is always consulted
/// last and only for reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub s3: Option<S3Config>,
    pub local_dir: Option<PathBuf>,
    pub upstream: Option<UpstreamConfig>,
    /// Largest body accepted by `store`
    pub max_snippet_bytes: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            s3: None,
            local_dir: None,
            upstream: Some(UpstreamConfig::default()),
            max_snippet_bytes: 1024 * 1024,
        }
    }
}

/// S3 (or S3-compatible) bucket holding snippets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Key prefix prepended to snippet ids
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub force_path_style: bool,
    /// Static credentials; the SDK's default chain is used when unset
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

/// Read-only origin consulted for ids this deployment never minted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Snippet URLs are `base_url + id + suffix`
    pub base_url: String,
    pub suffix: String,
    pub user_agent: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://play.golang.org/p/".to_string(),
            suffix: ".go".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}
