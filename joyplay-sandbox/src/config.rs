//! Sandbox configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variables passed through to the engine when present.
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &[
    "PATH",
    "GOPATH",
    "HOME",
    "HOMEDRIVE",   // Windows
    "HOMEPATH",    // Windows
    "USERPROFILE", // Windows
];

/// How the build/run engine is invoked and bounded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Engine executable
    pub engine: String,

    /// Arguments placed before the source file when running a program
    pub run_args: Vec<String>,

    /// Arguments placed before the source file when translating a program
    pub build_args: Vec<String>,

    /// Formatter executable; prints the formatted source on stdout
    pub formatter: String,

    pub format_args: Vec<String>,

    /// Formatter that also adds missing and drops unused imports
    pub imports_formatter: String,

    pub imports_args: Vec<String>,

    /// Maximum wall-clock time for one engine invocation
    #[serde(with = "humantime_serde")]
    pub deadline: Duration,

    /// Parent directory for ephemeral workspaces (None = OS temp dir)
    pub workspace_root: Option<PathBuf>,

    /// File name the source is materialized as inside the workspace
    pub source_file: String,

    /// Replacement for workspace paths in captured output
    pub placeholder: String,

    /// Names of variables copied from the server environment
    pub env_allowlist: Vec<String>,

    /// Resolved engine environment; never the full ambient one
    #[serde(skip)]
    pub env: Vec<(String, String)>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            engine: "joy".to_string(),
            run_args: Vec::new(),
            build_args: vec!["build".to_string()],
            formatter: "gofmt".to_string(),
            format_args: Vec::new(),
            imports_formatter: "goimports".to_string(),
            imports_args: Vec::new(),
            deadline: Duration::from_secs(2),
            workspace_root: None,
            source_file: "main.go".to_string(),
            placeholder: "playground".to_string(),
            env_allowlist: DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
            env: Vec::new(),
        }
    }
}

impl SandboxConfig {
    /// Resolve `env_allowlist` through `lookup`, keeping only variables that are set
    pub fn capture_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        self.env = self
            .env_allowlist
            .iter()
            .filter_map(|name| lookup(name).map(|value| (name.clone(), value)))
            .collect();
        self
    }

    pub fn with_engine(mut self, engine: impl Into<String>, run_args: Vec<String>) -> Self {
        self.engine = engine.into();
        self.run_args = run_args;
        self
    }

    pub fn with_build_args(mut self, build_args: Vec<String>) -> Self {
        self.build_args = build_args;
        self
    }

    pub fn with_formatter(mut self, formatter: impl Into<String>, args: Vec<String>) -> Self {
        self.formatter = formatter.into();
        self.format_args = args;
        self
    }

    pub fn with_imports_formatter(mut self, formatter: impl Into<String>, args: Vec<String>) -> Self {
        self.imports_formatter = formatter.into();
        self.imports_args = args;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}
