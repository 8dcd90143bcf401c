//! Runtime trait and implementations

#[cfg(feature = "process")]
mod process;

use crate::recorder::Recording;
use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "process")]
pub use process::ProcessRuntime;

/// One bounded invocation of the build/run engine
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Complete environment of the child; nothing is inherited
    pub env: Vec<(String, String)>,
    pub current_dir: PathBuf,
    pub deadline: Duration,
}

impl Invocation {
    pub fn new(program: impl Into<String>, current_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            current_dir: current_dir.into(),
            deadline: Duration::from_secs(2),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, env: &[(String, String)]) -> Self {
        self.env.extend_from_slice(env);
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

/// Engine run that finished before its deadline
#[derive(Debug)]
pub struct Completion {
    /// Exit code (None when terminated by a signal)
    pub exit_code: Option<i32>,
    pub duration: Duration,
    pub recording: Recording,
}

impl Completion {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runtime abstraction for executing the engine.
///
/// Implementations race the engine against `Invocation::deadline` and the
/// cancellation token; whichever side loses must be fully reclaimed before
/// `run` returns.
#[async_trait]
pub trait Runtime: Send + Sync {
    /// Run to completion. Fails with `SandboxError::Timeout` when the deadline
    /// wins and `SandboxError::Cancelled` when `cancel` fires first.
    async fn run(&self, invocation: Invocation, cancel: &CancellationToken) -> Result<Completion>;

    /// Get runtime name
    fn name(&self) -> &str;
}
