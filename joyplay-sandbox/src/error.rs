//! Error types for sandbox execution

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SandboxError>;

#[derive(Debug, Error)]
pub enum SandboxError {
    /// Source does not declare a runnable entry package
    #[error("{0}")]
    Validation(String),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("process took too long (deadline {deadline:?})")]
    Timeout { deadline: Duration },

    #[error("error decoding events: {0}")]
    Decode(String),

    #[error("workspace error: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("execution cancelled")]
    Cancelled,

    #[error("process I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid workspace pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl SandboxError {
    /// Conditions caused by the submitted program itself.
    ///
    /// These are reported to the caller as ordinary results; everything else
    /// is an infrastructure failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SandboxError::Validation(_) | SandboxError::Timeout { .. })
    }
}
