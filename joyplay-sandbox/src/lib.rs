//! Playground sandbox - bounded execution of untrusted programs
//!
//! Hands submitted source to an external build/run engine, races the engine
//! against a wall-clock deadline, and records everything the program writes
//! as an ordered, replayable event stream.

mod config;
mod error;
mod execution;
mod normalize;
mod precheck;
mod recorder;
mod runtime;
mod service;
mod types;
mod workspace;

pub use config::{SandboxConfig, DEFAULT_ENV_ALLOWLIST};
pub use error::{Result, SandboxError};
pub use execution::ExecutionId;
pub use normalize::Normalizer;
pub use precheck::check_entry_package;
pub use recorder::{Chunk, Recorder, Recording};
pub use runtime::{Completion, Invocation, Runtime};
#[cfg(feature = "process")]
pub use runtime::ProcessRuntime;
pub use service::PlaygroundService;
pub use types::{
    BuildOutcome, CompileRequest, CompileResponse, Event, EventKind, FormatRequest, FormatResponse,
};
pub use workspace::Workspace;

/// Cancellation handle accepted by every execution.
pub use tokio_util::sync::CancellationToken;
