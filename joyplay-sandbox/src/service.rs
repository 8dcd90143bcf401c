//! Playground service - main entry point

use crate::config::SandboxConfig;
use crate::error::{Result, SandboxError};
use crate::execution::ExecutionId;
use crate::normalize::Normalizer;
use crate::precheck::check_entry_package;
use crate::runtime::{Completion, Invocation, Runtime};
use crate::types::{BuildOutcome, CompileResponse, Event, EventKind, FormatResponse};
use crate::workspace::Workspace;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs submitted programs through the engine and shapes the results
/// for playground clients
pub struct PlaygroundService {
    runtime: Arc<dyn Runtime>,
    config: SandboxConfig,
}

impl PlaygroundService {
    /// Create a new playground service with the given runtime
    pub fn new(runtime: impl Runtime + 'static, config: SandboxConfig) -> Self {
        Self {
            runtime: Arc::new(runtime),
            config,
        }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Run `source` and return its output as ordered events.
    ///
    /// Validation failures and timeouts come back as `CompileResponse::error`;
    /// only infrastructure failures are returned as `Err`.
    pub async fn compile(&self, source: &str, cancel: &CancellationToken) -> Result<CompileResponse> {
        let id = ExecutionId::new();
        tracing::info!(
            execution_id = %id,
            runtime = self.runtime.name(),
            code_len = source.len(),
            "Compiling program"
        );

        match self.run_events(source, cancel).await {
            Ok(events) => {
                tracing::debug!(execution_id = %id, events = events.len(), "Program finished");
                Ok(CompileResponse::events(events))
            }
            Err(e) if e.is_recoverable() => {
                tracing::info!(execution_id = %id, reason = %e, "Program rejected");
                Ok(CompileResponse::error(client_message(&e)))
            }
            Err(e) => {
                tracing::error!(execution_id = %id, error = %e, "Execution failed");
                Err(e)
            }
        }
    }

    /// Translate `source` without running it, returning the scrubbed artifact
    pub async fn build(&self, source: &str, cancel: &CancellationToken) -> Result<BuildOutcome> {
        let id = ExecutionId::new();
        tracing::info!(execution_id = %id, code_len = source.len(), "Building program");

        match self.build_artifact(source, cancel).await {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_recoverable() => {
                tracing::info!(execution_id = %id, reason = %e, "Build rejected");
                Ok(BuildOutcome::Errors(client_message(&e)))
            }
            Err(e) => {
                tracing::error!(execution_id = %id, error = %e, "Build failed");
                Err(e)
            }
        }
    }

    /// Format `source` with the configured formatter, or with the imports
    /// formatter when `imports` is set.
    ///
    /// The source is not prechecked; syntax problems come back from the
    /// formatter as `FormatResponse::error`.
    pub async fn format(
        &self,
        source: &str,
        imports: bool,
        cancel: &CancellationToken,
    ) -> Result<FormatResponse> {
        let id = ExecutionId::new();
        tracing::info!(execution_id = %id, imports, code_len = source.len(), "Formatting program");

        match self.format_source(source, imports, cancel).await {
            Ok(response) => Ok(response),
            Err(e) if e.is_recoverable() => {
                tracing::info!(execution_id = %id, reason = %e, "Format rejected");
                Ok(FormatResponse::error(client_message(&e)))
            }
            Err(e) => {
                tracing::error!(execution_id = %id, error = %e, "Format failed");
                Err(e)
            }
        }
    }

    async fn run_events(&self, source: &str, cancel: &CancellationToken) -> Result<Vec<Event>> {
        check_entry_package(source)?;
        let (workspace, normalizer, completion) = self
            .execute(source, &self.config.engine, &self.config.run_args, cancel)
            .await?;

        let mut events = completion.recording.events()?;
        normalizer.apply_events(&mut events);

        workspace.close();
        Ok(events)
    }

    async fn build_artifact(&self, source: &str, cancel: &CancellationToken) -> Result<BuildOutcome> {
        check_entry_package(source)?;
        let (workspace, normalizer, completion) = self
            .execute(source, &self.config.engine, &self.config.build_args, cancel)
            .await?;

        let outcome = if completion.success() {
            let artifact = completion.recording.text(EventKind::Stdout)?;
            BuildOutcome::Artifact(normalizer.apply(&artifact).into_owned())
        } else {
            let stderr = completion.recording.text(EventKind::Stderr)?;
            BuildOutcome::Errors(format!(
                "error building code: {}",
                normalizer.apply(stderr.trim_end())
            ))
        };

        workspace.close();
        Ok(outcome)
    }

    async fn format_source(
        &self,
        source: &str,
        imports: bool,
        cancel: &CancellationToken,
    ) -> Result<FormatResponse> {
        let (program, args) = if imports {
            (&self.config.imports_formatter, &self.config.imports_args)
        } else {
            (&self.config.formatter, &self.config.format_args)
        };
        let (workspace, normalizer, completion) =
            self.execute(source, program, args, cancel).await?;

        let response = if completion.success() {
            FormatResponse::formatted(completion.recording.text(EventKind::Stdout)?)
        } else {
            let stderr = completion.recording.text(EventKind::Stderr)?;
            let message = normalizer.apply(stderr.trim_end()).into_owned();
            if message.is_empty() {
                FormatResponse::error(match completion.exit_code {
                    Some(code) => format!("formatter exited with code {}", code),
                    None => "formatter was killed by a signal".to_string(),
                })
            } else {
                FormatResponse::error(message)
            }
        };

        workspace.close();
        Ok(response)
    }

    /// Materialize the workspace and run `program` over the source file.
    ///
    /// The workspace is returned so callers decide when it goes away; on
    /// every error path it is dropped (and removed) here.
    async fn execute(
        &self,
        source: &str,
        program: &str,
        args: &[String],
        cancel: &CancellationToken,
    ) -> Result<(Workspace, Normalizer, Completion)> {
        let workspace = Workspace::create(self.config.workspace_root.as_deref())?;
        let file = workspace
            .write_source(&self.config.source_file, source)
            .await?;
        let normalizer = Normalizer::new(workspace.path(), self.config.placeholder.clone())?;

        let invocation = self.invocation(program, args, &file, workspace.path());
        let completion = self.runtime.run(invocation, cancel).await?;

        Ok((workspace, normalizer, completion))
    }

    fn invocation(&self, program: &str, args: &[String], file: &Path, dir: &Path) -> Invocation {
        Invocation::new(program, dir)
            .args(args.iter().cloned())
            .args([file.to_string_lossy().into_owned()])
            .env(&self.config.env)
            .deadline(self.config.deadline)
    }
}

/// Text shown to the client for a recovered failure
fn client_message(err: &SandboxError) -> String {
    match err {
        SandboxError::Timeout { .. } => "process took too long".to_string(),
        other => other.to_string(),
    }
}
