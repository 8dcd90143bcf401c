//! Operations behind the HTTP routes

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::render::render_page;
use anyhow::{Context, Result};
use bytes::Bytes;
use joyplay_sandbox::{
    BuildOutcome, CancellationToken, CompileResponse, FormatResponse, PlaygroundService,
    ProcessRuntime,
};
use joyplay_store::{SnippetId, SnippetStore, StoreError};
use tracing::{debug, info, warn};

/// Sandbox and snippet store bound to one shutdown signal.
///
/// Every execution runs under a child of the shutdown token, so cancelling
/// it stops all in-flight programs.
pub struct Playground {
    service: PlaygroundService,
    store: SnippetStore,
    /// Prebuilt translations keyed by snippet id; read-only
    artifacts: Option<SnippetStore>,
    shutdown: CancellationToken,
}

impl Playground {
    pub fn new(service: PlaygroundService, store: SnippetStore) -> Self {
        Self {
            service,
            store,
            artifacts: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Serve `/js` pages from `artifacts` when they hold the snippet's
    /// translation, building only on a miss
    pub fn with_artifacts(mut self, artifacts: SnippetStore) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    /// Build the process-backed playground described by `config`
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let sandbox = config.sandbox_config();
        info!(
            engine = %sandbox.engine,
            deadline_ms = sandbox.deadline.as_millis() as u64,
            "Sandbox configured"
        );
        let service = PlaygroundService::new(ProcessRuntime::new(), sandbox);

        let store = SnippetStore::from_config(&config.store)
            .await
            .context("Failed to initialize snippet store")?;

        let mut playground = Self::new(service, store);
        if let Some(layout) = config.artifacts.as_ref().and_then(|a| a.store_config()) {
            let artifacts = SnippetStore::from_config(&layout)
                .await
                .context("Failed to initialize artifact store")?;
            playground = playground.with_artifacts(artifacts);
        }
        Ok(playground)
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub fn store(&self) -> &SnippetStore {
        &self.store
    }

    /// Run a program and return its output events (or its rejection)
    pub async fn compile(&self, source: &str) -> Result<CompileResponse, ApiError> {
        let cancel = self.shutdown.child_token();
        Ok(self.service.compile(source, &cancel).await?)
    }

    pub async fn format(&self, source: &str, imports: bool) -> Result<FormatResponse, ApiError> {
        let cancel = self.shutdown.child_token();
        Ok(self.service.format(source, imports, &cancel).await?)
    }

    pub async fn share(&self, body: &[u8]) -> Result<SnippetId, ApiError> {
        let id = self.store.store(body).await?;
        info!(snippet_id = %id, size = body.len(), "Shared snippet");
        Ok(id)
    }

    pub async fn snippet(&self, id: &str) -> Result<Bytes, ApiError> {
        Ok(self.store.resolve(id).await?)
    }

    /// Resolve a snippet, translate it, and wrap the result in a host page
    pub async fn render(&self, id: &str) -> Result<String, ApiError> {
        if let Some(artifact) = self.prebuilt(id).await {
            return Ok(render_page(&artifact));
        }

        let body = self.store.resolve(id).await?;
        let source = std::str::from_utf8(&body)
            .map_err(|e| ApiError::Build(format!("snippet is not valid UTF-8: {}", e)))?;

        let cancel = self.shutdown.child_token();
        match self.service.build(source, &cancel).await? {
            BuildOutcome::Artifact(artifact) => Ok(render_page(&artifact)),
            BuildOutcome::Errors(message) => Err(ApiError::Build(message)),
        }
    }

    async fn prebuilt(&self, id: &str) -> Option<String> {
        let artifacts = self.artifacts.as_ref()?;
        match artifacts.resolve(id).await {
            Ok(body) => match String::from_utf8(body.to_vec()) {
                Ok(artifact) => {
                    debug!(snippet_id = id, "Serving prebuilt artifact");
                    Some(artifact)
                }
                Err(e) => {
                    warn!(snippet_id = id, error = %e, "Prebuilt artifact is not UTF-8, rebuilding");
                    None
                }
            },
            Err(StoreError::NotFound { .. } | StoreError::InvalidId(_)) => None,
            Err(e) => {
                warn!(snippet_id = id, error = %e, "Artifact lookup failed, rebuilding");
                None
            }
        }
    }
}
