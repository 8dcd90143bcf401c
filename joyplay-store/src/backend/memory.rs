//! Volatile in-memory backend

use super::SnippetBackend;
use crate::error::BackendError;
use crate::id::SnippetId;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Keeps snippets for the lifetime of the process
#[derive(Default)]
pub struct MemoryBackend {
    snippets: RwLock<HashMap<SnippetId, Bytes>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.snippets.read().await.is_empty()
    }
}

#[async_trait]
impl SnippetBackend for MemoryBackend {
    async fn get(&self, id: &SnippetId) -> Result<Bytes, BackendError> {
        self.snippets
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    async fn put(&self, id: &SnippetId, body: Bytes) -> Result<(), BackendError> {
        self.snippets.write().await.insert(id.clone(), body);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
