//! Local filesystem backend

use super::SnippetBackend;
use crate::error::BackendError;
use crate::id::SnippetId;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

/// One file per snippet, named by id, in a single directory
pub struct LocalBackend {
    dir: PathBuf,
}

impl LocalBackend {
    /// Use `dir`, creating it if needed
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, id: &SnippetId) -> PathBuf {
        self.dir.join(id.as_str())
    }
}

#[async_trait]
impl SnippetBackend for LocalBackend {
    async fn get(&self, id: &SnippetId) -> Result<Bytes, BackendError> {
        match tokio::fs::read(self.path(id)).await {
            Ok(body) => Ok(Bytes::from(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(BackendError::NotFound),
            Err(e) => Err(BackendError::Io(e)),
        }
    }

    async fn put(&self, id: &SnippetId, body: Bytes) -> Result<(), BackendError> {
        // Write beside the target and rename so readers never see a partial file.
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", id, uuid::Uuid::new_v4().simple()));
        if let Err(e) = tokio::fs::write(&tmp, &body).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(BackendError::Io(e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, self.path(id)).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(BackendError::Io(e));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "local"
    }
}
