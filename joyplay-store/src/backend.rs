//! Backend trait and implementations

mod local;
mod memory;
#[cfg(feature = "s3")]
mod s3;
mod upstream;

use crate::error::BackendError;
use crate::id::SnippetId;
use async_trait::async_trait;
use bytes::Bytes;

pub use local::LocalBackend;
pub use memory::MemoryBackend;
#[cfg(feature = "s3")]
pub use s3::S3Backend;
pub use upstream::UpstreamBackend;

/// Uniform get/put over a single storage medium
#[async_trait]
pub trait SnippetBackend: Send + Sync {
    /// Fetch a snippet body; `BackendError::NotFound` when absent
    async fn get(&self, id: &SnippetId) -> Result<Bytes, BackendError>;

    /// Store a snippet body under `id`. Rewriting the same id is a no-op
    /// in effect, since ids are content hashes.
    async fn put(&self, id: &SnippetId, body: Bytes) -> Result<(), BackendError>;

    /// Get backend name (used in logs and errors)
    fn name(&self) -> &str;
}
