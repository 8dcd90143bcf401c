//! Snippet store - content-addressed sharing with tiered resolution
//!
//! Snippet ids are derived from the body alone, using the same mapping as the
//! Go Playground, so ids minted upstream resolve here and vice versa.
//! Writes go to a single primary backend; reads walk an ordered list of
//! backends and stop at the first hit.

mod backend;
mod config;
mod error;
mod id;
mod store;

pub use backend::{LocalBackend, MemoryBackend, SnippetBackend, UpstreamBackend};
#[cfg(feature = "s3")]
pub use backend::S3Backend;
pub use config::{S3Config, StoreConfig, UpstreamConfig, DEFAULT_USER_AGENT};
pub use error::{BackendError, StoreError};
pub use id::{SnippetId, ID_LENGTH};
pub use store::SnippetStore;

pub type Result<T> = std::result::Result<T, StoreError>;
