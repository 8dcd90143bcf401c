//! Error types for snippet storage

use thiserror::Error;

/// Failure of a single backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("snippet not found")]
    NotFound,

    #[error("backend is read-only")]
    ReadOnly,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid upstream url: {0}")]
    Url(#[from] url::ParseError),

    #[error("upstream returned unexpected status code {0}")]
    UnexpectedStatus(u16),

    #[error("object store error: {0}")]
    ObjectStore(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unexpected id format: {0}")]
    InvalidId(String),

    /// Every tier was consulted; `last` is the final tier's error
    #[error("snippet {id} not found (last tier {tier}: {last})")]
    NotFound {
        id: String,
        tier: String,
        #[source]
        last: BackendError,
    },

    #[error("snippet is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("{backend} backend error: {source}")]
    Backend {
        backend: String,
        #[source]
        source: BackendError,
    },

    #[error("invalid store configuration: {0}")]
    Config(String),
}

impl StoreError {
    /// Errors caused by the request rather than by the service
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidId(_) | StoreError::NotFound { .. } | StoreError::TooLarge { .. }
        )
    }
}
