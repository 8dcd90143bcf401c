//! Request failures and their HTTP mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use joyplay_sandbox::SandboxError;
use joyplay_store::StoreError;
use thiserror::Error;
use tracing::{debug, error};

/// Body sent for every infrastructure failure; details stay in the log
const OPAQUE_ERROR: &str = "Server error.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("error decoding request: {0}")]
    BadRequest(String),

    /// The snippet exists but does not translate
    #[error("error trying to compile code: {0}")]
    Build(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Build(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::InvalidId(_)) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Sandbox(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the client
    fn client_message(&self) -> String {
        match self {
            ApiError::Store(StoreError::InvalidId(_)) => "Unexpected id format.".to_string(),
            ApiError::Store(StoreError::NotFound { .. }) => "Snippet not found.".to_string(),
            ApiError::Store(e @ StoreError::TooLarge { .. }) => e.to_string(),
            ApiError::BadRequest(_) | ApiError::Build(_) => self.to_string(),
            ApiError::Store(_) | ApiError::Sandbox(_) => OPAQUE_ERROR.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            debug!(status = status.as_u16(), reason = %self, "Request rejected");
        }
        (status, self.client_message()).into_response()
    }
}
