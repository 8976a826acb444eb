//! Error types for authentication.

use restpipe_http::HttpError;
use restpipe_pipeline::PipeError;
use thiserror::Error;

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur while building or issuing auth requests.
#[derive(Debug, Error)]
pub enum AuthError {
    /// An endpoint could not be resolved against the base URL.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Network or HTTP failure.
    #[error("transport error: {0}")]
    Transport(#[from] HttpError),

    /// Request body could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<AuthError> for PipeError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Config(message) => PipeError::Config(message),
            AuthError::Transport(e) => PipeError::Transport(e),
            AuthError::Serialization(e) => PipeError::Serialization(e),
        }
    }
}
