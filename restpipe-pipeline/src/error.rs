//! Error types for the pipeline layer.

use restpipe_http::HttpError;
use std::sync::Arc;
use thiserror::Error;

/// Result type for pipe operations.
pub type PipeResult<T> = Result<T, PipeError>;

/// A captured failure, shareable between every subscriber of one request.
pub type SharedError = Arc<PipeError>;

/// The stored result of one execution.
pub type Outcome<T> = Result<T, SharedError>;

/// Errors that can occur in pipe operations.
#[derive(Debug, Error)]
pub enum PipeError {
    /// Invalid pipe configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Network or HTTP failure.
    #[error("transport error: {0}")]
    Transport(#[from] HttpError),

    /// Payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A handler rejected the operation.
    #[error("handler error: {0}")]
    Handler(String),

    /// The wrapped operation panicked.
    #[error("operation panicked: {0}")]
    Panicked(String),

    /// No tokio runtime was available to run the operation.
    #[error("no async runtime available")]
    NoRuntime,

    /// The operation was dropped before producing an outcome.
    #[error("operation abandoned before completion")]
    Abandoned,
}

/// Coarse classification of a [`PipeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad URLs or settings, detected at construction.
    Configuration,
    /// Failures surfaced by the network.
    Transport,
    /// Anything else raised while running a wrapped operation.
    Execution,
}

impl PipeError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipeError::Config(_) => ErrorKind::Configuration,
            PipeError::Transport(e) if e.is_configuration() => ErrorKind::Configuration,
            PipeError::Transport(_) => ErrorKind::Transport,
            _ => ErrorKind::Execution,
        }
    }

    /// The HTTP status behind this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            PipeError::Transport(e) => e.status(),
            _ => None,
        }
    }
}
