//! Error types for the transport layer.

use thiserror::Error;

/// Result type for transport operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// Errors that can occur while building or issuing HTTP requests.
#[derive(Debug, Error)]
pub enum HttpError {
    /// An endpoint could not be appended to a base URL.
    #[error("cannot append endpoint {endpoint:?} to base URL {base}")]
    Unresolvable { base: String, endpoint: String },

    /// URL failed to parse.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A default header name or value was rejected.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request could not be completed (connection, timeout, TLS).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl HttpError {
    /// Returns the HTTP status code, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            HttpError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true for errors raised while resolving configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            HttpError::Unresolvable { .. } | HttpError::InvalidUrl(_) | HttpError::InvalidHeader(_)
        )
    }

    /// Returns true if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, HttpError::Request(e) if e.is_timeout())
    }
}
