//! Error types for local stores.

use crate::store::StoreType;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The factory cannot build stores of this type.
    #[error("unsupported store type: {0}")]
    UnsupportedType(StoreType),

    /// Records must be JSON objects.
    #[error("record is not a JSON object")]
    NotAnObject,

    /// The id field holds something other than a string or number.
    #[error("invalid record id in field {field:?}: {value}")]
    InvalidId { field: String, value: serde_json::Value },
}
