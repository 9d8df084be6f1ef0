//! Error taxonomy shared by every component
//!
//! Validation failures are raised before any network call. Remote failures carry a
//! [`TransportError`] and leave in-memory state untouched. Nothing here is fatal to
//! the process: each error belongs to the request that triggered it.

use crate::sync::TransportError;

/// Component errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Client-side validation failed; no request was issued
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Keyed operation targeted an `equipment_id` the service does not know
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Create collided with an existing `equipment_id`
    #[error("Equipment ID {0} already exists")]
    DuplicateKey(String),

    /// Network or server failure
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Persisted prediction history could not be decoded
    #[error("Malformed persisted state: {0}")]
    MalformedPersistedState(String),

    /// Reading or writing local storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Encoding local state failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether retrying the same action could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Storage(_))
    }
}

/// Result type for component operations
pub type Result<T> = std::result::Result<T, Error>;
