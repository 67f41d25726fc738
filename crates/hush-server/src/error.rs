//! Server error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur in the server core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// Configuration error (missing or invalid deployment settings).
    ///
    /// Fatal at startup. Fix the environment and restart.
    #[error("configuration error: {0}")]
    Config(String),

    /// Session token could not be issued or verified.
    #[error("session error: {0}")]
    Session(String),

    /// Underlying storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
