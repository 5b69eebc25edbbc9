//! Error types for synchronous configuration.

use sonic_db_common::DbError;
use thiserror::Error;

/// Result type alias for synchronous configuration.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while committing configuration.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Create attempted on a key that already holds an entry.
    #[error("The key \"{key}\" already exists in the table \"{table}\".")]
    AlreadyExists {
        /// The table name.
        table: String,
        /// The key.
        key: String,
    },

    /// The entry a caller needs is missing.
    #[error("The key \"{key}\" does not exist in the table \"{table}\".")]
    NotFound {
        /// The table name.
        table: String,
        /// The key.
        key: String,
    },

    /// The agent did not confirm the change. The reason is the agent's
    /// message, the generic failure text, or `Timeout`.
    #[error("{reason}")]
    ConfigurationFailed {
        /// Operator-facing reason.
        reason: String,
    },

    /// Store access failed.
    #[error(transparent)]
    Database(#[from] DbError),

    /// The writer task did not complete.
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl SyncError {
    /// Creates an already-exists error.
    pub fn already_exists(table: impl Into<String>, key: impl Into<String>) -> Self {
        Self::AlreadyExists {
            table: table.into(),
            key: key.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(table: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            table: table.into(),
            key: key.into(),
        }
    }

    /// Creates a configuration failure.
    pub fn configuration_failed(reason: impl Into<String>) -> Self {
        Self::ConfigurationFailed {
            reason: reason.into(),
        }
    }

    /// Returns true if the failure was a missed deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SyncError::ConfigurationFailed { reason } if reason == crate::TIMEOUT_REASON)
    }
}
