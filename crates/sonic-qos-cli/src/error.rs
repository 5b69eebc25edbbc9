//! Error types for the QoS CLI.

use std::path::PathBuf;

use sonic_config_sync::SyncError;
use sonic_db_common::DbError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Exit code for rejected input and unconfirmed changes.
pub const EXIT_USAGE: u8 = 2;

/// Exit code for database and bootstrap failures.
pub const EXIT_FAILURE: u8 = 1;

/// Errors reported to the operator.
#[derive(Debug, Error)]
pub enum CliError {
    /// The command was rejected before anything was written.
    #[error("{0}")]
    Invalid(String),

    /// The coordinated commit failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Database access failed.
    #[error(transparent)]
    Database(#[from] DbError),

    /// The SONiC version file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    VersionFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The SONiC version file is not valid YAML.
    #[error("Failed to parse {}: {source}", path.display())]
    VersionParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl CliError {
    /// Creates a validation error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Invalid(_) => EXIT_USAGE,
            CliError::Sync(SyncError::Database(_)) => EXIT_FAILURE,
            CliError::Sync(_) => EXIT_USAGE,
            CliError::Database(_) | CliError::VersionFile { .. } | CliError::VersionParse { .. } => {
                EXIT_FAILURE
            }
        }
    }
}
