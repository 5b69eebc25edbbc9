//! Error types for database operations.

use thiserror::Error;

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors from CONFIG_DB / STATE_DB access.
#[derive(Debug, Error)]
pub enum DbError {
    /// Redis command or protocol error.
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Could not reach the database.
    #[error("Database connection error: {0}")]
    Connection(String),

    /// The keyspace subscription stopped delivering events.
    #[error("Keyspace subscription closed")]
    SubscriptionClosed,

    /// Stored data could not be interpreted.
    #[error("Invalid data format: {0}")]
    InvalidData(String),
}

impl DbError {
    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Returns true if the error came from the transport rather than from
    /// the data itself.
    pub fn is_transport(&self) -> bool {
        match self {
            #[cfg(feature = "redis")]
            DbError::Redis(_) => true,
            DbError::Connection(_) | DbError::SubscriptionClosed => true,
            DbError::InvalidData(_) => false,
        }
    }
}
