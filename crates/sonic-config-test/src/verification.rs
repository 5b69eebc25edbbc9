//! Verification helpers for testing configuration tools
//!
//! Assertions over any `ConfigDb`, so the same checks run against the
//! in-memory store and a live Redis.

use sonic_db_common::{ConfigDb, DbError, FieldMap};
use thiserror::Error;

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Expected entry '{table}|{key}' not found")]
    EntryNotFound { table: String, key: String },

    #[error("Entry '{table}|{key}' should not exist, found {actual:?}")]
    UnexpectedEntry {
        table: String,
        key: String,
        actual: FieldMap,
    },

    #[error("Expected field '{field}' not found in '{table}|{key}'")]
    FieldNotFound {
        table: String,
        key: String,
        field: String,
    },

    #[error("Value mismatch for {table}|{key}:{field}: expected '{expected}', got '{actual}'")]
    ValueMismatch {
        table: String,
        key: String,
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Entry mismatch for {table}|{key}: expected {expected:?}, got {actual:?}")]
    EntryMismatch {
        table: String,
        key: String,
        expected: FieldMap,
        actual: FieldMap,
    },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// CONFIG_DB verification helper
pub struct EntryVerifier<'a> {
    db: &'a dyn ConfigDb,
}

impl<'a> EntryVerifier<'a> {
    /// Create a new verifier over `db`
    pub fn new(db: &'a dyn ConfigDb) -> Self {
        Self { db }
    }

    /// Verify that an entry exists
    pub async fn assert_exists(&self, table: &str, key: &str) -> VerifyResult<FieldMap> {
        let actual = self.db.get_entry(table, key).await?;
        if actual.is_empty() {
            return Err(VerificationError::EntryNotFound {
                table: table.to_string(),
                key: key.to_string(),
            });
        }
        Ok(actual)
    }

    /// Verify that an entry does not exist
    pub async fn assert_absent(&self, table: &str, key: &str) -> VerifyResult<()> {
        let actual = self.db.get_entry(table, key).await?;
        if !actual.is_empty() {
            return Err(VerificationError::UnexpectedEntry {
                table: table.to_string(),
                key: key.to_string(),
                actual,
            });
        }
        Ok(())
    }

    /// Verify that an entry holds exactly `expected`
    pub async fn assert_entry_eq(
        &self,
        table: &str,
        key: &str,
        expected: &FieldMap,
    ) -> VerifyResult<()> {
        let actual = self.db.get_entry(table, key).await?;
        if &actual != expected {
            return Err(VerificationError::EntryMismatch {
                table: table.to_string(),
                key: key.to_string(),
                expected: expected.clone(),
                actual,
            });
        }
        Ok(())
    }

    /// Verify that a field has a specific value
    pub async fn assert_field_value(
        &self,
        table: &str,
        key: &str,
        field: &str,
        expected: &str,
    ) -> VerifyResult<()> {
        let actual = self.assert_exists(table, key).await?;

        match actual.get(field) {
            None => Err(VerificationError::FieldNotFound {
                table: table.to_string(),
                key: key.to_string(),
                field: field.to_string(),
            }),
            Some(value) if value == expected => Ok(()),
            Some(value) => Err(VerificationError::ValueMismatch {
                table: table.to_string(),
                key: key.to_string(),
                field: field.to_string(),
                expected: expected.to_string(),
                actual: value.clone(),
            }),
        }
    }
}
