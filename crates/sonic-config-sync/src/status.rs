//! Status records published by switch agents in STATE_DB.

use sonic_db_common::{FieldMap, FieldMapExt};

/// Field holding the processing status.
pub const STATUS_FIELD: &str = "status";

/// Field holding the failure reason.
pub const MESSAGE_FIELD: &str = "message";

/// Status value for an applied change.
pub const STATUS_SUCCESS: &str = "SUCCESS";

/// Status value for a rejected change.
pub const STATUS_FAILURE: &str = "FAILURE";

/// Reason reported when the agent fails without a message.
pub const DEFAULT_FAILURE_REASON: &str = "Configuration failed";

/// Reason reported when no terminal status arrives before the deadline.
pub const TIMEOUT_REASON: &str = "Timeout";

/// Interpretation of a status record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// The agent applied the change.
    Success,
    /// The agent rejected the change.
    Failure(String),
    /// Anything else, including a missing record.
    Pending,
}

impl SyncStatus {
    /// Reads the status out of a STATE_DB record.
    pub fn from_record(record: &FieldMap) -> Self {
        match record.get_field(STATUS_FIELD) {
            Some(STATUS_SUCCESS) => SyncStatus::Success,
            Some(STATUS_FAILURE) => SyncStatus::Failure(
                record
                    .get_field(MESSAGE_FIELD)
                    .filter(|message| !message.is_empty())
                    .unwrap_or(DEFAULT_FAILURE_REASON)
                    .to_string(),
            ),
            _ => SyncStatus::Pending,
        }
    }

    /// Returns true for SUCCESS and FAILURE.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SyncStatus::Pending)
    }
}
