//! Synchronous configuration for SONiC.
//!
//! CONFIG_DB is consumed asynchronously by switch agents. This crate gives
//! CLI tools a blocking, all-or-nothing view of a change:
//!
//! 1. Subscribe to STATE_DB keyspace notifications
//! 2. Write the entry to CONFIG_DB (only after the subscription is live)
//! 3. Wait for the agent's `SUCCESS` / `FAILURE` status record
//! 4. Roll back on failure or after the deadline (10 s by default)
//!
//! # Example
//!
//! ```ignore
//! use sonic_config_sync::{SyncConfigurator, FieldUpdate};
//!
//! let sync = SyncConfigurator::new(config_db, state_db);
//! sync.create("TC_TO_QUEUE_MAP", "AZURE", value, Some("QOS_TC_TO_QUEUE_MAP_TABLE")).await?;
//! ```

mod config;
mod coordinator;
mod error;
mod merge;
mod status;

pub use config::{SyncConfig, MAX_SYNC_CONFIG_TIMEOUT, SYNC_CONFIG_TIMEOUT, SYNC_POLL_INTERVAL};
pub use coordinator::SyncConfigurator;
pub use error::{SyncError, SyncResult};
pub use merge::{merge_fields, FieldUpdate, FieldUpdates};
pub use status::{
    SyncStatus, DEFAULT_FAILURE_REASON, MESSAGE_FIELD, STATUS_FAILURE, STATUS_FIELD,
    STATUS_SUCCESS, TIMEOUT_REASON,
};
