//! Redis keyspace notification events.

use crate::fields::TABLE_KEY_SEPARATOR;

/// Returns the pattern that matches every keyspace notification of a
/// database: `__keyspace@<db>__:*`.
pub fn keyspace_pattern(db_index: i64) -> String {
    format!("__keyspace@{}__:*", db_index)
}

/// A keyspace notification.
///
/// The channel names the mutated key (`__keyspace@6__:TABLE|key`); the
/// payload names the command (`hset`, `del`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyspaceEvent {
    /// Notification channel
    pub channel: String,
    /// Command that mutated the key
    pub operation: String,
}

impl KeyspaceEvent {
    /// Creates an event from a raw channel and payload.
    pub fn new(channel: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            operation: operation.into(),
        }
    }

    /// Creates the event Redis publishes when `key` in `db_index` is mutated.
    pub fn for_key(db_index: i64, key: &str, operation: impl Into<String>) -> Self {
        Self::new(format!("__keyspace@{}__:{}", db_index, key), operation)
    }

    /// Returns the mutated key, i.e. everything after the first `:`.
    pub fn key(&self) -> Option<&str> {
        self.channel.split_once(':').map(|(_, key)| key)
    }

    /// Splits the mutated key into `(table, key)` at the first `|`.
    ///
    /// Returns `None` for keys that are not table formatted.
    pub fn table_key(&self) -> Option<(&str, &str)> {
        self.key()?.split_once(TABLE_KEY_SEPARATOR)
    }

    /// Returns true if this event concerns `table|key`.
    pub fn matches(&self, table: &str, key: &str) -> bool {
        self.table_key() == Some((table, key))
    }
}
