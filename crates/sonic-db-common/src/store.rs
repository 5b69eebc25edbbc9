//! Store capabilities used by configuration tools.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::DbResult;
use crate::fields::FieldMap;
use crate::keyspace::KeyspaceEvent;

/// Table access to the configuration database.
///
/// Single-key writes are atomic; nothing stronger is assumed.
#[async_trait]
pub trait ConfigDb: Send + Sync {
    /// Reads `table|key`. A missing entry reads as an empty map.
    async fn get_entry(&self, table: &str, key: &str) -> DbResult<FieldMap>;

    /// Replaces `table|key` with `value`.
    ///
    /// `None` or an empty map deletes the entry.
    async fn set_entry(&self, table: &str, key: &str, value: Option<&FieldMap>) -> DbResult<()>;

    /// Sets the given fields of `table|key`, keeping the others.
    async fn mod_entry(&self, table: &str, key: &str, value: &FieldMap) -> DbResult<()>;

    /// Reads every entry of `table`, keyed by entry key.
    async fn get_table(&self, table: &str) -> DbResult<BTreeMap<String, FieldMap>>;

    /// Lists the keys of `table`.
    async fn get_keys(&self, table: &str) -> DbResult<Vec<String>> {
        Ok(self.get_table(table).await?.into_keys().collect())
    }
}

/// Read access and change notifications for the state database.
#[async_trait]
pub trait StateDb: Send + Sync {
    /// Reads `table|key`. A missing entry reads as an empty map.
    async fn get_entry(&self, table: &str, key: &str) -> DbResult<FieldMap>;

    /// Subscribes to keyspace notifications for every key of the database.
    ///
    /// Returns only once the subscription is active: any mutation made
    /// after this call completes is delivered.
    async fn subscribe(&self) -> DbResult<Box<dyn KeyspaceSubscription>>;
}

/// An active keyspace notification subscription.
#[async_trait]
pub trait KeyspaceSubscription: Send {
    /// Waits for the next notification.
    ///
    /// Fails with [`DbError::SubscriptionClosed`](crate::DbError::SubscriptionClosed)
    /// once no more events can arrive.
    async fn next_event(&mut self) -> DbResult<KeyspaceEvent>;

    /// Releases the subscription. Calling it twice is a no-op.
    async fn unsubscribe(&mut self) -> DbResult<()>;
}
