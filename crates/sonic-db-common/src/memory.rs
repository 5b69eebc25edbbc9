//! In-process CONFIG_DB and STATE_DB.
//!
//! These stores honour the same contracts as the Redis backend and are
//! used to exercise configuration logic without a database. STATE_DB
//! writes publish keyspace events shaped exactly like the ones Redis
//! emits, so subscribers cannot tell the difference.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::db::DbId;
use crate::error::{DbError, DbResult};
use crate::fields::{table_key, FieldMap};
use crate::keyspace::KeyspaceEvent;
use crate::store::{ConfigDb, KeyspaceSubscription, StateDb};

/// Keyspace events buffered per subscriber before it lags.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

type Tables = BTreeMap<String, BTreeMap<String, FieldMap>>;

fn read_entry(tables: &Tables, table: &str, key: &str) -> FieldMap {
    tables
        .get(table)
        .and_then(|entries| entries.get(key))
        .cloned()
        .unwrap_or_default()
}

/// Stores `value` at `table|key`, removing the entry when `value` is empty.
fn write_entry(tables: &mut Tables, table: &str, key: &str, value: FieldMap) {
    if value.is_empty() {
        if let Some(entries) = tables.get_mut(table) {
            entries.remove(key);
            if entries.is_empty() {
                tables.remove(table);
            }
        }
    } else {
        tables
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }
}

/// Observer notified after every CONFIG_DB write.
///
/// This is how simulated switch agents watch configuration changes.
pub trait ConfigObserver: Send + Sync {
    /// Called with the resulting entry; an empty map means it was deleted.
    fn on_write(&self, table: &str, key: &str, value: &FieldMap);
}

/// In-memory CONFIG_DB.
#[derive(Default)]
pub struct MemoryConfigDb {
    tables: Mutex<Tables>,
    observers: Mutex<Vec<Arc<dyn ConfigObserver>>>,
    writes: AtomicUsize,
}

impl MemoryConfigDb {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer for subsequent writes.
    pub fn add_observer(&self, observer: Arc<dyn ConfigObserver>) {
        self.observers.lock().push(observer);
    }

    /// Returns the number of mutating calls made so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Returns a copy of `table|key` without going through the async API.
    pub fn snapshot(&self, table: &str, key: &str) -> FieldMap {
        read_entry(&self.tables.lock(), table, key)
    }

    /// Seeds an entry without counting a write or notifying observers.
    pub fn seed(&self, table: &str, key: &str, value: FieldMap) {
        write_entry(&mut self.tables.lock(), table, key, value);
    }

    fn apply(&self, table: &str, key: &str, update: impl FnOnce(FieldMap) -> FieldMap) {
        let result = {
            let mut tables = self.tables.lock();
            let result = update(read_entry(&tables, table, key));
            write_entry(&mut tables, table, key, result.clone());
            result
        };
        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!(key = %table_key(table, key), fields = result.len(), "CONFIG_DB write");

        // Observers run outside the table lock so they may read back.
        let observers = self.observers.lock().clone();
        for observer in observers {
            observer.on_write(table, key, &result);
        }
    }
}

#[async_trait]
impl ConfigDb for MemoryConfigDb {
    async fn get_entry(&self, table: &str, key: &str) -> DbResult<FieldMap> {
        Ok(self.snapshot(table, key))
    }

    async fn set_entry(&self, table: &str, key: &str, value: Option<&FieldMap>) -> DbResult<()> {
        let value = value.cloned().unwrap_or_default();
        self.apply(table, key, |_| value);
        Ok(())
    }

    async fn mod_entry(&self, table: &str, key: &str, value: &FieldMap) -> DbResult<()> {
        if value.is_empty() {
            return Ok(());
        }
        self.apply(table, key, |mut current| {
            current.extend(value.iter().map(|(f, v)| (f.clone(), v.clone())));
            current
        });
        Ok(())
    }

    async fn get_table(&self, table: &str) -> DbResult<BTreeMap<String, FieldMap>> {
        Ok(self.tables.lock().get(table).cloned().unwrap_or_default())
    }
}

/// In-memory STATE_DB with keyspace notifications.
pub struct MemoryStateDb {
    db_index: i64,
    tables: Mutex<Tables>,
    events: broadcast::Sender<KeyspaceEvent>,
    opened: AtomicUsize,
    active: Arc<AtomicUsize>,
}

impl Default for MemoryStateDb {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStateDb {
    /// Creates an empty database using the default STATE_DB index.
    pub fn new() -> Self {
        Self::with_db_index(DbId::StateDb.default_index())
    }

    /// Creates an empty database publishing events for `db_index`.
    pub fn with_db_index(db_index: i64) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            db_index,
            tables: Mutex::new(Tables::new()),
            events,
            opened: AtomicUsize::new(0),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Writes `table|key` and publishes the matching keyspace event.
    ///
    /// An empty map deletes the entry and publishes `del`.
    pub fn set_entry(&self, table: &str, key: &str, value: FieldMap) {
        let operation = if value.is_empty() { "del" } else { "hset" };
        write_entry(&mut self.tables.lock(), table, key, value);
        self.publish(&table_key(table, key), operation);
    }

    /// Publishes a keyspace event for an arbitrary Redis key.
    pub fn publish(&self, redis_key: &str, operation: &str) {
        let event = KeyspaceEvent::for_key(self.db_index, redis_key, operation);
        debug!(channel = %event.channel, "STATE_DB notification");
        // No receivers simply means nobody is listening.
        let _ = self.events.send(event);
    }

    /// Publishes an event on a raw channel name.
    pub fn publish_raw(&self, channel: &str, operation: &str) {
        let _ = self.events.send(KeyspaceEvent::new(channel, operation));
    }

    /// Number of subscriptions ever opened.
    pub fn subscriptions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of subscriptions not yet released.
    pub fn active_subscriptions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateDb for MemoryStateDb {
    async fn get_entry(&self, table: &str, key: &str) -> DbResult<FieldMap> {
        Ok(read_entry(&self.tables.lock(), table, key))
    }

    async fn subscribe(&self) -> DbResult<Box<dyn KeyspaceSubscription>> {
        let receiver = self.events.subscribe();
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MemorySubscription {
            receiver,
            active: Some(self.active.clone()),
        }))
    }
}

/// Subscription handed out by [`MemoryStateDb`].
struct MemorySubscription {
    receiver: broadcast::Receiver<KeyspaceEvent>,
    active: Option<Arc<AtomicUsize>>,
}

impl MemorySubscription {
    fn release(&mut self) {
        if let Some(active) = self.active.take() {
            active.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MemorySubscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[async_trait]
impl KeyspaceSubscription for MemorySubscription {
    async fn next_event(&mut self) -> DbResult<KeyspaceEvent> {
        if self.active.is_none() {
            return Err(DbError::SubscriptionClosed);
        }

        loop {
            match self.receiver.recv().await {
                Ok(event) => return Ok(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Keyspace subscriber lagged, {} events dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(DbError::SubscriptionClosed)
                }
            }
        }
    }

    async fn unsubscribe(&mut self) -> DbResult<()> {
        self.release();
        Ok(())
    }
}
