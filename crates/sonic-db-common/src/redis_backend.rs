//! Redis backend for CONFIG_DB and STATE_DB.
//!
//! Entries are Redis hashes named `<TABLE>|<key>`. STATE_DB notifications
//! rely on the server having keyspace events enabled
//! (`notify-keyspace-events` containing `K` and `h`), as SONiC configures
//! its database instances.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use redis::aio::{ConnectionManager, PubSub};
use redis::AsyncCommands;
use tokio_stream::StreamExt;
use tracing::{debug, info, instrument, warn};

use crate::db::RedisConfig;
use crate::error::{DbError, DbResult};
use crate::fields::{raw_to_typed, table_key, FieldMap, TABLE_KEY_SEPARATOR};
use crate::keyspace::{keyspace_pattern, KeyspaceEvent};
use crate::store::{ConfigDb, KeyspaceSubscription, StateDb};

/// Opens a client and a managed connection for `config`.
async fn open(config: &RedisConfig) -> DbResult<(redis::Client, ConnectionManager)> {
    let uri = config.uri();

    let client = redis::Client::open(uri.clone())
        .map_err(|e| DbError::connection(format!("{}: {}", uri, e)))?;

    let connection = client.get_connection_manager().await.map_err(|e| {
        DbError::connection(format!("Failed to create connection manager: {}", e))
    })?;

    info!(
        "Connected to {}: {} (db={})",
        config.db.name(),
        config.host,
        config.db_index
    );

    Ok((client, connection))
}

async fn hgetall(connection: &ConnectionManager, redis_key: &str) -> DbResult<FieldMap> {
    let mut conn = connection.clone();
    let raw: HashMap<String, String> = conn.hgetall(redis_key).await?;
    Ok(raw_to_typed(raw))
}

/// Returns the stored hash fields that `value` does not keep.
fn stale_fields<'a>(existing: &'a [String], value: &FieldMap) -> Vec<&'a str> {
    existing
        .iter()
        .filter(|field| !value.contains_key(field.as_str()))
        .map(String::as_str)
        .collect()
}

/// CONFIG_DB connection.
pub struct RedisConfigDb {
    config: RedisConfig,
    connection: ConnectionManager,
}

impl RedisConfigDb {
    /// Connects to the database described by `config`.
    pub async fn connect(config: RedisConfig) -> DbResult<Self> {
        let (_, connection) = open(&config).await?;
        Ok(Self { config, connection })
    }

    /// Returns the connection configuration.
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }
}

#[async_trait]
impl ConfigDb for RedisConfigDb {
    #[instrument(skip(self))]
    async fn get_entry(&self, table: &str, key: &str) -> DbResult<FieldMap> {
        hgetall(&self.connection, &table_key(table, key)).await
    }

    #[instrument(skip(self, value))]
    async fn set_entry(&self, table: &str, key: &str, value: Option<&FieldMap>) -> DbResult<()> {
        let redis_key = table_key(table, key);
        let mut conn = self.connection.clone();

        match value.filter(|fields| !fields.is_empty()) {
            None => {
                debug!(key = %redis_key, "Deleting entry");
                let _: () = conn.del(&redis_key).await?;
            }
            Some(fields) => {
                // No DEL on replace; consumers read a `del` event as removal.
                let existing: Vec<String> = conn.hkeys(&redis_key).await?;
                let stale = stale_fields(&existing, fields);
                debug!(
                    key = %redis_key,
                    count = fields.len(),
                    stale = stale.len(),
                    "Replacing entry"
                );

                let items: Vec<(&str, &str)> = fields
                    .iter()
                    .map(|(field, value)| (field.as_str(), value.as_str()))
                    .collect();

                let mut pipe = redis::pipe();
                pipe.atomic();
                pipe.hset_multiple(&redis_key, &items).ignore();
                if !stale.is_empty() {
                    pipe.hdel(&redis_key, &stale).ignore();
                }

                let _: () = pipe.query_async(&mut conn).await?;
            }
        }

        Ok(())
    }

    #[instrument(skip(self, value))]
    async fn mod_entry(&self, table: &str, key: &str, value: &FieldMap) -> DbResult<()> {
        if value.is_empty() {
            return Ok(());
        }

        let redis_key = table_key(table, key);
        let items: Vec<(&str, &str)> = value
            .iter()
            .map(|(field, value)| (field.as_str(), value.as_str()))
            .collect();

        let mut conn = self.connection.clone();
        let _: () = conn.hset_multiple(&redis_key, &items).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_table(&self, table: &str) -> DbResult<BTreeMap<String, FieldMap>> {
        let pattern = format!("{}{}*", table, TABLE_KEY_SEPARATOR);
        let prefix = format!("{}{}", table, TABLE_KEY_SEPARATOR);
        let mut conn = self.connection.clone();

        let keys: Vec<String> = conn.keys(&pattern).await?;

        let mut entries = BTreeMap::new();
        for redis_key in keys {
            let Some(key) = redis_key.strip_prefix(&prefix) else {
                continue;
            };

            let fields = hgetall(&self.connection, &redis_key).await?;
            if !fields.is_empty() {
                entries.insert(key.to_string(), fields);
            }
        }

        debug!("Read {} entries from table {}", entries.len(), table);
        Ok(entries)
    }
}

/// STATE_DB connection with keyspace notification support.
pub struct RedisStateDb {
    config: RedisConfig,
    client: redis::Client,
    connection: ConnectionManager,
}

impl RedisStateDb {
    /// Connects to the database described by `config`.
    pub async fn connect(config: RedisConfig) -> DbResult<Self> {
        let (client, connection) = open(&config).await?;
        Ok(Self {
            config,
            client,
            connection,
        })
    }

    /// Returns the connection configuration.
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }
}

#[async_trait]
impl StateDb for RedisStateDb {
    #[instrument(skip(self))]
    async fn get_entry(&self, table: &str, key: &str) -> DbResult<FieldMap> {
        hgetall(&self.connection, &table_key(table, key)).await
    }

    #[instrument(skip(self))]
    async fn subscribe(&self) -> DbResult<Box<dyn KeyspaceSubscription>> {
        let pattern = keyspace_pattern(self.config.db_index);

        let mut pubsub = self.client.get_async_pubsub().await?;
        // PSUBSCRIBE resolves once the server has acknowledged it.
        pubsub.psubscribe(&pattern).await?;

        debug!(pattern = %pattern, "Keyspace subscription active");
        Ok(Box::new(RedisKeyspaceSubscription {
            pubsub,
            pattern,
            active: true,
        }))
    }
}

/// Pattern subscription on a dedicated pub/sub connection.
pub struct RedisKeyspaceSubscription {
    pubsub: PubSub,
    pattern: String,
    active: bool,
}

impl RedisKeyspaceSubscription {
    /// Returns the subscribed pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

#[async_trait]
impl KeyspaceSubscription for RedisKeyspaceSubscription {
    async fn next_event(&mut self) -> DbResult<KeyspaceEvent> {
        if !self.active {
            return Err(DbError::SubscriptionClosed);
        }

        let stream = self.pubsub.on_message();
        tokio::pin!(stream);

        let msg = stream.next().await.ok_or(DbError::SubscriptionClosed)?;
        let operation: String = msg.get_payload().unwrap_or_else(|e| {
            warn!(channel = msg.get_channel_name(), "Undecodable payload: {}", e);
            String::new()
        });

        Ok(KeyspaceEvent::new(msg.get_channel_name(), operation))
    }

    async fn unsubscribe(&mut self) -> DbResult<()> {
        if !self.active {
            return Ok(());
        }

        self.active = false;
        self.pubsub.punsubscribe(&self.pattern).await?;
        debug!(pattern = %self.pattern, "Keyspace subscription released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_map;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stale_fields() {
        let existing = vec![
            "0".to_string(),
            "1".to_string(),
            "NULL".to_string(),
            "ports@".to_string(),
        ];
        let value = field_map! { "0" => "2", "3" => "3" };

        assert_eq!(stale_fields(&existing, &value), vec!["1", "NULL", "ports@"]);
        assert!(stale_fields(&[], &value).is_empty());
        assert!(stale_fields(&["0".to_string()], &value).is_empty());
    }
}
