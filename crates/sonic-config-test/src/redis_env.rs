//! Redis test environment
//!
//! Starts a containerized Redis with keyspace notifications enabled, so the
//! Redis-backed CONFIG_DB and STATE_DB stores can be exercised end to end.

use std::collections::HashMap;
use std::time::Duration;

use redis::{AsyncCommands, Client};
use sonic_db_common::{DbId, RedisConfig, RedisConfigDb, RedisStateDb};
use testcontainers::{
    core::{ContainerPort, WaitFor},
    runners::AsyncRunner,
    GenericImage,
};

/// Redis test environment with containerized Redis instance
pub struct RedisTestEnv {
    _container: testcontainers::ContainerAsync<GenericImage>,
    pub client: Client,
    pub host: String,
    pub port: u16,
}

impl RedisTestEnv {
    /// Start a new Redis container for testing
    ///
    /// Keyspace notifications are switched on for every event class before
    /// the environment is returned.
    ///
    /// # Errors
    /// Returns error if container fails to start or client connection fails
    pub async fn start() -> Result<Self, Box<dyn std::error::Error>> {
        let container = GenericImage::new("redis", "7-alpine")
            .with_exposed_port(ContainerPort::Tcp(6379))
            .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
            .start()
            .await?;

        let host = container.get_host().await?.to_string();
        let port = container.get_host_port_ipv4(6379).await?;

        let client = Client::open(format!("redis://{}:{}", host, port).as_str())?;

        for _ in 0..5 {
            match client.get_connection_with_timeout(Duration::from_secs(1)) {
                Ok(_) => break,
                Err(_) => tokio::time::sleep(Duration::from_millis(200)).await,
            }
        }

        let env = Self {
            _container: container,
            client,
            host,
            port,
        };

        let mut conn = env.get_async_connection().await?;
        redis::cmd("CONFIG")
            .arg("SET")
            .arg("notify-keyspace-events")
            .arg("KEA")
            .query_async::<()>(&mut conn)
            .await?;

        Ok(env)
    }

    /// Connection settings for CONFIG_DB inside the container
    pub fn config_db_config(&self) -> RedisConfig {
        RedisConfig::new(self.host.clone(), self.port, DbId::ConfigDb)
    }

    /// Connection settings for STATE_DB inside the container
    pub fn state_db_config(&self) -> RedisConfig {
        RedisConfig::new(self.host.clone(), self.port, DbId::StateDb)
    }

    /// Connect a CONFIG_DB store to the container
    pub async fn connect_config_db(&self) -> sonic_db_common::DbResult<RedisConfigDb> {
        RedisConfigDb::connect(self.config_db_config()).await
    }

    /// Connect a STATE_DB store to the container
    pub async fn connect_state_db(&self) -> sonic_db_common::DbResult<RedisStateDb> {
        RedisStateDb::connect(self.state_db_config()).await
    }

    /// Get an async Redis connection to database `db`
    ///
    /// # Errors
    /// Returns error if connection fails
    pub async fn get_db_connection(
        &self,
        db: DbId,
    ) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        let uri = format!("redis://{}:{}/{}", self.host, self.port, db.default_index());
        Client::open(uri.as_str())?
            .get_multiplexed_tokio_connection()
            .await
    }

    /// Get an async Redis connection to database 0
    ///
    /// # Errors
    /// Returns error if connection fails
    pub async fn get_async_connection(
        &self,
    ) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_tokio_connection().await
    }

    /// Flush all keys from all databases
    ///
    /// # Errors
    /// Returns error if FLUSHALL command fails
    pub async fn flush_all(&self) -> Result<(), redis::RedisError> {
        let mut conn = self.get_async_connection().await?;
        redis::cmd("FLUSHALL").query_async::<()>(&mut conn).await?;
        Ok(())
    }

    /// Set hash fields on `key` in database `db`
    ///
    /// # Errors
    /// Returns error if HSET command fails
    pub async fn hset(
        &self,
        db: DbId,
        key: &str,
        fields: &[(&str, &str)],
    ) -> Result<(), redis::RedisError> {
        let mut conn = self.get_db_connection(db).await?;
        conn.hset_multiple(key, fields).await
    }

    /// Get all hash fields and values of `key` in database `db`
    ///
    /// # Errors
    /// Returns error if HGETALL command fails
    pub async fn hgetall(
        &self,
        db: DbId,
        key: &str,
    ) -> Result<HashMap<String, String>, redis::RedisError> {
        let mut conn = self.get_db_connection(db).await?;
        conn.hgetall(key).await
    }

    /// Check if `key` exists in database `db`
    ///
    /// # Errors
    /// Returns error if EXISTS command fails
    pub async fn exists(&self, db: DbId, key: &str) -> Result<bool, redis::RedisError> {
        let mut conn = self.get_db_connection(db).await?;
        conn.exists(key).await
    }
}

// Container is automatically stopped and removed when RedisTestEnv is dropped
