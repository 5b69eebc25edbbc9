//! Database clients shared by SONiC configuration tools.
//!
//! This crate provides the two store capabilities the configuration tools
//! rely on:
//!
//! - [`ConfigDb`]: table entry access for CONFIG_DB (get/set/mod/scan)
//! - [`StateDb`]: entry reads and keyspace notifications for STATE_DB
//!
//! Both are traits so callers receive them as injected collaborators. Two
//! backends are provided:
//!
//! - [`redis_backend`]: the real Redis databases (enabled by the `redis`
//!   feature, on by default)
//! - [`memory`]: in-process stores for tests and dry runs
//!
//! # Key layout
//!
//! Entries live in Redis hashes named `<TABLE>|<key>`. A keyspace
//! notification for such a hash arrives on the channel
//! `__keyspace@<db>__:<TABLE>|<key>` with the command name as payload.
//!
//! # Example
//!
//! ```ignore
//! use sonic_db_common::{ConfigDb, RedisConfig, RedisConfigDb};
//!
//! let config_db = RedisConfigDb::connect(RedisConfig::config_db("127.0.0.1", 6379)).await?;
//! let entry = config_db.get_entry("TC_TO_QUEUE_MAP", "AZURE").await?;
//! ```

pub mod db;
pub mod error;
pub mod fields;
pub mod keyspace;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis_backend;
pub mod store;

pub use db::{DbId, RedisConfig};
pub use error::{DbError, DbResult};
pub use fields::{raw_to_typed, table_key, FieldMap, FieldMapExt, TABLE_KEY_SEPARATOR};
pub use keyspace::{keyspace_pattern, KeyspaceEvent};
pub use memory::{ConfigObserver, MemoryConfigDb, MemoryStateDb};
#[cfg(feature = "redis")]
pub use redis_backend::{RedisConfigDb, RedisKeyspaceSubscription, RedisStateDb};
pub use store::{ConfigDb, KeyspaceSubscription, StateDb};
