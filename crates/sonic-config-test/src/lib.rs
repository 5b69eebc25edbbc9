//! Test infrastructure for SONiC synchronous configuration tools
//!
//! Provides:
//! - A simulated switch agent that answers CONFIG_DB writes with STATE_DB
//!   status records
//! - QoS map fixtures
//! - A containerized Redis with keyspace notifications enabled
//! - Entry verification helpers usable against any `ConfigDb`

pub mod agent;
pub mod fixtures;
mod redis_env;
mod verification;

pub use agent::{AgentResponse, SimulatedAgent};
pub use fixtures::*;
pub use redis_env::RedisTestEnv;
pub use verification::*;
