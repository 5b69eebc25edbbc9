//! Database identifiers and connection settings.

/// SONiC databases used by the configuration tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbId {
    /// Configuration database (CONFIG_DB) - desired state.
    ConfigDb,
    /// State database (STATE_DB) - agent-reported results.
    StateDb,
}

impl DbId {
    /// Returns the database name as used in SONiC.
    pub fn name(&self) -> &'static str {
        match self {
            DbId::ConfigDb => "CONFIG_DB",
            DbId::StateDb => "STATE_DB",
        }
    }

    /// Returns the default Redis database index.
    pub fn default_index(&self) -> i64 {
        match self {
            DbId::ConfigDb => 4,
            DbId::StateDb => 6,
        }
    }
}

/// Configuration for a Redis connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    /// Redis server hostname or IP
    pub host: String,
    /// Redis server port
    pub port: u16,
    /// Which SONiC database this connection serves
    pub db: DbId,
    /// Redis database index
    pub db_index: i64,
}

impl RedisConfig {
    /// Creates a new Redis configuration using the database's default index.
    pub fn new(host: impl Into<String>, port: u16, db: DbId) -> Self {
        Self {
            host: host.into(),
            port,
            db,
            db_index: db.default_index(),
        }
    }

    /// Creates CONFIG_DB connection config.
    pub fn config_db(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, DbId::ConfigDb)
    }

    /// Creates STATE_DB connection config.
    pub fn state_db(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, DbId::StateDb)
    }

    /// Overrides the Redis database index.
    pub fn with_db_index(mut self, db_index: i64) -> Self {
        self.db_index = db_index;
        self
    }

    /// Returns the Redis connection URI.
    pub fn uri(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db_index)
    }
}
