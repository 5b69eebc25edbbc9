//! Test fixtures for QoS configuration
//!
//! Provides reusable CONFIG_DB contents for QoS map and port tests

use sonic_db_common::{table_key, FieldMap, MemoryConfigDb};

/// CONFIG_DB tables touched by the QoS tools
pub mod tables {
    /// 802.1p to traffic class maps
    pub const DOT1P_TO_TC_MAP: &str = "DOT1P_TO_TC_MAP";
    /// DSCP to traffic class maps
    pub const DSCP_TO_TC_MAP: &str = "DSCP_TO_TC_MAP";
    /// Traffic class to priority group maps
    pub const TC_TO_PRIORITY_GROUP_MAP: &str = "TC_TO_PRIORITY_GROUP_MAP";
    /// Traffic class to queue maps
    pub const TC_TO_QUEUE_MAP: &str = "TC_TO_QUEUE_MAP";
    /// STATE_DB table where the agent confirms TC to queue maps
    pub const QOS_TC_TO_QUEUE_MAP_TABLE: &str = "QOS_TC_TO_QUEUE_MAP_TABLE";
    /// Per-port map bindings
    pub const PORT_QOS_MAP: &str = "PORT_QOS_MAP";
    /// Front panel ports
    pub const PORT: &str = "PORT";
}

/// Represents a CONFIG_DB entry to seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    /// Table name (e.g., "PORT", "TC_TO_QUEUE_MAP")
    pub table: String,
    /// Key within the table
    pub key: String,
    /// Field-value pairs
    pub fields: FieldMap,
}

impl ConfigEntry {
    /// Create an entry with no fields
    pub fn new(table: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key: key.into(),
            fields: FieldMap::new(),
        }
    }

    /// Add a field
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Add multiple fields
    pub fn with_fields<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in fields {
            self.fields.insert(k.into(), v.into());
        }
        self
    }

    /// Get the Redis key for CONFIG_DB
    pub fn config_db_key(&self) -> String {
        table_key(&self.table, &self.key)
    }

    /// Seed this entry into an in-memory CONFIG_DB
    pub fn seed(&self, config_db: &MemoryConfigDb) {
        config_db.seed(&self.table, &self.key, self.fields.clone());
    }
}

/// Seed several entries into an in-memory CONFIG_DB
pub fn seed_all(config_db: &MemoryConfigDb, entries: &[ConfigEntry]) {
    for entry in entries {
        entry.seed(config_db);
    }
}

/// Common QoS map fixtures
pub mod qos_fixtures {
    use super::*;

    /// Identity TC to queue map for TCs 0-7
    pub fn tc_to_queue_identity(profile: &str) -> ConfigEntry {
        ConfigEntry::new(tables::TC_TO_QUEUE_MAP, profile)
            .with_fields((0..8).map(|tc| (tc.to_string(), tc.to_string())))
    }

    /// 802.1p to TC map with every priority in TC 0
    pub fn dot1p_to_tc_flat(profile: &str) -> ConfigEntry {
        ConfigEntry::new(tables::DOT1P_TO_TC_MAP, profile)
            .with_fields((0..8).map(|p| (p.to_string(), "0")))
    }

    /// DSCP to TC map grouping DSCP values by their class selector
    pub fn dscp_to_tc_class_selector(profile: &str) -> ConfigEntry {
        ConfigEntry::new(tables::DSCP_TO_TC_MAP, profile)
            .with_fields((0..64).map(|dscp| (dscp.to_string(), (dscp / 8).to_string())))
    }

    /// TC to priority group map with TC 3 and 4 lossless
    pub fn tc_to_pg_lossless(profile: &str) -> ConfigEntry {
        ConfigEntry::new(tables::TC_TO_PRIORITY_GROUP_MAP, profile)
            .with_fields((0..8).map(|tc| {
                let pg = if tc == 3 || tc == 4 { tc } else { 0 };
                (tc.to_string(), pg.to_string())
            }))
    }
}

/// Common port fixtures
pub mod port_fixtures {
    use super::*;

    /// Standard Ethernet port
    pub fn ethernet_port(port_name: &str) -> ConfigEntry {
        ConfigEntry::new(tables::PORT, port_name)
            .with_field("mtu", "9100")
            .with_field("admin_status", "up")
            .with_field("speed", "100000")
    }

    /// Ports Ethernet0, Ethernet4, ... for `count` ports
    pub fn ethernet_ports(count: usize) -> Vec<ConfigEntry> {
        (0..count)
            .map(|i| ethernet_port(&format!("Ethernet{}", i * 4)))
            .collect()
    }

    /// Map binding on a port
    pub fn port_qos_binding(port_name: &str, field: &str, profile: &str) -> ConfigEntry {
        ConfigEntry::new(tables::PORT_QOS_MAP, port_name).with_field(field, profile)
    }
}
