//! QoS map tables and their CONFIG_DB layout.

use std::fmt;

/// Port binding table; one entry per interface, one field per map kind.
pub const PORT_QOS_MAP: &str = "PORT_QOS_MAP";

/// Front panel port table.
pub const PORT: &str = "PORT";

/// `PORT_QOS_MAP` field holding the PFC-enabled priorities.
pub const PFC_ENABLE_FIELD: &str = "pfc_enable";

/// Largest traffic class, priority group or queue a map may point to.
pub const MAX_MAP_VALUE: u8 = 7;

/// `PORT_QOS_MAP` fields shown by `show interfaces qos`, in display order.
pub const INTERFACE_MAP_LABELS: &[(&str, &str)] = &[
    ("dot1p_to_tc_map", "Dot1p to TC"),
    ("dscp_to_tc_map", "DSCP to TC"),
    ("tc_to_pg_map", "TC to PG"),
    ("tc_to_queue_map", "TC to Queue"),
    ("pfc_to_queue_map", "PFC to Queue"),
    ("pfc_to_pg_map", "PFC to PG"),
];

/// QoS map kinds managed by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QosMapKind {
    /// 802.1p priority to traffic class.
    Dot1pTc,
    /// DSCP to traffic class.
    DscpTc,
    /// Traffic class to priority group.
    TcPg,
    /// Traffic class to egress queue.
    TcQueue,
}

impl QosMapKind {
    /// All kinds in CLI order.
    pub const ALL: [QosMapKind; 4] = [
        QosMapKind::Dot1pTc,
        QosMapKind::DscpTc,
        QosMapKind::TcPg,
        QosMapKind::TcQueue,
    ];

    /// CLI name of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            QosMapKind::Dot1pTc => "dot1p-tc",
            QosMapKind::DscpTc => "dscp-tc",
            QosMapKind::TcPg => "tc-pg",
            QosMapKind::TcQueue => "tc-queue",
        }
    }

    /// CONFIG_DB table holding the profiles.
    pub fn table(&self) -> &'static str {
        match self {
            QosMapKind::Dot1pTc => "DOT1P_TO_TC_MAP",
            QosMapKind::DscpTc => "DSCP_TO_TC_MAP",
            QosMapKind::TcPg => "TC_TO_PRIORITY_GROUP_MAP",
            QosMapKind::TcQueue => "TC_TO_QUEUE_MAP",
        }
    }

    /// Name of the map key, as used in option names and messages.
    pub fn key_name(&self) -> &'static str {
        match self {
            QosMapKind::Dot1pTc => "dot1p",
            QosMapKind::DscpTc => "dscp",
            QosMapKind::TcPg | QosMapKind::TcQueue => "tc",
        }
    }

    /// Name of the map value option.
    pub fn value_name(&self) -> &'static str {
        match self {
            QosMapKind::Dot1pTc | QosMapKind::DscpTc => "tc",
            QosMapKind::TcPg => "pg",
            QosMapKind::TcQueue => "queue",
        }
    }

    /// Exclusive upper bound of map keys.
    pub fn key_max(&self) -> u32 {
        match self {
            QosMapKind::DscpTc => 64,
            _ => 8,
        }
    }

    /// `PORT_QOS_MAP` field binding a profile of this kind.
    pub fn port_field(&self) -> &'static str {
        match self {
            QosMapKind::Dot1pTc => "dot1p_to_tc_map",
            QosMapKind::DscpTc => "dscp_to_tc_map",
            QosMapKind::TcPg => "tc_to_pg_map",
            QosMapKind::TcQueue => "tc_to_queue_map",
        }
    }

    /// STATE_DB table where the switch agent confirms profiles.
    ///
    /// Only kinds with a confirming agent are committed synchronously.
    pub fn state_table(&self) -> Option<&'static str> {
        match self {
            QosMapKind::TcQueue => Some("QOS_TC_TO_QUEUE_MAP_TABLE"),
            _ => None,
        }
    }

    /// Column headers for `show qos`.
    pub fn show_header(&self) -> [&'static str; 2] {
        match self {
            QosMapKind::Dot1pTc => ["Dot1p", "TC"],
            QosMapKind::DscpTc => ["DSCP", "TC"],
            QosMapKind::TcPg => ["TC", "PG"],
            QosMapKind::TcQueue => ["TC", "Queue"],
        }
    }

    /// Whether `all` may be given in place of an interface name.
    pub fn accepts_all_interfaces(&self) -> bool {
        matches!(self, QosMapKind::TcPg | QosMapKind::TcQueue)
    }
}

impl fmt::Display for QosMapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
