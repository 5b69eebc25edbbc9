//! SONiC QoS map configuration CLI.
//!
//! Manages DOT1P_TO_TC_MAP, DSCP_TO_TC_MAP, TC_TO_PRIORITY_GROUP_MAP and
//! TC_TO_QUEUE_MAP profiles and their per-port bindings in PORT_QOS_MAP.
//! TC to queue changes are confirmed by the switch agent through STATE_DB
//! and rolled back when they are not.

pub mod cli;
pub mod config_cmds;
pub mod error;
pub mod format;
pub mod map_values;
pub mod platform;
pub mod show;
pub mod tables;

pub use cli::{execute, Cli, Command, GlobalArgs};
pub use config_cmds::{BindOp, QosConfig};
pub use error::{CliError, CliResult, EXIT_FAILURE, EXIT_USAGE};
pub use platform::PlatformInfo;
pub use tables::QosMapKind;
