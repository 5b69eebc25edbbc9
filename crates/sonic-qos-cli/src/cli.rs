//! Command line definition and dispatch.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sonic_config_sync::{SyncConfig, SyncConfigurator, MAX_SYNC_CONFIG_TIMEOUT};
use sonic_db_common::{DbId, RedisConfig, RedisConfigDb, RedisStateDb};
use tracing::debug;

use crate::config_cmds::{BindOp, QosConfig};
use crate::error::CliResult;
use crate::platform::PlatformInfo;
use crate::show::{show_interfaces_qos, show_qos_map};
use crate::tables::QosMapKind;

/// SONiC QoS map configuration
#[derive(Parser, Debug)]
#[command(name = "qoscfg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection and tuning options shared by all commands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Redis server host
    #[arg(long, default_value = "127.0.0.1", global = true)]
    pub redis_host: String,

    /// Redis server port
    #[arg(long, default_value = "6379", global = true)]
    pub redis_port: u16,

    /// Redis database index for CONFIG_DB
    #[arg(long, default_value = "4", global = true)]
    pub config_db: i64,

    /// Redis database index for STATE_DB
    #[arg(long, default_value = "6", global = true)]
    pub state_db: i64,

    /// Seconds to wait for the switch to confirm a change (1-3600)
    #[arg(
        long,
        default_value = "10",
        global = true,
        value_parser = clap::value_parser!(u64).range(1..=MAX_SYNC_CONFIG_TIMEOUT.as_secs())
    )]
    pub timeout: u64,

    /// Milliseconds between deadline checks while waiting
    #[arg(long, default_value = "1000", global = true)]
    pub poll_interval_ms: u64,

    /// SONiC version file providing the ASIC type
    #[arg(long, global = true)]
    pub version_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "warn", global = true)]
    pub log_level: String,
}

impl GlobalArgs {
    /// Coordinator timing.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::default()
            .with_timeout(Duration::from_secs(self.timeout))
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
    }

    /// CONFIG_DB connection settings.
    pub fn config_db_redis(&self) -> RedisConfig {
        RedisConfig::new(self.redis_host.clone(), self.redis_port, DbId::ConfigDb)
            .with_db_index(self.config_db)
    }

    /// STATE_DB connection settings.
    pub fn state_db_redis(&self) -> RedisConfig {
        RedisConfig::new(self.redis_host.clone(), self.redis_port, DbId::StateDb)
            .with_db_index(self.state_db)
    }

    /// Connects to both databases and loads the platform information.
    pub async fn connect(&self) -> CliResult<QosConfig> {
        let platform = PlatformInfo::load(&PlatformInfo::resolve_path(
            self.version_file.as_deref(),
        ))?;
        debug!(asic_type = platform.asic_type(), "Platform loaded");

        let config_db = Arc::new(RedisConfigDb::connect(self.config_db_redis()).await?);
        let state_db = Arc::new(RedisStateDb::connect(self.state_db_redis()).await?);

        let sync = SyncConfigurator::new(config_db.clone(), state_db)
            .with_config(self.sync_config());
        Ok(QosConfig::new(config_db, sync, platform))
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Modify configuration
    Config {
        #[command(subcommand)]
        target: ConfigTarget,
    },
    /// Show configuration
    Show {
        #[command(subcommand)]
        target: ShowTarget,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigTarget {
    /// Configure QoS map profiles
    Qos {
        #[command(subcommand)]
        map: QosMapCommand,
    },
    /// Configure interfaces
    Interface {
        #[command(subcommand)]
        target: InterfaceTarget,
    },
}

#[derive(Subcommand, Debug)]
pub enum InterfaceTarget {
    /// Set interface QoS configuration
    Qos(InterfaceQosArgs),
}

/// `config interface qos <kind> {bind|unbind} <interface> [profile]`
#[derive(Args, Debug)]
pub struct InterfaceQosArgs {
    /// Map kind
    #[arg(value_enum)]
    pub kind: MapKindArg,

    /// Operation
    #[arg(value_enum)]
    pub op: BindOpArg,

    /// Interface name; tc-pg and tc-queue also accept `all`
    pub interface: String,

    /// Profile name (required for bind)
    pub profile: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ShowTarget {
    /// Show QoS map profiles
    Qos {
        /// Map kind
        #[arg(value_enum)]
        kind: MapKindArg,
        /// Profile name
        profile: Option<String>,
    },
    /// Show interface configuration
    Interfaces {
        #[command(subcommand)]
        target: ShowInterfacesTarget,
    },
}

#[derive(Subcommand, Debug)]
pub enum ShowInterfacesTarget {
    /// Show details of the QoS
    Qos {
        /// Interface name
        interface: Option<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKindArg {
    #[value(name = "dot1p-tc")]
    Dot1pTc,
    #[value(name = "dscp-tc")]
    DscpTc,
    #[value(name = "tc-pg")]
    TcPg,
    #[value(name = "tc-queue")]
    TcQueue,
}

impl From<MapKindArg> for QosMapKind {
    fn from(arg: MapKindArg) -> Self {
        match arg {
            MapKindArg::Dot1pTc => QosMapKind::Dot1pTc,
            MapKindArg::DscpTc => QosMapKind::DscpTc,
            MapKindArg::TcPg => QosMapKind::TcPg,
            MapKindArg::TcQueue => QosMapKind::TcQueue,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOpArg {
    Bind,
    Unbind,
}

impl From<BindOpArg> for BindOp {
    fn from(arg: BindOpArg) -> Self {
        match arg {
            BindOpArg::Bind => BindOp::Bind,
            BindOpArg::Unbind => BindOp::Unbind,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum QosMapCommand {
    /// Configure dot1p to TC mapping
    #[command(name = "dot1p-tc")]
    Dot1pTc {
        #[command(subcommand)]
        action: Dot1pTcAction,
    },
    /// Configure DSCP to TC mapping
    #[command(name = "dscp-tc")]
    DscpTc {
        #[command(subcommand)]
        action: DscpTcAction,
    },
    /// Configure TC to priority-group mapping
    #[command(name = "tc-pg")]
    TcPg {
        #[command(subcommand)]
        action: TcPgAction,
    },
    /// Configure TC to queue mapping
    #[command(name = "tc-queue")]
    TcQueue {
        #[command(subcommand)]
        action: TcQueueAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum Dot1pTcAction {
    /// Add dot1p-tc map profile
    Add {
        profile: String,
        /// Cos value
        #[arg(long)]
        dot1p: String,
        /// Traffic-class(TC) value
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=7))]
        tc: u8,
    },
    /// Update dot1p-tc map profile
    Update {
        profile: String,
        /// Cos value
        #[arg(long)]
        dot1p: String,
        /// Traffic-class(TC) value
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=7))]
        tc: Option<u8>,
        /// Delete the mapping entry
        #[arg(long)]
        remove: bool,
    },
    /// Delete dot1p-tc map profile
    Del { profile: String },
}

#[derive(Subcommand, Debug)]
pub enum DscpTcAction {
    /// Add dscp-tc map profile
    Add {
        profile: String,
        /// DSCP value
        #[arg(long)]
        dscp: String,
        /// Traffic-class(TC) value
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=7))]
        tc: u8,
    },
    /// Update dscp-tc map profile
    Update {
        profile: String,
        /// DSCP value
        #[arg(long)]
        dscp: String,
        /// Traffic-class(TC) value
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=7))]
        tc: Option<u8>,
        /// Delete the mapping entry
        #[arg(long)]
        remove: bool,
    },
    /// Delete dscp-tc map profile
    Del { profile: String },
}

#[derive(Subcommand, Debug)]
pub enum TcPgAction {
    /// Add tc-pg map profile
    Add {
        profile: String,
        /// Traffic-class(TC) value
        #[arg(long)]
        tc: String,
        /// Priority-group(PG) value
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=7))]
        pg: u8,
    },
    /// Update tc-pg map profile
    Update {
        profile: String,
        /// Traffic-class(TC) value
        #[arg(long)]
        tc: String,
        /// Priority-group(PG) value
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=7))]
        pg: Option<u8>,
        /// Delete the mapping entry
        #[arg(long)]
        remove: bool,
    },
    /// Delete tc-pg map profile
    Del { profile: String },
}

#[derive(Subcommand, Debug)]
pub enum TcQueueAction {
    /// Add tc-queue map profile
    Add {
        profile: String,
        /// Traffic-class(TC) value
        #[arg(long)]
        tc: String,
        /// Queue value
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=7))]
        queue: u8,
    },
    /// Update tc-queue map profile
    Update {
        profile: String,
        /// Traffic-class(TC) value
        #[arg(long)]
        tc: String,
        /// Queue value
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=7))]
        queue: Option<u8>,
        /// Delete the mapping entry
        #[arg(long)]
        remove: bool,
    },
    /// Delete tc-queue map profile
    Del { profile: String },
}

/// Kind-independent form of a `config qos` action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapAction {
    Add {
        profile: String,
        keys: String,
        value: u8,
    },
    Update {
        profile: String,
        keys: String,
        value: Option<u8>,
        remove: bool,
    },
    Del {
        profile: String,
    },
}

macro_rules! map_action {
    ($action:expr, $enum:ident, $key:ident, $value:ident) => {
        match $action {
            $enum::Add {
                profile,
                $key,
                $value,
            } => MapAction::Add {
                profile,
                keys: $key,
                value: $value,
            },
            $enum::Update {
                profile,
                $key,
                $value,
                remove,
            } => MapAction::Update {
                profile,
                keys: $key,
                value: $value,
                remove,
            },
            $enum::Del { profile } => MapAction::Del { profile },
        }
    };
}

impl QosMapCommand {
    /// Splits the command into its map kind and action.
    pub fn into_parts(self) -> (QosMapKind, MapAction) {
        match self {
            QosMapCommand::Dot1pTc { action } => (
                QosMapKind::Dot1pTc,
                map_action!(action, Dot1pTcAction, dot1p, tc),
            ),
            QosMapCommand::DscpTc { action } => (
                QosMapKind::DscpTc,
                map_action!(action, DscpTcAction, dscp, tc),
            ),
            QosMapCommand::TcPg { action } => {
                (QosMapKind::TcPg, map_action!(action, TcPgAction, tc, pg))
            }
            QosMapCommand::TcQueue { action } => (
                QosMapKind::TcQueue,
                map_action!(action, TcQueueAction, tc, queue),
            ),
        }
    }
}

/// Runs `command` and returns what should be printed on stdout.
pub async fn execute(command: Command, qos: &QosConfig) -> CliResult<String> {
    match command {
        Command::Config {
            target: ConfigTarget::Qos { map },
        } => {
            let (kind, action) = map.into_parts();
            match action {
                MapAction::Add {
                    profile,
                    keys,
                    value,
                } => qos.add_map(kind, &profile, &keys, value).await?,
                MapAction::Update {
                    profile,
                    keys,
                    value,
                    remove,
                } => qos.update_map(kind, &profile, &keys, value, remove).await?,
                MapAction::Del { profile } => qos.delete_map(kind, &profile).await?,
            }
            Ok(String::new())
        }
        Command::Config {
            target:
                ConfigTarget::Interface {
                    target: InterfaceTarget::Qos(args),
                },
        } => {
            qos.bind_interface(
                args.kind.into(),
                args.op.into(),
                &args.interface,
                args.profile.as_deref(),
            )
            .await?;
            Ok(String::new())
        }
        Command::Show {
            target: ShowTarget::Qos { kind, profile },
        } => show_qos_map(qos.config_db(), kind.into(), profile.as_deref()).await,
        Command::Show {
            target:
                ShowTarget::Interfaces {
                    target: ShowInterfacesTarget::Qos { interface },
                },
        } => show_interfaces_qos(qos.config_db(), interface.as_deref()).await,
    }
}
