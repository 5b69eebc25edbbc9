//! `config qos` and `config interface qos` operations.
//!
//! Profiles of kinds with a confirming switch agent go through the
//! synchronous coordinator; the others are written to CONFIG_DB directly.

use std::sync::Arc;

use sonic_config_sync::{FieldUpdate, FieldUpdates, SyncConfigurator};
use sonic_db_common::{ConfigDb, FieldMap};
use tracing::{debug, info, instrument};

use crate::error::{CliError, CliResult};
use crate::format::natural_sort;
use crate::map_values::parse_map_keys;
use crate::platform::PlatformInfo;
use crate::tables::{QosMapKind, PORT, PORT_QOS_MAP};

/// Bind direction for `config interface qos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOp {
    /// Attach a profile to the interface.
    Bind,
    /// Detach the interface's profile of this kind.
    Unbind,
}

/// QoS map configuration against one CONFIG_DB.
pub struct QosConfig {
    config_db: Arc<dyn ConfigDb>,
    sync: SyncConfigurator,
    platform: PlatformInfo,
}

impl QosConfig {
    /// Creates the command context.
    pub fn new(config_db: Arc<dyn ConfigDb>, sync: SyncConfigurator, platform: PlatformInfo) -> Self {
        Self {
            config_db,
            sync,
            platform,
        }
    }

    /// CONFIG_DB the commands operate on.
    pub fn config_db(&self) -> &dyn ConfigDb {
        self.config_db.as_ref()
    }

    /// Platform the commands are validated against.
    pub fn platform(&self) -> &PlatformInfo {
        &self.platform
    }

    /// Adds a new profile mapping every key in `keys` to `value`.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn add_map(
        &self,
        kind: QosMapKind,
        profile: &str,
        keys: &str,
        value: u8,
    ) -> CliResult<()> {
        let table = kind.table();

        if kind == QosMapKind::TcQueue && self.platform.is_barefoot() {
            let existing = self.config_db.get_keys(table).await?;
            if !existing.is_empty() {
                return Err(CliError::invalid(
                    "Only one profile is supported on Intel platform.",
                ));
            }
        }

        if !self.config_db.get_entry(table, profile).await?.is_empty() {
            return Err(CliError::invalid(format!(
                "Profile '{}' already exists use update command.",
                profile
            )));
        }

        let value = value.to_string();
        let map: FieldMap = parse_map_keys(kind.key_name(), keys, kind.key_max())?
            .into_iter()
            .map(|key| (key, value.clone()))
            .collect();

        match kind.state_table() {
            Some(state_table) => {
                self.sync
                    .create(table, profile, map, Some(state_table))
                    .await?
            }
            None => self.config_db.mod_entry(table, profile, &map).await?,
        }

        info!("Added {} profile {}", kind, profile);
        Ok(())
    }

    /// Sets `keys` to `value` in an existing profile, or removes them when
    /// `remove` is set.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn update_map(
        &self,
        kind: QosMapKind,
        profile: &str,
        keys: &str,
        value: Option<u8>,
        remove: bool,
    ) -> CliResult<()> {
        let table = kind.table();

        let entry = self.config_db.get_entry(table, profile).await?;
        if entry.is_empty() {
            return Err(CliError::invalid(format!(
                "Profile '{}' not found.",
                profile
            )));
        }

        let value = match (value, remove) {
            (_, true) => None,
            (Some(value), false) => Some(value.to_string()),
            (None, false) => {
                return Err(CliError::invalid(format!(
                    "--{} is a required parameter.",
                    kind.value_name()
                )))
            }
        };

        let keys = parse_map_keys(kind.key_name(), keys, kind.key_max())?;
        self.ensure_unbound(kind, profile).await?;

        let updates: FieldUpdates = keys
            .into_iter()
            .map(|key| {
                let update = value.clone().map_or(FieldUpdate::Unset, FieldUpdate::Set);
                (key, update)
            })
            .collect();
        let merged = sonic_config_sync::merge_fields(&entry, &updates);

        match kind.state_table() {
            Some(_) if merged.is_empty() => self.sync.delete(table, profile).await?,
            Some(state_table) => {
                self.sync
                    .update(table, profile, &updates, Some(state_table))
                    .await?
            }
            None if merged.is_empty() => self.config_db.set_entry(table, profile, None).await?,
            None => {
                self.config_db
                    .set_entry(table, profile, Some(&merged))
                    .await?
            }
        }

        info!("Updated {} profile {}", kind, profile);
        Ok(())
    }

    /// Deletes a profile that no interface is bound to.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn delete_map(&self, kind: QosMapKind, profile: &str) -> CliResult<()> {
        let table = kind.table();

        if self.config_db.get_entry(table, profile).await?.is_empty() {
            return Err(CliError::invalid(format!(
                "{} profile '{}' not found.",
                kind, profile
            )));
        }

        self.ensure_unbound(kind, profile).await?;

        match kind.state_table() {
            Some(_) => self.sync.delete(table, profile).await?,
            None => self.config_db.set_entry(table, profile, None).await?,
        }

        info!("Deleted {} profile {}", kind, profile);
        Ok(())
    }

    /// Binds or unbinds a profile on `interface`, or on every port when the
    /// kind accepts `all`.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn bind_interface(
        &self,
        kind: QosMapKind,
        op: BindOp,
        interface: &str,
        profile: Option<&str>,
    ) -> CliResult<()> {
        if op == BindOp::Bind && profile.is_none() {
            return Err(CliError::invalid(format!("Cannot find {} profile.", kind)));
        }

        if kind == QosMapKind::TcQueue && self.platform.is_barefoot() {
            return Err(CliError::invalid(
                "Not support to bind tc-queue profile on Intel platform.",
            ));
        }

        let ports = self.config_db.get_keys(PORT).await?;
        let interfaces = if kind.accepts_all_interfaces() && interface.eq_ignore_ascii_case("all")
        {
            let mut all = ports;
            natural_sort(&mut all);
            all
        } else {
            if !ports.iter().any(|port| port == interface) {
                return Err(CliError::invalid(format!(
                    "Interface '{}' not found.",
                    interface
                )));
            }
            vec![interface.to_string()]
        };

        if let (BindOp::Bind, Some(profile)) = (op, profile) {
            if self
                .config_db
                .get_entry(kind.table(), profile)
                .await?
                .is_empty()
            {
                return Err(CliError::invalid(format!(
                    "{} profile '{}' not found.",
                    kind, profile
                )));
            }
        }

        for interface in &interfaces {
            match (op, profile) {
                (BindOp::Bind, Some(profile)) => {
                    let mut field = FieldMap::new();
                    field.insert(kind.port_field().to_string(), profile.to_string());
                    self.config_db
                        .mod_entry(PORT_QOS_MAP, interface, &field)
                        .await?;
                    debug!("Bound {} profile {} to {}", kind, profile, interface);
                }
                _ => {
                    let mut entry = self.config_db.get_entry(PORT_QOS_MAP, interface).await?;
                    if entry.remove(kind.port_field()).is_none() {
                        continue;
                    }
                    let value = (!entry.is_empty()).then_some(&entry);
                    self.config_db
                        .set_entry(PORT_QOS_MAP, interface, value)
                        .await?;
                    debug!("Unbound {} profile from {}", kind, interface);
                }
            }
        }

        Ok(())
    }

    /// Fails if any interface binds `profile` for this kind.
    async fn ensure_unbound(&self, kind: QosMapKind, profile: &str) -> CliResult<()> {
        let bindings = self.config_db.get_table(PORT_QOS_MAP).await?;
        let bound = bindings
            .values()
            .any(|entry| entry.get(kind.port_field()).map(String::as_str) == Some(profile));

        if bound {
            return Err(CliError::invalid(
                "The profile is binding to interface, unbind from it first.",
            ));
        }
        Ok(())
    }
}
