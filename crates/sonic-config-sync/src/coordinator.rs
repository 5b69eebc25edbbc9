//! Synchronous commit coordinator.
//!
//! A commit writes an entry to CONFIG_DB and then blocks until the switch
//! agent that consumes the table publishes a terminal status record in
//! STATE_DB under the same key. Unconfirmed changes are rolled back.
//!
//! The keyspace subscription is established before the write is issued:
//! the writer task and the waiting task meet at a two-party barrier that
//! the waiter only reaches once the subscription is acknowledged, so the
//! agent's status notification cannot fire into an unsubscribed channel.

use std::sync::Arc;

use sonic_db_common::{ConfigDb, DbResult, FieldMap, KeyspaceSubscription, StateDb};
use tokio::sync::Barrier;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::merge::{merge_fields, FieldUpdates};
use crate::status::{SyncStatus, TIMEOUT_REASON};

type WriterHandle = JoinHandle<DbResult<()>>;

/// Writes configuration and waits for the agent's verdict.
///
/// Concurrent commits on the same key are not serialized here; two
/// operators racing on one profile race at the CONFIG_DB layer.
pub struct SyncConfigurator {
    config_db: Arc<dyn ConfigDb>,
    state_db: Arc<dyn StateDb>,
    config: SyncConfig,
}

impl SyncConfigurator {
    /// Creates a coordinator with the default 10 s deadline.
    pub fn new(config_db: Arc<dyn ConfigDb>, state_db: Arc<dyn StateDb>) -> Self {
        Self {
            config_db,
            state_db,
            config: SyncConfig::default(),
        }
    }

    /// Replaces the timing configuration.
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the timing configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Creates `table|key` and waits for `state_table|key` to report.
    ///
    /// `state_table` defaults to `table`. Fails with
    /// [`SyncError::AlreadyExists`] without touching either database when
    /// the entry exists. If the agent does not confirm, the entry is
    /// removed again.
    #[instrument(skip(self, value), fields(table = %table, key = %key))]
    pub async fn create(
        &self,
        table: &str,
        key: &str,
        value: FieldMap,
        state_table: Option<&str>,
    ) -> SyncResult<()> {
        if !self.config_db.get_entry(table, key).await?.is_empty() {
            return Err(SyncError::already_exists(table, key));
        }

        let state_table = state_table.unwrap_or(table);
        if let Err(err) = self
            .sync_configure_status(table, key, value, state_table)
            .await
        {
            warn!("Create of {}|{} not confirmed: {}", table, key, err);
            self.rollback(table, key, None).await;
            return Err(err);
        }

        info!("Created {}|{}", table, key);
        Ok(())
    }

    /// Merges `updates` into `table|key` and waits for `state_table|key`
    /// to report.
    ///
    /// A missing entry is treated as empty. If the agent does not confirm,
    /// the entry is restored to exactly what it was before the call,
    /// including being absent.
    #[instrument(skip(self, updates), fields(table = %table, key = %key))]
    pub async fn update(
        &self,
        table: &str,
        key: &str,
        updates: &FieldUpdates,
        state_table: Option<&str>,
    ) -> SyncResult<()> {
        let original = self.config_db.get_entry(table, key).await?;
        let merged = merge_fields(&original, updates);

        let state_table = state_table.unwrap_or(table);
        if let Err(err) = self
            .sync_configure_status(table, key, merged, state_table)
            .await
        {
            warn!("Update of {}|{} not confirmed: {}", table, key, err);
            self.rollback(table, key, Some(&original)).await;
            return Err(err);
        }

        info!("Updated {}|{}", table, key);
        Ok(())
    }

    /// Removes `table|key` without waiting for the agent.
    ///
    /// Deleting an absent entry succeeds.
    #[instrument(skip(self), fields(table = %table, key = %key))]
    pub async fn delete(&self, table: &str, key: &str) -> SyncResult<()> {
        self.config_db.set_entry(table, key, None).await?;
        debug!("Deleted {}|{}", table, key);
        Ok(())
    }

    async fn rollback(&self, table: &str, key: &str, snapshot: Option<&FieldMap>) {
        match self.config_db.set_entry(table, key, snapshot).await {
            Ok(()) => debug!("Rolled back {}|{}", table, key),
            Err(e) => error!("Failed to roll back {}|{}: {}", table, key, e),
        }
    }

    /// Guarded write-and-wait.
    async fn sync_configure_status(
        &self,
        table: &str,
        key: &str,
        value: FieldMap,
        state_table: &str,
    ) -> SyncResult<()> {
        let mut subscription = self.state_db.subscribe().await?;
        let barrier = Arc::new(Barrier::new(2));

        let mut writer: WriterHandle = {
            let barrier = Arc::clone(&barrier);
            let config_db = Arc::clone(&self.config_db);
            let table = table.to_string();
            let key = key.to_string();
            tokio::spawn(async move {
                barrier.wait().await;
                config_db.set_entry(&table, &key, Some(&value)).await
            })
        };

        barrier.wait().await;
        let deadline = self.config.deadline_from(Instant::now());

        let mut written = false;
        let outcome = self
            .wait_for_status(
                subscription.as_mut(),
                &mut writer,
                &mut written,
                state_table,
                key,
                deadline,
            )
            .await;

        if let Err(e) = subscription.unsubscribe().await {
            warn!("Failed to release keyspace subscription: {}", e);
        }

        // The write must have landed before any rollback is issued.
        if !written {
            writer_result(writer.await)?;
        }

        outcome
    }

    async fn wait_for_status(
        &self,
        subscription: &mut dyn KeyspaceSubscription,
        writer: &mut WriterHandle,
        written: &mut bool,
        state_table: &str,
        key: &str,
        deadline: Instant,
    ) -> SyncResult<()> {
        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(SyncError::configuration_failed(TIMEOUT_REASON));
            }
            let wait = self.config.poll_interval.min(deadline - now);

            tokio::select! {
                biased;

                joined = &mut *writer, if !*written => {
                    *written = true;
                    writer_result(joined)?;
                    debug!("Configuration written, waiting for {}|{}", state_table, key);
                }

                polled = time::timeout(wait, subscription.next_event()) => {
                    let event = match polled {
                        Ok(event) => event?,
                        Err(_) => continue,
                    };

                    if !event.matches(state_table, key) {
                        debug!(channel = %event.channel, "Ignoring unrelated notification");
                        continue;
                    }

                    let record = self.state_db.get_entry(state_table, key).await?;
                    match SyncStatus::from_record(&record) {
                        SyncStatus::Success => return Ok(()),
                        SyncStatus::Failure(reason) => {
                            return Err(SyncError::configuration_failed(reason))
                        }
                        SyncStatus::Pending => {
                            debug!(?record, "Status for {}|{} still pending", state_table, key);
                        }
                    }
                }
            }
        }
    }
}

fn writer_result(joined: Result<DbResult<()>, JoinError>) -> SyncResult<()> {
    match joined {
        Ok(result) => result.map_err(SyncError::from),
        Err(e) => Err(SyncError::Internal {
            message: format!("configuration writer task failed: {}", e),
        }),
    }
}
