//! Coordinator behaviour against the in-memory databases and a simulated
//! agent. All tests run on a paused clock so deadlines elapse instantly.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use sonic_config_sync::{
    FieldUpdate, FieldUpdates, SyncConfig, SyncConfigurator, SyncError, DEFAULT_FAILURE_REASON,
    MAX_SYNC_CONFIG_TIMEOUT,
};
use sonic_config_test::{AgentResponse, SimulatedAgent};
use sonic_db_common::{
    field_map, ConfigDb, DbError, DbResult, FieldMap, MemoryConfigDb, MemoryStateDb, StateDb,
};
use tokio::time::Instant;

struct Harness {
    config_db: Arc<MemoryConfigDb>,
    state_db: Arc<MemoryStateDb>,
    sync: SyncConfigurator,
}

impl Harness {
    fn new() -> Self {
        let config_db = Arc::new(MemoryConfigDb::new());
        let state_db = Arc::new(MemoryStateDb::new());
        let sync = SyncConfigurator::new(config_db.clone(), state_db.clone());
        Self {
            config_db,
            state_db,
            sync,
        }
    }

    fn with_agent(self, response: AgentResponse) -> (Self, Arc<SimulatedAgent>) {
        let agent = SimulatedAgent::new(self.state_db.clone(), "T", "T")
            .respond(response)
            .attach(&self.config_db);
        (self, agent)
    }
}

fn updates(items: &[(&str, Option<&str>)]) -> FieldUpdates {
    items
        .iter()
        .map(|(field, value)| (field.to_string(), value.map(str::to_string).into()))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_create_confirmed_by_agent() {
    let (h, agent) =
        Harness::new().with_agent(AgentResponse::success().delayed(Duration::from_secs(2)));

    h.sync
        .create("T", "p1", field_map! { "0" => "1" }, None)
        .await
        .unwrap();

    assert_eq!(agent.processed(), 1);
    assert_eq!(
        h.config_db.get_entry("T", "p1").await.unwrap(),
        field_map! { "0" => "1" }
    );
    assert_eq!(h.state_db.active_subscriptions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_create_rejected_by_agent_is_rolled_back() {
    let (h, _agent) = Harness::new().with_agent(AgentResponse::failure("bad value"));

    let err = h
        .sync
        .create("T", "p1", field_map! { "0" => "1" }, None)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "bad value");
    assert!(h.config_db.get_entry("T", "p1").await.unwrap().is_empty());
    assert_eq!(h.state_db.active_subscriptions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failure_without_message_uses_default_reason() {
    let (h, _agent) = Harness::new().with_agent(AgentResponse::failure_without_message());

    let err = h
        .sync
        .create("T", "p1", field_map! { "0" => "1" }, None)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), DEFAULT_FAILURE_REASON);
}

#[tokio::test(start_paused = true)]
async fn test_update_unsets_fields() {
    let (h, _agent) = Harness::new().with_agent(AgentResponse::success());
    h.config_db.seed("T", "p1", field_map! { "0" => "1", "1" => "2" });

    h.sync
        .update("T", "p1", &updates(&[("1", None)]), None)
        .await
        .unwrap();

    assert_eq!(
        h.config_db.get_entry("T", "p1").await.unwrap(),
        field_map! { "0" => "1" }
    );
}

#[tokio::test(start_paused = true)]
async fn test_update_merges_fields() {
    let (h, _agent) = Harness::new().with_agent(AgentResponse::success());
    h.config_db
        .seed("T", "p1", field_map! { "0" => "1", "1" => "2", "2" => "3" });

    h.sync
        .update(
            "T",
            "p1",
            &updates(&[("1", Some("5")), ("2", None), ("7", Some("7"))]),
            None,
        )
        .await
        .unwrap();

    assert_eq!(
        h.config_db.get_entry("T", "p1").await.unwrap(),
        field_map! { "0" => "1", "1" => "5", "7" => "7" }
    );
}

#[tokio::test]
async fn test_create_existing_entry_fails_immediately() {
    let h = Harness::new();
    h.config_db.seed("T", "p1", field_map! { "0" => "1" });

    let err = h
        .sync
        .create("T", "p1", field_map! { "0" => "9" }, None)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::AlreadyExists { .. }));
    assert_eq!(
        err.to_string(),
        "The key \"p1\" already exists in the table \"T\"."
    );
    assert_eq!(h.config_db.write_count(), 0);
    assert_eq!(h.state_db.subscriptions_opened(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_update_failure_restores_snapshot() {
    let (h, _agent) = Harness::new().with_agent(AgentResponse::failure("rejected"));
    let original = field_map! { "0" => "1", "1" => "2" };
    h.config_db.seed("T", "p1", original.clone());

    let err = h
        .sync
        .update(
            "T",
            "p1",
            &updates(&[("0", None), ("1", Some("9")), ("5", Some("5"))]),
            None,
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "rejected");
    assert_eq!(h.config_db.get_entry("T", "p1").await.unwrap(), original);
}

#[tokio::test(start_paused = true)]
async fn test_update_of_absent_entry_rolls_back_to_absent() {
    let h = Harness::new();
    let sync = SyncConfigurator::new(h.config_db.clone(), h.state_db.clone())
        .with_config(SyncConfig::default().with_timeout(Duration::from_secs(3)));

    let err = sync
        .update("T", "p1", &updates(&[("0", Some("1"))]), None)
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(h.config_db.get_entry("T", "p1").await.unwrap().is_empty());
    assert_eq!(h.config_db.write_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_status_published_during_write_is_observed() {
    // The agent answers from inside the CONFIG_DB write, before the writer
    // task returns.
    let (h, _agent) = Harness::new().with_agent(AgentResponse::success());
    let started = Instant::now();

    h.sync
        .create("T", "p1", field_map! { "0" => "1" }, None)
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_stale_status_before_subscription_is_not_trusted() {
    // A record and notification from an earlier commit do not satisfy this
    // one; the fresh answer from the agent does.
    let (h, agent) = Harness::new()
        .with_agent(AgentResponse::success().delayed(Duration::from_millis(300)));
    h.state_db
        .set_entry("T", "p1", field_map! { "status" => "FAILURE", "message" => "old" });

    h.sync
        .create("T", "p1", field_map! { "0" => "1" }, None)
        .await
        .unwrap();

    assert_eq!(agent.processed(), 1);
    assert_eq!(
        h.config_db.get_entry("T", "p1").await.unwrap(),
        field_map! { "0" => "1" }
    );
}

#[tokio::test(start_paused = true)]
async fn test_timeout_bound() {
    let (h, _agent) = Harness::new().with_agent(AgentResponse::silent());
    let poll = h.sync.config().poll_interval;
    let started = Instant::now();

    let err = h
        .sync
        .create("T", "p1", field_map! { "0" => "1" }, None)
        .await
        .unwrap_err();

    let elapsed = started.elapsed();
    assert_eq!(err.to_string(), "Timeout");
    assert!(elapsed >= Duration::from_secs(10), "elapsed {:?}", elapsed);
    assert!(elapsed <= Duration::from_secs(10) + poll, "elapsed {:?}", elapsed);
    assert!(h.config_db.get_entry("T", "p1").await.unwrap().is_empty());
    assert_eq!(h.state_db.active_subscriptions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_pending_status_keeps_waiting() {
    let (h, _agent) = Harness::new().with_agent(
        AgentResponse::pending().then_after(Duration::from_secs(3), AgentResponse::success()),
    );
    let started = Instant::now();

    h.sync
        .create("T", "p1", field_map! { "0" => "1" }, None)
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_pending_only_status_times_out_and_rolls_back() {
    let (h, agent) = Harness::new().with_agent(AgentResponse::pending());
    let started = Instant::now();

    let err = h
        .sync
        .create("T", "p1", field_map! { "0" => "1" }, None)
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(started.elapsed() >= Duration::from_secs(10));
    assert!(agent.processed() >= 1);
    assert!(h.config_db.get_entry("T", "p1").await.unwrap().is_empty());
    assert_eq!(h.state_db.active_subscriptions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_timeout_still_waits_for_agent() {
    let h = Harness::new();
    let sync = SyncConfigurator::new(h.config_db.clone(), h.state_db.clone()).with_config(
        SyncConfig {
            timeout: Duration::MAX,
            ..SyncConfig::default()
        },
    );
    let _agent = SimulatedAgent::new(h.state_db.clone(), "T", "T")
        .respond(AgentResponse::failure("bad value").delayed(Duration::from_secs(2)))
        .attach(&h.config_db);

    let err = sync
        .create("T", "p1", field_map! { "0" => "1" }, None)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "bad value");
    assert!(h.config_db.get_entry("T", "p1").await.unwrap().is_empty());
    assert_eq!(h.state_db.active_subscriptions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_oversized_timeout_is_capped() {
    let h = Harness::new();
    let sync = SyncConfigurator::new(h.config_db.clone(), h.state_db.clone())
        .with_config(SyncConfig::default().with_timeout(Duration::from_secs(u64::MAX)));
    let started = Instant::now();

    let err = sync
        .create("T", "p1", field_map! { "0" => "1" }, None)
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(started.elapsed() >= MAX_SYNC_CONFIG_TIMEOUT);
    assert!(h.config_db.get_entry("T", "p1").await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unrelated_notifications_are_ignored() {
    let h = Harness::new();
    let state_db = h.state_db.clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        state_db.publish_raw("not-a-keyspace-channel", "hset");
        state_db.publish_raw("__keyspace@6__:no-separator", "hset");
        state_db.set_entry("T", "p2", field_map! { "status" => "SUCCESS" });
        state_db.set_entry("OTHER", "p1", field_map! { "status" => "SUCCESS" });
        tokio::time::sleep(Duration::from_secs(1)).await;
        state_db.set_entry("T", "p1", field_map! { "status" => "SUCCESS" });
    });

    let started = Instant::now();
    h.sync
        .create("T", "p1", field_map! { "0" => "1" }, None)
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn test_separate_state_table() {
    let h = Harness::new();
    SimulatedAgent::new(h.state_db.clone(), "TC_TO_QUEUE_MAP", "QOS_TC_TO_QUEUE_MAP_TABLE")
        .respond(AgentResponse::failure("queue map rejected"))
        .attach(&h.config_db);

    let err = h
        .sync
        .create(
            "TC_TO_QUEUE_MAP",
            "AZURE",
            field_map! { "0" => "0" },
            Some("QOS_TC_TO_QUEUE_MAP_TABLE"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "queue map rejected");
    assert!(h.config_db.snapshot("TC_TO_QUEUE_MAP", "AZURE").is_empty());
}

#[tokio::test]
async fn test_delete_does_not_wait() {
    let h = Harness::new();
    h.config_db.seed("T", "p1", field_map! { "0" => "1" });

    h.sync.delete("T", "p1").await.unwrap();

    assert!(h.config_db.get_entry("T", "p1").await.unwrap().is_empty());
    assert_eq!(h.state_db.subscriptions_opened(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_agent_sees_delete_of_rolled_back_entry() {
    let (h, agent) = Harness::new().with_agent(AgentResponse::failure("bad value"));

    h.sync
        .create("T", "p1", field_map! { "0" => "1" }, None)
        .await
        .unwrap_err();

    assert_eq!(agent.processed(), 1);
    assert!(h.state_db.get_entry("T", "p1").await.unwrap().is_empty());
}

/// CONFIG_DB whose writes always fail.
struct ReadOnlyConfigDb(MemoryConfigDb);

#[async_trait]
impl ConfigDb for ReadOnlyConfigDb {
    async fn get_entry(&self, table: &str, key: &str) -> DbResult<FieldMap> {
        self.0.get_entry(table, key).await
    }

    async fn set_entry(&self, _table: &str, _key: &str, _value: Option<&FieldMap>) -> DbResult<()> {
        Err(DbError::connection("READONLY"))
    }

    async fn mod_entry(&self, _table: &str, _key: &str, _value: &FieldMap) -> DbResult<()> {
        Err(DbError::connection("READONLY"))
    }

    async fn get_table(&self, table: &str) -> DbResult<BTreeMap<String, FieldMap>> {
        self.0.get_table(table).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_write_error_is_reported() {
    let state_db = Arc::new(MemoryStateDb::new());
    let sync = SyncConfigurator::new(
        Arc::new(ReadOnlyConfigDb(MemoryConfigDb::new())),
        state_db.clone(),
    );
    let started = Instant::now();

    let err = sync
        .create("T", "p1", field_map! { "0" => "1" }, None)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Database(_)));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(state_db.active_subscriptions(), 0);
}

#[test]
fn test_field_update_from_option() {
    assert_eq!(FieldUpdate::from(None), FieldUpdate::Unset);
    assert_eq!(
        FieldUpdate::from(Some("3".to_string())),
        FieldUpdate::Set("3".to_string())
    );
}
