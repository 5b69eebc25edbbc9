//! Simulated switch agent
//!
//! Stands in for the orchagent-side consumer of a CONFIG_DB table: it
//! watches writes to one table and publishes status records for the same
//! key into a STATE_DB table, following a scripted response.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sonic_db_common::{ConfigObserver, FieldMap, MemoryConfigDb, MemoryStateDb};
use tracing::debug;

fn status_record(status: &str, message: Option<&str>) -> FieldMap {
    let mut record = FieldMap::new();
    record.insert("status".to_string(), status.to_string());
    if let Some(message) = message {
        record.insert("message".to_string(), message.to_string());
    }
    record
}

/// Scripted reaction to one configuration write.
///
/// Each step is published after its delay, measured from the previous
/// step. Leading steps with zero delay are published from inside the
/// write itself, before the writer gets control back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentResponse {
    steps: Vec<(Duration, FieldMap)>,
}

impl AgentResponse {
    /// Publishes `status: SUCCESS`.
    pub fn success() -> Self {
        Self::record(status_record("SUCCESS", None))
    }

    /// Publishes `status: FAILURE` with `message`.
    pub fn failure(message: &str) -> Self {
        Self::record(status_record("FAILURE", Some(message)))
    }

    /// Publishes `status: FAILURE` without a message.
    pub fn failure_without_message() -> Self {
        Self::record(status_record("FAILURE", None))
    }

    /// Publishes a non-terminal status.
    pub fn pending() -> Self {
        Self::record(status_record("PENDING", None))
    }

    /// Publishes an arbitrary record.
    pub fn record(record: FieldMap) -> Self {
        Self {
            steps: vec![(Duration::ZERO, record)],
        }
    }

    /// Never answers.
    pub fn silent() -> Self {
        Self { steps: Vec::new() }
    }

    /// Delays the first step.
    pub fn delayed(mut self, delay: Duration) -> Self {
        if let Some(first) = self.steps.first_mut() {
            first.0 = delay;
        }
        self
    }

    /// Appends the steps of `next`, the first one `delay` after the last
    /// step of `self`.
    pub fn then_after(mut self, delay: Duration, next: AgentResponse) -> Self {
        let mut next_steps = next.steps.into_iter();
        if let Some((_, record)) = next_steps.next() {
            self.steps.push((delay, record));
        }
        self.steps.extend(next_steps);
        self
    }
}

/// Agent reacting to writes on one CONFIG_DB table.
pub struct SimulatedAgent {
    state_db: Arc<MemoryStateDb>,
    config_table: String,
    state_table: String,
    responses: Mutex<VecDeque<AgentResponse>>,
    processed: AtomicUsize,
}

impl SimulatedAgent {
    /// Creates an agent that answers every write with SUCCESS.
    pub fn new(
        state_db: Arc<MemoryStateDb>,
        config_table: impl Into<String>,
        state_table: impl Into<String>,
    ) -> Self {
        Self {
            state_db,
            config_table: config_table.into(),
            state_table: state_table.into(),
            responses: Mutex::new(VecDeque::from([AgentResponse::success()])),
            processed: AtomicUsize::new(0),
        }
    }

    /// Answers writes with `response`, replacing any script.
    pub fn respond(self, response: AgentResponse) -> Self {
        *self.responses.lock() = VecDeque::from([response]);
        self
    }

    /// Queues `response` for the write after the already scripted ones.
    /// The last queued response answers all remaining writes.
    pub fn then_respond(self, response: AgentResponse) -> Self {
        self.responses.lock().push_back(response);
        self
    }

    /// Starts watching `config_db`.
    pub fn attach(self, config_db: &MemoryConfigDb) -> Arc<Self> {
        let agent = Arc::new(self);
        config_db.add_observer(agent.clone());
        agent
    }

    /// Number of non-delete writes the agent has seen.
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> AgentResponse {
        let mut responses = self.responses.lock();
        if responses.len() > 1 {
            responses.pop_front().unwrap_or_else(AgentResponse::silent)
        } else {
            responses.front().cloned().unwrap_or_else(AgentResponse::silent)
        }
    }
}

impl ConfigObserver for SimulatedAgent {
    fn on_write(&self, table: &str, key: &str, value: &FieldMap) {
        if table != self.config_table {
            return;
        }

        if value.is_empty() {
            debug!(table, key, "Agent saw delete");
            self.state_db.set_entry(&self.state_table, key, FieldMap::new());
            return;
        }

        self.processed.fetch_add(1, Ordering::SeqCst);
        let mut steps = self.next_response().steps.into_iter().peekable();

        while let Some((_, record)) = steps.next_if(|(delay, _)| delay.is_zero()) {
            self.state_db.set_entry(&self.state_table, key, record);
        }

        let remaining: Vec<_> = steps.collect();
        if remaining.is_empty() {
            return;
        }

        let state_db = Arc::clone(&self.state_db);
        let state_table = self.state_table.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            for (delay, record) in remaining {
                tokio::time::sleep(delay).await;
                debug!(table = %state_table, key = %key, ?record, "Agent publishing status");
                state_db.set_entry(&state_table, &key, record);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sonic_db_common::{field_map, ConfigDb, StateDb};

    #[tokio::test]
    async fn test_agent_answers_immediately() {
        let config_db = MemoryConfigDb::new();
        let state_db = Arc::new(MemoryStateDb::new());
        let agent = SimulatedAgent::new(state_db.clone(), "T", "T_STATE").attach(&config_db);

        config_db
            .set_entry("T", "p1", Some(&field_map! { "0" => "1" }))
            .await
            .unwrap();

        assert_eq!(agent.processed(), 1);
        assert_eq!(
            state_db.get_entry("T_STATE", "p1").await.unwrap(),
            field_map! { "status" => "SUCCESS" }
        );
    }

    #[tokio::test]
    async fn test_agent_ignores_other_tables() {
        let config_db = MemoryConfigDb::new();
        let state_db = Arc::new(MemoryStateDb::new());
        let agent = SimulatedAgent::new(state_db.clone(), "T", "T").attach(&config_db);

        config_db
            .set_entry("OTHER", "p1", Some(&field_map! { "0" => "1" }))
            .await
            .unwrap();

        assert_eq!(agent.processed(), 0);
        assert!(state_db.get_entry("T", "p1").await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_agent_scripted_steps() {
        let config_db = MemoryConfigDb::new();
        let state_db = Arc::new(MemoryStateDb::new());
        SimulatedAgent::new(state_db.clone(), "T", "T")
            .respond(
                AgentResponse::pending()
                    .then_after(Duration::from_secs(2), AgentResponse::failure("bad value")),
            )
            .attach(&config_db);

        config_db
            .set_entry("T", "p1", Some(&field_map! { "0" => "1" }))
            .await
            .unwrap();
        assert_eq!(
            state_db.get_entry("T", "p1").await.unwrap(),
            field_map! { "status" => "PENDING" }
        );

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(
            state_db.get_entry("T", "p1").await.unwrap(),
            field_map! { "status" => "FAILURE", "message" => "bad value" }
        );
    }

    #[test]
    fn test_response_script_order() {
        let state_db = Arc::new(MemoryStateDb::new());
        let agent = SimulatedAgent::new(state_db, "T", "T")
            .respond(AgentResponse::failure("first"))
            .then_respond(AgentResponse::success());

        assert_eq!(agent.next_response(), AgentResponse::failure("first"));
        assert_eq!(agent.next_response(), AgentResponse::success());
        assert_eq!(agent.next_response(), AgentResponse::success());
    }
}
