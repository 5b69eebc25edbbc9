//! Coordinator tuning.

use std::time::Duration;

use tokio::time::Instant;

/// Default time allowed for the agent to confirm a change.
pub const SYNC_CONFIG_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest confirmation deadline accepted.
pub const MAX_SYNC_CONFIG_TIMEOUT: Duration = Duration::from_secs(3600);

/// Default wait for a single notification before the deadline is rechecked.
pub const SYNC_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Timing for the guarded write-and-wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Deadline measured from the writer rendezvous.
    pub timeout: Duration,
    /// Upper bound on a single notification wait.
    pub poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            timeout: SYNC_CONFIG_TIMEOUT,
            poll_interval: SYNC_POLL_INTERVAL,
        }
    }
}

impl SyncConfig {
    /// Overrides the confirmation deadline, capped at
    /// [`MAX_SYNC_CONFIG_TIMEOUT`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.min(MAX_SYNC_CONFIG_TIMEOUT);
        self
    }

    /// Deadline for a wait starting at `start`.
    pub(crate) fn deadline_from(&self, start: Instant) -> Instant {
        let timeout = self.timeout.min(MAX_SYNC_CONFIG_TIMEOUT);
        start.checked_add(timeout).unwrap_or(start)
    }

    /// Overrides the per-poll wait. Zero is raised to one millisecond.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(Duration::from_millis(1));
        self
    }
}
