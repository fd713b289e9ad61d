use crate::config::StateConfig;
use crate::state::StateStatus;
use chrono::{DateTime, Duration, Utc};

/// Time-to-live of each marker kind
///
/// Both storage backends decide record activity through [`TtlPolicy::cutoff`],
/// so the file backend's pruning and the SQLite backend's windowed query agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub read: Duration,
    pub deleted: Duration,
}

impl TtlPolicy {
    pub fn new(read: Duration, deleted: Duration) -> Self {
        Self { read, deleted }
    }

    /// Builds the policy from the `[state]` configuration section
    pub fn from_config(config: &StateConfig) -> Self {
        Self {
            read: Duration::days(i64::from(config.read_ttl_days)),
            deleted: Duration::days(i64::from(config.delete_ttl_days)),
        }
    }

    pub fn ttl(&self, status: StateStatus) -> Duration {
        match status {
            StateStatus::Read => self.read,
            StateStatus::Deleted => self.deleted,
        }
    }

    /// Oldest write time that is no longer active at `now`
    ///
    /// A record is active iff its timestamp is strictly greater than the cutoff.
    pub fn cutoff(&self, status: StateStatus, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.ttl(status)
    }

    /// Whether a record written at `written_at` still affects a crawl at `now`
    pub fn is_active(
        &self,
        status: StateStatus,
        written_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        written_at > self.cutoff(status, now)
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::new(Duration::days(7), Duration::days(30))
    }
}
