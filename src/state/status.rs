/// User-action markers recorded per URL
///
/// A URL may hold one `Read` and one `Deleted` record at the same time, each
/// with its own timestamp and TTL.
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;

/// Kind of user action recorded against a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateStatus {
    /// The user opened the post
    Read,

    /// The user swiped the post away
    Deleted,
}

impl StateStatus {
    /// All statuses, in storage order
    pub const ALL: [StateStatus; 2] = [StateStatus::Read, StateStatus::Deleted];

    /// Maps a mark-state action to a status
    ///
    /// Only `"delete"` selects `Deleted`; anything else, including an absent
    /// action, is treated as a read.
    pub fn from_action(action: Option<&str>) -> Self {
        match action {
            Some("delete") => Self::Deleted,
            _ => Self::Read,
        }
    }

    /// Converts the status to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Deleted => "deleted",
        }
    }

    /// Parses a status from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "read" => Some(Self::Read),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

impl fmt::Display for StateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// One stored marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRecord {
    pub url: String,
    pub status: StateStatus,
    pub timestamp: DateTime<Utc>,
}

/// Active read/deleted URL sets at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    pub read_urls: HashSet<String>,
    pub deleted_urls: HashSet<String>,
}

impl StateSnapshot {
    /// Snapshot with no known state
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_read(&self, url: &str) -> bool {
        self.read_urls.contains(url)
    }

    pub fn is_deleted(&self, url: &str) -> bool {
        self.deleted_urls.contains(url)
    }

    /// Adds a URL to the set matching `status`
    pub fn insert(&mut self, url: impl Into<String>, status: StateStatus) {
        match status {
            StateStatus::Read => self.read_urls.insert(url.into()),
            StateStatus::Deleted => self.deleted_urls.insert(url.into()),
        };
    }
}
