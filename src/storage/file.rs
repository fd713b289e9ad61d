//! JSON file storage implementation
//!
//! One JSON object per status maps url → millisecond timestamp of the last
//! write. Each mutation rewrites the whole file with expired entries dropped.
//!
//! ## Layout
//!
//! ```text
//! {directory}/
//! ├── read-history.json     # { "<url>": 1760860800000, ... }
//! └── delete-history.json
//! ```

use crate::state::{StateRecord, StateSnapshot, StateStatus, TtlPolicy};
use crate::storage::traits::{StateStore, StorageError, StorageResult};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

type History = BTreeMap<String, i64>;

/// File-backed state store with eager expiry
pub struct JsonFileStore {
    directory: PathBuf,
    ttl: TtlPolicy,
}

impl JsonFileStore {
    /// Creates a store rooted at `directory`
    ///
    /// The directory is created on first write if it does not exist.
    pub fn new(directory: impl Into<PathBuf>, ttl: TtlPolicy) -> Self {
        Self {
            directory: directory.into(),
            ttl,
        }
    }

    /// Path of the history file for one status
    pub fn history_path(&self, status: StateStatus) -> PathBuf {
        let file_name = match status {
            StateStatus::Read => "read-history.json",
            StateStatus::Deleted => "delete-history.json",
        };
        self.directory.join(file_name)
    }

    /// Reads one history file
    ///
    /// A missing file is an empty history. An unparsable file is logged and
    /// also treated as empty, so the next write replaces it.
    fn load(&self, status: StateStatus) -> StorageResult<History> {
        let path = self.history_path(status);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(History::new()),
            Err(e) => return Err(StorageError::Io(e)),
        };

        match serde_json::from_str(&content) {
            Ok(history) => Ok(history),
            Err(e) => {
                tracing::warn!("Ignoring unreadable history file {}: {}", path.display(), e);
                Ok(History::new())
            }
        }
    }

    /// Writes a history file atomically (temp file, then rename)
    fn save(&self, status: StateStatus, history: &History) -> StorageResult<()> {
        let path = self.history_path(status);
        std::fs::create_dir_all(&self.directory)?;

        let bytes = serde_json::to_vec_pretty(history)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.flush()?;
        drop(file);

        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn write_marker(&self, url: &str, status: StateStatus, at: DateTime<Utc>) -> StorageResult<usize> {
        let mut history = self.load(status)?;
        history.insert(url.to_string(), at.timestamp_millis());

        let before = history.len();
        history.retain(|_, ms| {
            millis_to_datetime(*ms)
                .map(|written| self.ttl.is_active(status, written, at))
                .unwrap_or(false)
        });
        let pruned = before - history.len();

        self.save(status, &history)?;
        Ok(pruned)
    }
}

fn millis_to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

impl StateStore for JsonFileStore {
    /// Write failures are logged and the mutation is dropped; the caller
    /// always sees success.
    fn put_at(&mut self, url: &str, status: StateStatus, at: DateTime<Utc>) -> StorageResult<()> {
        match self.write_marker(url, status, at) {
            Ok(pruned) => {
                tracing::debug!("Marked {} as {} ({} expired entries pruned)", url, status, pruned);
            }
            Err(e) => {
                tracing::error!(
                    "Failed to write {}: {}",
                    self.history_path(status).display(),
                    e
                );
            }
        }
        Ok(())
    }

    fn snapshot(&self, now: DateTime<Utc>) -> StorageResult<StateSnapshot> {
        let mut snapshot = StateSnapshot::empty();

        for status in StateStatus::ALL {
            for (url, ms) in self.load(status)? {
                let active = millis_to_datetime(ms)
                    .map(|written| self.ttl.is_active(status, written, now))
                    .unwrap_or(false);
                if active {
                    snapshot.insert(url, status);
                }
            }
        }

        Ok(snapshot)
    }

    fn records(&self) -> StorageResult<Vec<StateRecord>> {
        let mut records = Vec::new();

        for status in StateStatus::ALL {
            for (url, ms) in self.load(status)? {
                let timestamp = millis_to_datetime(ms).ok_or_else(|| StorageError::CorruptRecord {
                    url: url.clone(),
                    message: format!("timestamp {} out of range", ms),
                })?;
                records.push(StateRecord {
                    url,
                    status,
                    timestamp,
                });
            }
        }

        Ok(records)
    }
}
