//! Storage traits and error types
//!
//! This module defines the trait interface shared by the state store
//! backends and the associated error types.

use crate::state::{StateRecord, StateSnapshot, StateStatus};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupt record for {url}: {message}")]
    CorruptRecord { url: String, message: String },

    #[error("State store lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for state store backends
///
/// Both backends honour the same contract: `put` is an idempotent upsert
/// keyed by `(url, status)` with last-write-wins timestamps, and `snapshot`
/// returns the URLs whose marker of each status is still inside its TTL.
///
/// They differ in how expired markers are kept: the file backend deletes them
/// on every write, the SQLite backend keeps them and relies on the windowed
/// query. [`StateStore::records`] exposes that difference.
pub trait StateStore: Send {
    /// Records `status` for `url` at the current time
    fn put(&mut self, url: &str, status: StateStatus) -> StorageResult<()> {
        self.put_at(url, status, Utc::now())
    }

    /// Records `status` for `url` as written at `at`
    ///
    /// # Arguments
    ///
    /// * `url` - The post URL (natural key)
    /// * `status` - Which marker to write
    /// * `at` - Write time; also the reference time for eager expiry
    fn put_at(&mut self, url: &str, status: StateStatus, at: DateTime<Utc>) -> StorageResult<()>;

    /// Computes the active read/deleted URL sets at `now`
    fn snapshot(&self, now: DateTime<Utc>) -> StorageResult<StateSnapshot>;

    /// Lists every physically stored record, active or not
    fn records(&self) -> StorageResult<Vec<StateRecord>>;
}
