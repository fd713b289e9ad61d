//! Storage module for user-action markers
//!
//! This module persists the per-URL read/deleted markers behind one
//! [`StateStore`] contract with two backends:
//! - `JsonFileStore`: two JSON history files, expired entries pruned on write
//! - `SqliteStore`: an upsert table, expired rows kept and filtered by query

mod file;
mod schema;
mod sqlite;
mod traits;

pub use file::JsonFileStore;
pub use sqlite::SqliteStore;
pub use traits::{StateStore, StorageError, StorageResult};

use crate::config::{StateBackend, StateConfig};
use crate::state::{StateSnapshot, StateStatus, TtlPolicy};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// State store shared between the crawl and mutation paths
pub type SharedStore = Arc<Mutex<dyn StateStore>>;

/// Opens the backend selected in the `[state]` section
///
/// # Arguments
///
/// * `config` - The state configuration
///
/// # Returns
///
/// * `Ok(SharedStore)` - The opened store
/// * `Err(StorageError)` - The SQLite database could not be opened
pub fn open_store(config: &StateConfig) -> StorageResult<SharedStore> {
    let ttl = TtlPolicy::from_config(config);

    let store: SharedStore = match config.backend {
        StateBackend::File => {
            tracing::info!("Using file state store in {}", config.directory.display());
            Arc::new(Mutex::new(JsonFileStore::new(&config.directory, ttl)))
        }
        StateBackend::Sqlite => {
            tracing::info!(
                "Using SQLite state store at {}",
                config.database_path.display()
            );
            Arc::new(Mutex::new(SqliteStore::new(&config.database_path, ttl)?))
        }
    };

    Ok(store)
}

/// Records a marker through a shared store
pub fn put(store: &SharedStore, url: &str, status: StateStatus) -> StorageResult<()> {
    let mut guard = store.lock().map_err(|_| StorageError::LockPoisoned)?;
    guard.put(url, status)
}

/// Loads the active marker sets through a shared store
pub fn snapshot(store: &SharedStore, now: DateTime<Utc>) -> StorageResult<StateSnapshot> {
    let guard = store.lock().map_err(|_| StorageError::LockPoisoned)?;
    guard.snapshot(now)
}

/// Loads the active marker sets, falling back to "no state known" on failure
pub fn snapshot_or_empty(store: &SharedStore, now: DateTime<Utc>) -> StateSnapshot {
    match snapshot(store, now) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::error!("Failed to load state snapshot, reconciling without it: {}", e);
            StateSnapshot::empty()
        }
    }
}
