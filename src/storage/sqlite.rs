//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the StateStore trait.
//! Expired rows are never removed; activity is decided by the windowed query.

use crate::state::{StateRecord, StateSnapshot, StateStatus, TtlPolicy};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StateStore, StorageError, StorageResult};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite state store backend
pub struct SqliteStore {
    conn: Connection,
    ttl: TtlPolicy,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `ttl` - Marker lifetimes used by `snapshot`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path, ttl: TtlPolicy) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn, ttl })
    }

    /// Creates an in-memory database
    pub fn new_in_memory(ttl: TtlPolicy) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn, ttl })
    }

    fn active_urls(&self, status: StateStatus, now: DateTime<Utc>) -> StorageResult<Vec<String>> {
        let cutoff = self.ttl.cutoff(status, now).timestamp_millis();

        let mut stmt = self
            .conn
            .prepare("SELECT url FROM url_states WHERE status = ?1 AND created_at > ?2")?;

        let urls = stmt
            .query_map(params![status.to_db_string(), cutoff], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(urls)
    }
}

impl StateStore for SqliteStore {
    fn put_at(&mut self, url: &str, status: StateStatus, at: DateTime<Utc>) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO url_states (url, status, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(url, status) DO UPDATE SET created_at = excluded.created_at",
            params![url, status.to_db_string(), at.timestamp_millis()],
        )?;
        tracing::debug!("Marked {} as {}", url, status);
        Ok(())
    }

    fn snapshot(&self, now: DateTime<Utc>) -> StorageResult<StateSnapshot> {
        let mut snapshot = StateSnapshot::empty();

        for status in StateStatus::ALL {
            for url in self.active_urls(status, now)? {
                snapshot.insert(url, status);
            }
        }

        Ok(snapshot)
    }

    fn records(&self) -> StorageResult<Vec<StateRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, status, created_at FROM url_states ORDER BY url, status")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(url, status, created_at)| {
                let status = StateStatus::from_db_string(&status).ok_or_else(|| {
                    StorageError::CorruptRecord {
                        url: url.clone(),
                        message: format!("unknown status '{}'", status),
                    }
                })?;
                let timestamp = Utc.timestamp_millis_opt(created_at).single().ok_or_else(|| {
                    StorageError::CorruptRecord {
                        url: url.clone(),
                        message: format!("timestamp {} out of range", created_at),
                    }
                })?;
                Ok(StateRecord {
                    url,
                    status,
                    timestamp,
                })
            })
            .collect()
    }
}
