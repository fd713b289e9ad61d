//! Database schema definitions
//!
//! This module contains the SQL schema for the relational state store.

/// SQL schema for the database
///
/// One row per `(url, status)`; writing the same pair again overwrites
/// `created_at`. Rows are never deleted.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS url_states (
    url TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('read', 'deleted')),
    created_at INTEGER NOT NULL,
    PRIMARY KEY (url, status)
);

CREATE INDEX IF NOT EXISTS idx_url_states_window ON url_states(status, created_at);
"#;

/// Creates the schema if it does not exist
pub fn initialize_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
