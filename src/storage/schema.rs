//! Database schema definitions and migrations
//!
//! This module contains the SQL schema for the result store.

use crate::storage::{StorageError, StorageResult};
use rusqlite::Connection;

/// Current schema version, kept in `PRAGMA user_version`
pub const SCHEMA_VERSION: u32 = 1;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per stored crawl result
CREATE TABLE IF NOT EXISTS scrape_results (
    key TEXT PRIMARY KEY,
    seed_url TEXT NOT NULL,
    scraped_at TEXT NOT NULL,
    outcome TEXT NOT NULL,
    product_count INTEGER NOT NULL,
    config_hash TEXT,
    payload TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_scrape_results_scraped_at ON scrape_results(scraped_at);
"#;

/// Initializes the database schema
///
/// A fresh database is stamped with [`SCHEMA_VERSION`]; a database written
/// by a newer schema is rejected.
pub fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if found > SCHEMA_VERSION {
        return Err(StorageError::SchemaVersion {
            found,
            expected: SCHEMA_VERSION,
        });
    }

    conn.execute_batch(SCHEMA_SQL)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

/// Reads the schema version of an open database
pub fn schema_version(conn: &Connection) -> StorageResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_table_exists_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='scrape_results'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();

        assert!(matches!(
            initialize_schema(&conn),
            Err(StorageError::SchemaVersion { .. })
        ));
    }
}
