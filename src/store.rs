//! store.rs — append-only SQLite log of enriched results.
//!
//! System of record is a single `results` table:
//! - results(id, original, analysis, sentiment, source, timestamp)
//!
//! One process-wide connection, opened at startup. Writes go through a
//! mutex so id assignment stays strictly monotonic.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use serde::Serialize;
use thiserror::Error;

const CREATE_RESULTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    original TEXT NOT NULL,
    analysis TEXT NOT NULL,
    sentiment TEXT NOT NULL,
    source TEXT NOT NULL,
    timestamp TEXT NOT NULL
)
"#;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Row data for a single insert. Timestamp is assigned by the caller at
/// persistence time and stored verbatim.
#[derive(Debug, Clone, Copy)]
pub struct NewResult<'a> {
    pub original: &'a str,
    pub analysis: &'a str,
    pub sentiment: &'a str,
    pub source: &'a str,
    pub timestamp: &'a str,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StoredResult {
    pub id: i64,
    pub original: String,
    pub analysis: String,
    pub sentiment: String,
    pub source: String,
    pub timestamp: String,
}

/// Seam between the pipeline and the concrete store, so tests can swap in
/// a failing or scripted implementation.
pub trait ResultStore: Send + Sync {
    /// Append one row and return its id. The row is durable once this
    /// returns `Ok`.
    fn insert(&self, row: NewResult<'_>) -> Result<i64, StoreError>;

    /// Newest rows first, at most `limit` of them.
    fn recent(&self, limit: usize) -> Result<Vec<StoredResult>, StoreError>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open a database file (creates file and schema if absent).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(CREATE_RESULTS_TABLE, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM results", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// All rows carrying the given identifier, in insertion order.
    pub fn find_by_original(&self, original: &str) -> Result<Vec<StoredResult>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, original, analysis, sentiment, source, timestamp \
             FROM results WHERE original = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map([original], row_to_result)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl ResultStore for SqliteStore {
    fn insert(&self, row: NewResult<'_>) -> Result<i64, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT INTO results (original, analysis, sentiment, source, timestamp) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                row.original,
                row.analysis,
                row.sentiment,
                row.source,
                row.timestamp
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredResult>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, original, analysis, sentiment, source, timestamp \
             FROM results ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map([limit as i64], row_to_result)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn row_to_result(row: &rusqlite::Row) -> rusqlite::Result<StoredResult> {
    Ok(StoredResult {
        id: row.get(0)?,
        original: row.get(1)?,
        analysis: row.get(2)?,
        sentiment: row.get(3)?,
        source: row.get(4)?,
        timestamp: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample<'a>(original: &'a str, timestamp: &'a str) -> NewResult<'a> {
        NewResult {
            original,
            analysis: "analysis text",
            sentiment: "balanced",
            source: "HTTPBin UUID",
            timestamp,
        }
    }

    #[test]
    fn insert_assigns_strictly_increasing_ids() {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = store.insert(sample("u-1", "2024-01-01T00:00:00.000000Z")).unwrap();
        let b = store.insert(sample("u-2", "2024-01-01T00:00:01.000000Z")).unwrap();
        let c = store.insert(sample("u-3", "2024-01-01T00:00:02.000000Z")).unwrap();
        assert!(a < b && b < c, "ids must follow insertion order: {a} {b} {c}");
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn recent_returns_newest_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        for i in 0..5 {
            let original = format!("u-{i}");
            store
                .insert(sample(&original, "2024-01-01T00:00:00.000000Z"))
                .unwrap();
        }
        let rows = store.recent(2).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].original, "u-4");
        assert_eq!(rows[1].original, "u-3");
    }

    #[test]
    fn find_by_original_round_trips_all_fields() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store
            .insert(NewResult {
                original: "u-42",
                analysis: "described",
                sentiment: "balanced",
                source: "batch-42",
                timestamp: "2024-01-01T12:00:00.000000Z",
            })
            .unwrap();

        let rows = store.find_by_original("u-42").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0],
            StoredResult {
                id,
                original: "u-42".into(),
                analysis: "described".into(),
                sentiment: "balanced".into(),
                source: "batch-42".into(),
                timestamp: "2024-01-01T12:00:00.000000Z".into(),
            }
        );
    }

    #[test]
    fn rows_survive_reopen_and_schema_create_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .insert(sample("u-persisted", "2024-01-01T00:00:00.000000Z"))
                .unwrap();
        }

        // Reopen runs CREATE TABLE IF NOT EXISTS again against live data.
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        let rows = store.find_by_original("u-persisted").unwrap();
        assert_eq!(rows[0].source, "HTTPBin UUID");
    }
}
