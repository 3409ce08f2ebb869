//! SQLite-backed result store.
//!
//! One connection behind a mutex; SQLite serializes writers anyway. The
//! schema revision lives in `PRAGMA user_version`.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, Row};

use super::{AnalysisRecord, ResultStore};
use crate::error::StorageError;

const SCHEMA_REVISION: i64 = 1;

const CREATE_ANALYSES: &str = "CREATE TABLE IF NOT EXISTS analyses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    query TEXT NOT NULL,
    result TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT ''
);";

/// `ResultStore` over the `analyses` table.
#[derive(Clone)]
pub struct SqliteResultStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteResultStore {
    /// Opens (or creates) the store file, creating missing parent directories.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        prepare_schema(&conn)?;

        log::info!("Result store opened at {}", path.display());
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        prepare_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn count(&self) -> Result<u64, StorageError> {
        let conn = self.lock()?;
        let n: u64 = conn.query_row("SELECT COUNT(*) FROM analyses", [], |r| r.get(0))?;
        Ok(n)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

impl ResultStore for SqliteResultStore {
    fn save(&self, filename: &str, query: &str, result: &str) -> Result<i64, StorageError> {
        let created_at = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO analyses (filename, query, result, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![filename, query, result, created_at],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn list_all(&self) -> Result<Vec<AnalysisRecord>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, filename, query, result, created_at FROM analyses ORDER BY id ASC",
        )?;
        let records = stmt
            .query_map([], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

fn record_from_row(row: &Row<'_>) -> Result<AnalysisRecord, rusqlite::Error> {
    // Tables created by older installs allow NULL text.
    let text = |name: &str| -> Result<String, rusqlite::Error> {
        Ok(row.get::<_, Option<String>>(name)?.unwrap_or_default())
    };
    Ok(AnalysisRecord {
        id: row.get("id")?,
        filename: text("filename")?,
        query: text("query")?,
        result: text("result")?,
        created_at: text("created_at")?,
    })
}

/// Brings the schema up to `SCHEMA_REVISION`. An `analyses` table written
/// without `created_at` is kept, rows included, and gains the column.
fn prepare_schema(conn: &Connection) -> Result<(), StorageError> {
    let revision: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if revision >= SCHEMA_REVISION {
        return Ok(());
    }

    conn.execute_batch(CREATE_ANALYSES)?;
    if !has_created_at(conn)? {
        log::info!("Adding created_at to existing analyses table");
        conn.execute_batch("ALTER TABLE analyses ADD COLUMN created_at TEXT NOT NULL DEFAULT '';")?;
    }
    conn.execute_batch(&format!("PRAGMA user_version = {};", SCHEMA_REVISION))?;
    Ok(())
}

fn has_created_at(conn: &Connection) -> Result<bool, StorageError> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('analyses')")?;
    let mut names = stmt.query_map([], |row| row.get::<_, String>(0))?;
    Ok(names.any(|name| matches!(name.as_deref(), Ok("created_at"))))
}
