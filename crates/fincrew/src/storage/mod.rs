//! Where job inputs come from and where job outputs go.

pub mod artifact;
pub mod sqlite;

use serde::Serialize;

use crate::error::StorageError;

pub use artifact::{write_upload, ArtifactGuard};
pub use sqlite::SqliteResultStore;

/// One persisted job outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub filename: String,
    pub query: String,
    pub result: String,
    /// RFC 3339 insert time. Empty for rows written before the column existed.
    pub created_at: String,
}

/// Append-only persistence of job outcomes.
pub trait ResultStore: Send + Sync {
    /// Writes one record atomically and returns its id.
    fn save(&self, filename: &str, query: &str, result: &str) -> Result<i64, StorageError>;

    /// All records, oldest first.
    fn list_all(&self) -> Result<Vec<AnalysisRecord>, StorageError>;
}
