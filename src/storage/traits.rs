//! Report cache trait and error types

use crate::model::AnalysisReport;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid timestamp in cache: {0}")]
    InvalidTimestamp(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Keyed store of finished reports
///
/// Implementations must be safe to share between concurrent pipeline runs.
pub trait ReportCache: Send + Sync {
    /// Returns the report stored under `key`, if present and not expired
    fn get(&self, key: &str) -> StorageResult<Option<AnalysisReport>>;

    /// Stores `report` under `key`, replacing any previous entry
    fn put(&self, key: &str, report: &AnalysisReport) -> StorageResult<()>;

    /// Deletes expired entries and returns how many were removed
    fn purge_expired(&self) -> StorageResult<usize>;

    /// Cheap liveness check used by the health endpoint
    fn ping(&self) -> StorageResult<()> {
        Ok(())
    }
}
