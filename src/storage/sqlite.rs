//! SQLite report cache
//!
//! Entries are written as JSON documents keyed by [`cache_key`](super::cache_key).
//! Expiry is checked on read, so a stale row is never returned even if
//! [`ReportCache::purge_expired`] has not run.

use crate::model::AnalysisReport;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ReportCache, StorageError, StorageResult};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed [`ReportCache`]
pub struct SqliteReportCache {
    conn: Mutex<Connection>,
    ttl: Duration,
}

impl SqliteReportCache {
    /// Opens or creates the cache database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `ttl_secs` - Seconds an entry stays valid after it is written
    pub fn open(path: &Path, ttl_secs: u64) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        initialize_schema(&conn)?;

        Ok(Self::with_connection(conn, ttl_secs))
    }

    /// Creates an in-memory cache (for testing)
    pub fn new_in_memory(ttl_secs: u64) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self::with_connection(conn, ttl_secs))
    }

    fn with_connection(conn: Connection, ttl_secs: u64) -> Self {
        let ttl_secs = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        Self {
            conn: Mutex::new(conn),
            ttl: Duration::try_seconds(ttl_secs).unwrap_or(Duration::MAX),
        }
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn is_fresh(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(created_at) < self.ttl
    }

    pub(crate) fn get_at(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> StorageResult<Option<AnalysisReport>> {
        let conn = self.lock()?;
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT report_json, created_at FROM reports WHERE cache_key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((json, created_at)) = row else {
            return Ok(None);
        };

        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|_| StorageError::InvalidTimestamp(created_at.clone()))?
            .with_timezone(&Utc);

        if !self.is_fresh(created_at, now) {
            conn.execute("DELETE FROM reports WHERE cache_key = ?1", params![key])?;
            tracing::debug!(key, "Evicted expired cache entry");
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&json)?))
    }

    pub(crate) fn put_at(
        &self,
        key: &str,
        report: &AnalysisReport,
        created_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let json = serde_json::to_string(report)?;
        self.lock()?.execute(
            "INSERT OR REPLACE INTO reports (cache_key, topic, report_json, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![key, report.topic, json, created_at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Number of rows currently stored, expired or not
    pub fn len(&self) -> StorageResult<usize> {
        let count: i64 = self
            .lock()?
            .query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl ReportCache for SqliteReportCache {
    fn get(&self, key: &str) -> StorageResult<Option<AnalysisReport>> {
        self.get_at(key, Utc::now())
    }

    fn put(&self, key: &str, report: &AnalysisReport) -> StorageResult<()> {
        self.put_at(key, report, Utc::now())
    }

    fn purge_expired(&self) -> StorageResult<usize> {
        let cutoff = Utc::now()
            .checked_sub_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let removed = self.lock()?.execute(
            "DELETE FROM reports WHERE created_at <= ?1",
            params![cutoff.to_rfc3339()],
        )?;
        Ok(removed)
    }

    fn ping(&self) -> StorageResult<()> {
        self.lock()?.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}
