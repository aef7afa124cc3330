//! Report cache persistence
//!
//! This module handles the optional report cache, including:
//! - SQLite database initialization and schema management
//! - Keyed storage of finished reports with a time-to-live
//! - Topic normalization for cache keys

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteReportCache;
pub use traits::{ReportCache, StorageError, StorageResult};

use crate::config::CacheConfig;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;

/// Derives the cache key for a topic
///
/// Topics differing only in case or whitespace share a key.
pub fn cache_key(topic: &str) -> String {
    let normalized = topic
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

/// Opens the configured cache, or returns `None` when caching is disabled
///
/// # Returns
///
/// * `Ok(Some(cache))` - Cache enabled and opened
/// * `Ok(None)` - Cache disabled in configuration
/// * `Err(StorageError)` - Failed to open the database
pub fn open_cache(config: &CacheConfig) -> StorageResult<Option<Arc<dyn ReportCache>>> {
    if !config.enabled {
        return Ok(None);
    }

    let cache = SqliteReportCache::open(Path::new(&config.database_path), config.ttl_secs)?;
    let purged = cache.purge_expired()?;
    tracing::info!(
        path = %config.database_path,
        ttl_secs = config.ttl_secs,
        purged,
        "Report cache opened"
    );

    Ok(Some(Arc::new(cache)))
}
