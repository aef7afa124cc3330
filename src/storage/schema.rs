//! Database schema definitions
//!
//! This module contains the SQL schema for the report cache database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Cached reports, one per normalized topic
CREATE TABLE IF NOT EXISTS reports (
    cache_key TEXT PRIMARY KEY,
    topic TEXT NOT NULL,
    report_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reports_created_at ON reports(created_at);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
