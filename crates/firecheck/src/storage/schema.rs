//! `SQLite` schema definitions for firecheck.

/// Serialized collections, one row per storage key.
pub const CREATE_SNAPSHOTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS snapshots (
    key TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[CREATE_SNAPSHOTS_TABLE, CREATE_METADATA_TABLE];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshots_table_columns() {
        assert!(CREATE_SNAPSHOTS_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_SNAPSHOTS_TABLE.contains("payload TEXT NOT NULL"));
        assert!(CREATE_SNAPSHOTS_TABLE.contains("content_hash TEXT NOT NULL"));
    }

    #[test]
    fn test_metadata_table_created_last() {
        assert_eq!(SCHEMA_STATEMENTS.last(), Some(&CREATE_METADATA_TABLE));
    }
}
