//! Persistence of the equipment collection.
//!
//! The collection is stored whole, as one JSON document under a fixed
//! storage key. [`Storage`] keeps that document in a `SQLite` key-value
//! table and skips writes whose content hash has not changed.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::fleet::Fleet;

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "fire_check_data";

/// Loads and saves the whole equipment collection.
pub trait HistoryStore {
    /// Load the collection; an empty store yields an empty collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or its content is not a
    /// valid collection.
    fn load(&self) -> Result<Fleet>;

    /// Replace the stored collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be written.
    fn save(&self, fleet: &Fleet) -> Result<()>;
}

/// `SQLite` key-value store for the serialized collection.
#[derive(Debug)]
pub struct Storage {
    path: PathBuf,
    key: String,
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema
    /// initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            path,
            key: DEFAULT_STORAGE_KEY.to_string(),
            conn,
        })
    }

    /// Create an in-memory storage instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            key: DEFAULT_STORAGE_KEY.to_string(),
            conn,
        })
    }

    /// Use `key` instead of [`DEFAULT_STORAGE_KEY`].
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The storage key this instance reads and writes.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Compute the content hash stored alongside a payload.
    #[must_use]
    pub fn compute_hash(payload: &str) -> String {
        blake3::hash(payload.as_bytes()).to_hex().to_string()
    }

    /// Raw JSON stored under the key, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn load_snapshot(&self) -> Result<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM snapshots WHERE key = ?1",
                [&self.key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }

    /// Store `payload` under the key.
    ///
    /// Returns `false` without writing when the stored payload already has
    /// the same hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn save_snapshot(&self, payload: &str) -> Result<bool> {
        let hash = Self::compute_hash(payload);
        let stored: Option<String> = self
            .conn
            .query_row(
                "SELECT content_hash FROM snapshots WHERE key = ?1",
                [&self.key],
                |row| row.get(0),
            )
            .optional()?;

        if stored.as_deref() == Some(hash.as_str()) {
            debug!(key = %self.key, "Collection unchanged, skipping write");
            return Ok(false);
        }

        self.conn.execute(
            r"
            INSERT OR REPLACE INTO snapshots (key, payload, content_hash, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![self.key, payload, hash, Utc::now().to_rfc3339()],
        )?;
        debug!(key = %self.key, bytes = payload.len(), "Saved collection");
        Ok(true)
    }

    /// Get storage statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let row: Option<(i64, String)> = self
            .conn
            .query_row(
                "SELECT length(payload), updated_at FROM snapshots WHERE key = ?1",
                [&self.key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (payload_bytes, updated_at) = match row {
            Some((len, updated)) => (
                u64::try_from(len).unwrap_or(0),
                DateTime::parse_from_rfc3339(&updated)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc)),
            ),
            None => (0, None),
        };

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StoreStats {
            storage_key: self.key.clone(),
            schema_version: migrations::schema_version(&self.conn)?,
            payload_bytes,
            updated_at,
            db_size_bytes,
        })
    }
}

impl HistoryStore for Storage {
    fn load(&self) -> Result<Fleet> {
        match self.load_snapshot()? {
            Some(payload) => {
                let fleet: Fleet = serde_json::from_str(&payload)?;
                debug!(units = fleet.len(), "Loaded collection");
                Ok(fleet)
            }
            None => {
                debug!(key = %self.key, "No stored collection, starting empty");
                Ok(Fleet::new())
            }
        }
    }

    fn save(&self, fleet: &Fleet) -> Result<()> {
        let payload = serde_json::to_string(fleet)?;
        self.save_snapshot(&payload)?;
        Ok(())
    }
}

/// Statistics about the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Key the collection is stored under.
    pub storage_key: String,
    /// Schema version of the database.
    pub schema_version: i32,
    /// Size of the stored JSON document.
    pub payload_bytes: u64,
    /// When the collection was last written.
    pub updated_at: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

impl StoreStats {
    /// Format the database size in a human-readable way.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn db_size_human(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;

        if self.db_size_bytes >= MB {
            format!("{:.2} MB", self.db_size_bytes as f64 / MB as f64)
        } else if self.db_size_bytes >= KB {
            format!("{:.2} KB", self.db_size_bytes as f64 / KB as f64)
        } else {
            format!("{} bytes", self.db_size_bytes)
        }
    }
}
