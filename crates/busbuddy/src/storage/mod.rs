//! Storage layer for busbuddy.
//!
//! A small `SQLite`-backed key-value store. The schools registry is kept as
//! one JSON snapshot under a fixed key and rewritten whole on every change.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::registry::SchoolsRegistry;

/// A stored value with its bookkeeping columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The stored value.
    pub value: String,
    /// BLAKE3 hash recorded when the value was written.
    pub content_hash: String,
    /// When the value was last written.
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// Whether the recorded hash still matches the value.
    #[must_use]
    pub fn is_intact(&self) -> bool {
        compute_hash(&self.value) == self.content_hash
    }
}

/// Compute the BLAKE3 hash of a stored value.
#[must_use]
pub fn compute_hash(value: &str) -> String {
    blake3::hash(value.as_bytes()).to_hex().to_string()
}

/// Key-value storage engine.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
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
        Ok(Self { path, conn })
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
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        let content_hash = compute_hash(value);
        self.conn.execute(
            r"
            INSERT INTO kv (key, value, content_hash, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                content_hash = excluded.content_hash,
                updated_at = excluded.updated_at
            ",
            params![key, value, content_hash, Utc::now().to_rfc3339()],
        )?;
        debug!(key, bytes = value.len(), "value stored");
        Ok(())
    }

    /// Read the entry stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn entry(&self, key: &str) -> Result<Option<Entry>> {
        let entry = self
            .conn
            .query_row(
                "SELECT value, content_hash, updated_at FROM kv WHERE key = ?1",
                [key],
                |row| {
                    let updated_at: String = row.get(2)?;
                    Ok(Entry {
                        value: row.get(0)?,
                        content_hash: row.get(1)?,
                        updated_at: DateTime::parse_from_rfc3339(&updated_at)
                            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc)),
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    /// Read the value stored under `key`.
    ///
    /// A value whose hash no longer matches is treated as missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)? {
            Some(entry) if entry.is_intact() => Ok(Some(entry.value)),
            Some(_) => {
                warn!(key, "stored value failed its integrity check");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// All stored keys in sorted order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    /// Persist a full registry snapshot under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_registry(&self, key: &str, registry: &SchoolsRegistry) -> Result<()> {
        let json = registry.to_json()?;
        self.put(key, &json)?;
        info!(key, schools = registry.len(), "schools registry saved");
        Ok(())
    }

    /// Load the registry snapshot under `key`, falling back to the seed.
    ///
    /// A missing, tampered or unparsable snapshot yields
    /// [`SchoolsRegistry::seed`].
    ///
    /// # Errors
    ///
    /// Returns an error only if the database read fails.
    pub fn load_registry(&self, key: &str) -> Result<SchoolsRegistry> {
        let Some(json) = self.get(key)? else {
            debug!(key, "no stored registry, using seed");
            return Ok(SchoolsRegistry::seed());
        };
        match SchoolsRegistry::from_json(&json) {
            Ok(registry) => {
                debug!(key, schools = registry.len(), "schools registry loaded");
                Ok(registry)
            }
            Err(err) => {
                warn!(key, %err, "stored registry unreadable, using seed");
                Ok(SchoolsRegistry::seed())
            }
        }
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let entries: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            entries,
            db_size_bytes,
        })
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of stored keys.
    pub entries: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "busbuddy_v4_schools";

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    #[test]
    fn test_put_and_get() {
        let storage = create_test_storage();
        storage.put("a", "1").unwrap();
        assert_eq!(storage.get("a").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_put_overwrites() {
        let storage = create_test_storage();
        storage.put("a", "1").unwrap();
        storage.put("a", "2").unwrap();

        assert_eq!(storage.get("a").unwrap().as_deref(), Some("2"));
        assert_eq!(storage.stats().unwrap().entries, 1);
    }

    #[test]
    fn test_get_missing() {
        let storage = create_test_storage();
        assert!(storage.get("nothing").unwrap().is_none());
        assert!(storage.entry("nothing").unwrap().is_none());
    }

    #[test]
    fn test_entry_records_hash() {
        let storage = create_test_storage();
        storage.put("a", "hello").unwrap();

        let entry = storage.entry("a").unwrap().unwrap();
        assert_eq!(entry.content_hash, compute_hash("hello"));
        assert!(entry.is_intact());
    }

    #[test]
    fn test_tampered_value_reads_as_missing() {
        crate::logging::init_test_logging();
        let storage = create_test_storage();
        storage.put("a", "hello").unwrap();
        storage
            .connection()
            .execute("UPDATE kv SET value = 'goodbye' WHERE key = 'a'", [])
            .unwrap();

        assert!(!storage.entry("a").unwrap().unwrap().is_intact());
        assert!(storage.get("a").unwrap().is_none());
    }

    #[test]
    fn test_keys_sorted() {
        let storage = create_test_storage();
        storage.put("b", "2").unwrap();
        storage.put("a", "1").unwrap();
        assert_eq!(storage.keys().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_load_registry_defaults_to_seed() {
        let storage = create_test_storage();
        assert_eq!(storage.load_registry(KEY).unwrap(), SchoolsRegistry::seed());
    }

    #[test]
    fn test_save_and_load_registry() {
        let storage = create_test_storage();
        let mut registry = SchoolsRegistry::seed();
        registry.add_route("PAE101", "Route Bronze");

        storage.save_registry(KEY, &registry).unwrap();
        assert_eq!(storage.load_registry(KEY).unwrap(), registry);
    }

    #[test]
    fn test_load_registry_unparsable_falls_back() {
        let storage = create_test_storage();
        storage.put(KEY, "{not json").unwrap();
        assert_eq!(storage.load_registry(KEY).unwrap(), SchoolsRegistry::seed());
    }

    #[test]
    fn test_load_registry_reads_prototype_snapshot() {
        let storage = create_test_storage();
        let json = r#"{"SEL999":{"id":"S4","name":"Seoul Global School","logo":"🌏","routes":["Gangnam Line"],"driverName":"Kim Bus"}}"#;
        storage.put(KEY, json).unwrap();

        let registry = storage.load_registry(KEY).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("sel999").unwrap().routes, vec!["Gangnam Line"]);
    }

    #[test]
    fn test_open_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("busbuddy.db");

        let storage = Storage::open(&path).unwrap();
        assert_eq!(storage.path(), path.as_path());
        assert!(path.exists());
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("busbuddy.db");

        {
            let storage = Storage::open(&path).unwrap();
            storage.put("a", "persisted").unwrap();
        }

        let storage = Storage::open(&path).unwrap();
        assert_eq!(storage.get("a").unwrap().as_deref(), Some("persisted"));
        assert!(storage.stats().unwrap().db_size_bytes > 0);
    }

    #[test]
    fn test_stats_in_memory() {
        let storage = create_test_storage();
        let stats = storage.stats().unwrap();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.db_size_bytes, 0);
    }
}
