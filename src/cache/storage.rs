//! Snapshot storage trait and SQLite implementation.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Trait for durable snapshot storage backends.
///
/// Entries are opaque serialized blobs under fixed logical keys; the
/// [`LocalCache`](super::LocalCache) layer owns serialization and failure
/// absorption.
pub trait SnapshotStorage: Send + Sync {
  /// Read the blob stored under `key`, if any.
  fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

  /// Atomically overwrite the blob stored under `key`.
  fn write(&self, key: &str, data: &[u8]) -> Result<()>;
}

impl<S: SnapshotStorage + ?Sized> SnapshotStorage for std::sync::Arc<S> {
  fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
    (**self).read(key)
  }

  fn write(&self, key: &str, data: &[u8]) -> Result<()> {
    (**self).write(key, data)
  }
}

impl<S: SnapshotStorage + ?Sized> SnapshotStorage for Box<S> {
  fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
    (**self).read(key)
  }

  fn write(&self, key: &str, data: &[u8]) -> Result<()> {
    (**self).write(key, data)
  }
}

/// In-memory storage used when persistence is disabled and in tests.
#[derive(Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl SnapshotStorage for MemoryStorage {
  fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
    let entries = self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(entries.get(key).cloned())
  }

  fn write(&self, key: &str, data: &[u8]) -> Result<()> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    entries.insert(key.to_string(), data.to_vec());
    Ok(())
  }
}

/// SQLite-backed snapshot storage.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open (or create) the store at the default location.
  pub fn open() -> Result<Self> {
    Self::open_at(&Self::default_path()?)
  }

  /// Open (or create) the store at an explicit path.
  pub fn open_at(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;

    Ok(storage)
  }

  /// Get the default database path.
  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("expandix").join("cache.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }
}

/// Schema for the snapshot table.
const CACHE_SCHEMA: &str = r#"
-- Last-known-good snapshots, one row per logical key
CREATE TABLE IF NOT EXISTS snapshot_cache (
    key TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl SnapshotStorage for SqliteStorage {
  fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .query_row(
        "SELECT data FROM snapshot_cache WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read snapshot {}: {}", key, e))
  }

  fn write(&self, key: &str, data: &[u8]) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO snapshot_cache (key, data, cached_at)
         VALUES (?, ?, datetime('now'))",
        params![key, data],
      )
      .map_err(|e| eyre!("Failed to write snapshot {}: {}", key, e))?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sqlite_overwrite_and_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let storage = SqliteStorage::open_at(&dir.path().join("cache.db")).unwrap();

    assert_eq!(storage.read("k").unwrap(), None);
    storage.write("k", b"one").unwrap();
    storage.write("k", b"two").unwrap();
    assert_eq!(storage.read("k").unwrap(), Some(b"two".to_vec()));
  }

  #[test]
  fn test_sqlite_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");
    {
      let storage = SqliteStorage::open_at(&path).unwrap();
      storage.write("boards", b"[]").unwrap();
    }
    let storage = SqliteStorage::open_at(&path).unwrap();
    assert_eq!(storage.read("boards").unwrap(), Some(b"[]".to_vec()));
  }

  #[test]
  fn test_memory_storage_isolated_keys() {
    let storage = MemoryStorage::default();
    storage.write("a", b"1").unwrap();
    assert_eq!(storage.read("b").unwrap(), None);
    assert_eq!(storage.read("a").unwrap(), Some(b"1".to_vec()));
  }
}
