//! Durable key-value storage behind the engine.
//!
//! `PersistenceAdapter` is the seam to the host's storage; the engine only
//! needs get, atomic multi-put, and multi-remove over string keys.

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::params;
use thiserror::Error;

use crate::storage::database::{Database, DatabaseError};

/// Durable key-value storage for engine state.
///
/// `put_many` must be atomic: either every entry is written or none is.
/// The engine relies on this to keep stats and unlock records consistent.
pub trait PersistenceAdapter {
    /// Read a value, `None` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write all entries in one atomic step.
    fn put_many(&mut self, entries: &[(&str, String)]) -> Result<(), StoreError>;

    /// Remove the given keys. Missing keys are not an error.
    fn remove_many(&mut self, keys: &[&str]) -> Result<(), StoreError>;
}

/// SQLite-backed adapter over the `engine_state` table.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Wrap an opened database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open or create a store at the given path.
    pub fn open(path: &std::path::Path) -> Result<Self, StoreError> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::new(Database::open_in_memory()?))
    }
}

impl PersistenceAdapter for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let result: Result<String, _> = self.db.connection().query_row(
            "SELECT value_json FROM engine_state WHERE key = ?1",
            params![key],
            |row| row.get(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::ReadFailed(e.to_string())),
        }
    }

    fn put_many(&mut self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }

        let now = Utc::now().to_rfc3339();
        let tx = self
            .db
            .connection_mut()
            .transaction()
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO engine_state (key, value_json, updated_at)
                     VALUES (?1, ?2, ?3)",
                )
                .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

            for (key, value) in entries {
                stmt.execute(params![key, value, now])
                    .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
            }
        }

        tx.commit()
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        Ok(())
    }

    fn remove_many(&mut self, keys: &[&str]) -> Result<(), StoreError> {
        if keys.is_empty() {
            return Ok(());
        }

        let tx = self
            .db
            .connection_mut()
            .transaction()
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        {
            let mut stmt = tx
                .prepare("DELETE FROM engine_state WHERE key = ?1")
                .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

            for key in keys {
                stmt.execute(params![key])
                    .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
            }
        }

        tx.commit()
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        Ok(())
    }
}

/// In-memory adapter for tests and hosts with their own durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceAdapter for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put_many(&mut self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.entries.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_many(&mut self, keys: &[&str]) -> Result<(), StoreError> {
        for key in keys {
            self.entries.remove(*key);
        }
        Ok(())
    }
}

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_round_trip() {
        let mut store = SqliteStore::open_in_memory().unwrap();

        assert!(store.get("user_stats").unwrap().is_none());

        store
            .put_many(&[("user_stats", "{\"a\":1}".to_string())])
            .unwrap();
        assert_eq!(
            store.get("user_stats").unwrap(),
            Some("{\"a\":1}".to_string())
        );

        // Replace keeps a single row
        store
            .put_many(&[("user_stats", "{\"a\":2}".to_string())])
            .unwrap();
        assert_eq!(
            store.get("user_stats").unwrap(),
            Some("{\"a\":2}".to_string())
        );
    }

    #[test]
    fn test_sqlite_put_many_writes_all_keys() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .put_many(&[
                ("user_stats", "{}".to_string()),
                ("user_badges", "[]".to_string()),
                ("badge_progress", "[]".to_string()),
            ])
            .unwrap();

        assert!(store.get("user_stats").unwrap().is_some());
        assert!(store.get("user_badges").unwrap().is_some());
        assert!(store.get("badge_progress").unwrap().is_some());
    }

    #[test]
    fn test_remove_many_is_tolerant_of_missing_keys() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.put_many(&[("user_stats", "{}".to_string())]).unwrap();
        store.remove_many(&["user_stats", "never_written"]).unwrap();
        assert!(store.get("user_stats").unwrap().is_none());
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        store.put_many(&[("k", "v".to_string())]).unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        store.remove_many(&["k"]).unwrap();
        assert!(store.get("k").unwrap().is_none());
    }
}
