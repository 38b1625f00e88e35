// ============================================================================
// RedbStore: embedded key-value file (redb)
// ============================================================================
// Persistent local storage for the game store snapshots.
// Default path: ~/.goldrush/store.redb (override via GOLDRUSH_DB_PATH env var)
// ============================================================================

use anyhow::{anyhow, Result};
use redb::{Database, TableDefinition};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::KeyValueStore;

const ENTRIES: TableDefinition<&str, &str> = TableDefinition::new("entries");

/// Key-value store backed by a redb database file
pub struct RedbStore {
    db: Database,
    path: PathBuf,
}

impl RedbStore {
    /// Open (or create) the database at the given path.
    /// If `path` is None, uses GOLDRUSH_DB_PATH env var or ~/.goldrush/store.redb
    pub fn open(path: Option<&str>) -> Result<Self> {
        let db_path = if let Some(p) = path {
            PathBuf::from(p)
        } else if let Ok(env_path) = std::env::var("GOLDRUSH_DB_PATH") {
            PathBuf::from(env_path)
        } else {
            default_path()?
        };

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| anyhow!("Failed to create {}: {}", parent.display(), e))?;
            }
        }

        info!("Opening store at: {}", db_path.display());

        let db = Database::create(&db_path)
            .map_err(|e| anyhow!("Failed to open database: {}", e))?;

        // Ensure the table exists by doing a write transaction
        let write_txn = db
            .begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let _ = write_txn
                .open_table(ENTRIES)
                .map_err(|e| anyhow!("Failed to create entries table: {}", e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit init: {}", e))?;

        Ok(Self { db, path: db_path })
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored entries, ordered by key
    pub fn entries(&self) -> Result<Vec<(String, String)>> {
        let read_txn = self.db.begin_read()
            .map_err(|e| anyhow!("Failed to begin read: {}", e))?;
        let table = read_txn.open_table(ENTRIES)
            .map_err(|e| anyhow!("Failed to open entries table: {}", e))?;

        let mut results = Vec::new();
        let iter = table.range::<&str>(..)
            .map_err(|e| anyhow!("Failed to iterate entries: {}", e))?;
        for entry in iter {
            let (key, value) = entry.map_err(|e| anyhow!("Failed to read entry: {}", e))?;
            results.push((key.value().to_string(), value.value().to_string()));
        }
        Ok(results)
    }
}

fn default_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".goldrush").join("store.redb"))
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let read_txn = self.db.begin_read()
            .map_err(|e| anyhow!("Failed to begin read: {}", e))?;
        let table = read_txn.open_table(ENTRIES)
            .map_err(|e| anyhow!("Failed to open entries table: {}", e))?;

        let value = table
            .get(key)
            .map_err(|e| anyhow!("Failed to get {}: {}", key, e))?
            .map(|v| v.value().to_string());
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let mut table = write_txn.open_table(ENTRIES)
                .map_err(|e| anyhow!("Failed to open entries table: {}", e))?;
            table.insert(key, value)
                .map_err(|e| anyhow!("Failed to insert {}: {}", key, e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit: {}", e))?;

        debug!("Stored {}", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        let removed;
        {
            let mut table = write_txn.open_table(ENTRIES)
                .map_err(|e| anyhow!("Failed to open entries table: {}", e))?;
            removed = table.remove(key)
                .map_err(|e| anyhow!("Failed to remove {}: {}", key, e))?
                .is_some();
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit delete: {}", e))?;

        if removed {
            debug!("Removed {}", key);
        }
        Ok(())
    }
}
