// ============================================================================
// Storage: flat string key-value persistence
// ============================================================================
// The store snapshots every mutation under a fixed set of keys. Backends:
// MemoryStore (tests, simulations) and RedbStore (embedded redb file).
// ============================================================================

mod redb_store;

pub use redb_store::RedbStore;

use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Persistence keys
pub mod keys {
    pub const INVENTORY: &str = "goldrush_inventory";
    pub const ACTIVE_POWERUPS: &str = "goldrush_active_powerups";
    pub const PROGRESS_DAY: &str = "goldrush_progress_day";
    pub const DAILY_SCORE: &str = "goldrush_daily_score";
    pub const GAMES_PLAYED: &str = "goldrush_games_played";
    pub const HIGH_SCORE_GAMES: &str = "goldrush_high_score_games";
    pub const CLAIMED_LEVEL1: &str = "goldrush_claimed_level1";
    pub const CLAIMED_LEVEL2: &str = "goldrush_claimed_level2";
    pub const LAST_CLAIM: &str = "goldrush_last_claim";
    pub const LAST_LOGIN: &str = "goldrush_last_login";
    pub const LOGIN_STREAK: &str = "goldrush_login_streak";
    pub const NEXT_GAME_TIME: &str = "goldrush_next_game_time";
    pub const CREDITED_REFERENCES: &str = "goldrush_credited_references";
    pub const MUTED: &str = "goldrush_muted";

    /// Every key the store writes, for export and reset
    pub const ALL: &[&str] = &[
        INVENTORY,
        ACTIVE_POWERUPS,
        PROGRESS_DAY,
        DAILY_SCORE,
        GAMES_PLAYED,
        HIGH_SCORE_GAMES,
        CLAIMED_LEVEL1,
        CLAIMED_LEVEL2,
        LAST_CLAIM,
        LAST_LOGIN,
        LOGIN_STREAK,
        NEXT_GAME_TIME,
        CREDITED_REFERENCES,
        MUTED,
    ];
}

/// Synchronous string-keyed, string-valued storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process map, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every entry (test helper and debug dumps)
    pub fn dump(&self) -> BTreeMap<String, String> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}
