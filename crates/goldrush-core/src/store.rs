//! ============================================================================
//! Game Store - Single owner of the player's economy state
//! ============================================================================
//! Holds the ledger, active power-ups, daily progress, login streak and play
//! cooldown. Every mutation:
//! 1. updates the in-memory state
//! 2. writes the affected keys to the key-value backend (best-effort)
//! 3. publishes a `StoreEvent`
//!
//! Shared across tasks as `Arc<tokio::sync::Mutex<GameStore>>`.
//! ============================================================================

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::catalog::items;
use crate::clock::{day_key, parse_day_key, Clock};
use crate::config::GameConfig;
use crate::daily::{ClaimEligibility, ClaimTier, DailyProgress};
use crate::error::{GameError, PurchaseError};
use crate::events::{EventBus, StoreEvent};
use crate::ledger::{InventoryEntry, Ledger, PrecisionAccounting};
use crate::powerups::{ActivePowerUp, PowerUpKind, PowerUpTracker};
use crate::storage::{keys, KeyValueStore};
use crate::streak::{LoginStreak, PlayCooldown};

/// Store handle shared between the game, the shop and the sweeper
pub type SharedStore = Arc<Mutex<GameStore>>;

pub struct GameStore {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ledger: Ledger,
    powerups: PowerUpTracker,
    progress: DailyProgress,
    streak: LoginStreak,
    cooldown: PlayCooldown,
    credited_references: BTreeSet<String>,
    muted: bool,
    events: EventBus,
}

impl GameStore {
    /// Load every persisted value, register today's login and roll the
    /// daily counters over if the stored day is stale. Unreadable values
    /// fall back to defaults.
    pub fn open(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, config: &GameConfig) -> Self {
        let now = clock.now_ms();
        let today = clock.today();

        let inventory: Vec<InventoryEntry> =
            load_json(kv.as_ref(), keys::INVENTORY).unwrap_or_default();
        let ledger = Ledger::from_entries(inventory, config.precision_accounting);

        let active: Vec<ActivePowerUp> =
            load_json(kv.as_ref(), keys::ACTIVE_POWERUPS).unwrap_or_default();
        let powerups = PowerUpTracker::from_snapshot(active, now);

        let stored_day = read_raw(kv.as_ref(), keys::PROGRESS_DAY).and_then(|raw| parse_day_key(&raw));
        let last_claim_day =
            read_raw(kv.as_ref(), keys::LAST_CLAIM).and_then(|raw| parse_day_key(&raw));
        let progress = DailyProgress {
            // A missing day key counts as stale so counters start clean
            day: stored_day.unwrap_or_else(|| today.pred_opt().unwrap_or(today)),
            points_today: load_parsed(kv.as_ref(), keys::DAILY_SCORE).unwrap_or(0),
            games_played_today: load_parsed(kv.as_ref(), keys::GAMES_PLAYED).unwrap_or(0),
            high_score_games_today: load_parsed(kv.as_ref(), keys::HIGH_SCORE_GAMES).unwrap_or(0),
            claimed_tier1: load_parsed(kv.as_ref(), keys::CLAIMED_LEVEL1).unwrap_or(false),
            claimed_tier2: load_parsed(kv.as_ref(), keys::CLAIMED_LEVEL2).unwrap_or(false),
            last_claim_day,
        };

        let streak = LoginStreak {
            last_login: read_raw(kv.as_ref(), keys::LAST_LOGIN).and_then(|raw| parse_day_key(&raw)),
            days: load_parsed(kv.as_ref(), keys::LOGIN_STREAK).unwrap_or(0),
        };
        let cooldown = PlayCooldown {
            next_free_game_at: load_parsed(kv.as_ref(), keys::NEXT_GAME_TIME),
        };
        let credited_references: BTreeSet<String> =
            load_json(kv.as_ref(), keys::CREDITED_REFERENCES).unwrap_or_default();
        let muted = load_parsed(kv.as_ref(), keys::MUTED).unwrap_or(config.muted);

        let mut store = Self {
            kv,
            clock,
            ledger,
            powerups,
            progress,
            streak,
            cooldown,
            credited_references,
            muted,
            events: EventBus::new(),
        };

        store.roll_over_if_needed();
        store.record_login();
        store.persist_power_ups();

        info!(
            "Game store opened: {} inventory entries, {} active power-ups, streak {} days",
            store.ledger.entries().len(),
            store.powerups.entries().len(),
            store.streak.days
        );
        store
    }

    /// Wrap for sharing between tasks
    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    /// Write every value back; the only store call that reports failures
    pub fn flush(&mut self) -> Result<()> {
        self.powerups.sweep(self.clock.now_ms());
        let writes = self.snapshot_values()?;
        for (key, value) in writes {
            self.kv
                .set(key, &value)
                .map_err(|e| anyhow!("Failed to flush {}: {}", key, e))?;
        }
        debug!("Game store flushed");
        Ok(())
    }

    /// Remove every persisted key and start over with empty state
    pub fn reset(&mut self) -> Result<()> {
        for key in keys::ALL {
            self.kv
                .remove(key)
                .map_err(|e| anyhow!("Failed to remove {}: {}", key, e))?;
        }
        let today = self.clock.today();
        self.ledger = Ledger::new(self.ledger.accounting());
        self.powerups = PowerUpTracker::new();
        self.progress = DailyProgress::fresh(today);
        self.streak = LoginStreak::default();
        self.cooldown = PlayCooldown::default();
        self.credited_references.clear();
        self.muted = false;
        warn!("Game store reset");
        Ok(())
    }

    /// Raw persisted value of every known key
    pub fn export(&self) -> Vec<(&'static str, Option<String>)> {
        keys::ALL
            .iter()
            .map(|key| (*key, read_raw(self.kv.as_ref(), key)))
            .collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn emit(&self, event: StoreEvent) {
        self.events.emit(event);
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ------------------------------------------------------------------------
    // Inventory
    // ------------------------------------------------------------------------

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn quantity_of(&self, item_id: &str) -> u32 {
        self.ledger.quantity_of(item_id)
    }

    pub fn precision_uses(&self) -> u32 {
        self.ledger.precision_uses()
    }

    pub fn precision_accounting(&self) -> PrecisionAccounting {
        self.ledger.accounting()
    }

    pub fn credit(&mut self, item_id: &str, quantity: u32) {
        if quantity == 0 {
            return;
        }
        self.ledger.credit(item_id, quantity);
        self.inventory_changed(item_id);
    }

    pub fn debit(&mut self, item_id: &str, quantity: u32) {
        if quantity == 0 {
            return;
        }
        self.ledger.debit(item_id, quantity);
        self.inventory_changed(item_id);
    }

    /// Spend one unit; false (and no write) when none is held
    pub fn consume_one(&mut self, item_id: &str) -> bool {
        if !self.ledger.consume_one(item_id) {
            return false;
        }
        self.inventory_changed(item_id);
        true
    }

    pub fn has_credited(&self, reference: &str) -> bool {
        self.credited_references.contains(reference)
    }

    /// Credit a verified purchase exactly once per reference
    pub fn credit_purchase(
        &mut self,
        reference: &str,
        credits: &[(&str, u32)],
    ) -> Result<(), PurchaseError> {
        if self.has_credited(reference) {
            warn!("Refusing duplicate credit for reference {}", reference);
            return Err(PurchaseError::AlreadyCredited(reference.to_string()));
        }

        for (item_id, quantity) in credits {
            self.ledger.credit(item_id, *quantity);
        }
        self.credited_references.insert(reference.to_string());

        self.persist_inventory();
        self.persist_json(keys::CREDITED_REFERENCES, &self.credited_references);
        for (item_id, _) in credits {
            self.emit(StoreEvent::InventoryChanged {
                item_id: item_id.to_string(),
                quantity: self.ledger.quantity_of(item_id),
            });
        }
        info!("Credited purchase {} ({} ledger items)", reference, credits.len());
        Ok(())
    }

    fn inventory_changed(&mut self, item_id: &str) {
        self.persist_inventory();
        self.emit(StoreEvent::InventoryChanged {
            item_id: item_id.to_string(),
            quantity: self.ledger.quantity_of(item_id),
        });
    }

    // ------------------------------------------------------------------------
    // Power-ups
    // ------------------------------------------------------------------------

    pub fn active_power_ups(&mut self) -> &[ActivePowerUp] {
        self.sweep_power_ups();
        self.powerups.entries()
    }

    /// Spend the matching item and start the power-up for its default length
    pub fn activate_power_up(&mut self, kind: PowerUpKind) -> Result<ActivePowerUp, GameError> {
        self.activate_power_up_for(kind, kind.default_duration_ms())
    }

    pub fn activate_power_up_for(
        &mut self,
        kind: PowerUpKind,
        duration_ms: i64,
    ) -> Result<ActivePowerUp, GameError> {
        if self.is_power_up_active(kind) {
            return Err(GameError::AlreadyActive(kind));
        }
        let item_id = kind.ledger_item();
        if !self.consume_one(item_id) {
            return Err(GameError::OutOfItem(item_id.to_string()));
        }

        let entry = self.powerups.push(kind, duration_ms, self.clock.now_ms());
        self.persist_power_ups();
        self.emit(StoreEvent::PowerUpActivated {
            kind,
            expires_at: entry.expires_at,
        });
        info!("Activated {} until {}", kind, entry.expires_at);
        Ok(entry)
    }

    pub fn is_power_up_active(&mut self, kind: PowerUpKind) -> bool {
        self.sweep_power_ups();
        self.powerups.is_active(kind, self.clock.now_ms())
    }

    pub fn power_up_remaining_ms(&mut self, kind: PowerUpKind) -> Option<i64> {
        self.sweep_power_ups();
        self.powerups.remaining_ms(kind, self.clock.now_ms())
    }

    /// Drop expired entries, persisting and announcing only on change
    pub fn sweep_power_ups(&mut self) -> Vec<PowerUpKind> {
        let expired = self.powerups.sweep(self.clock.now_ms());
        if !expired.is_empty() {
            self.persist_power_ups();
            for kind in &expired {
                debug!("Power-up {} expired", kind);
                self.emit(StoreEvent::PowerUpExpired { kind: *kind });
            }
        }
        expired
    }

    /// Clear one kind (or all) regardless of expiry
    pub fn reset_power_ups(&mut self, kind: Option<PowerUpKind>) -> usize {
        let removed = self.powerups.reset(kind);
        self.persist_power_ups();
        self.emit(StoreEvent::PowerUpsReset { kind, removed });
        removed
    }

    // ------------------------------------------------------------------------
    // Daily progress
    // ------------------------------------------------------------------------

    /// Today's counters, resetting first if the day changed
    pub fn progress(&mut self) -> &DailyProgress {
        self.roll_over_if_needed();
        &self.progress
    }

    /// Returns true if the stored day was stale and counters were reset
    pub fn roll_over_if_needed(&mut self) -> bool {
        let today = self.clock.today();
        if !self.progress.roll_over(today) {
            return false;
        }
        self.persist_progress();
        info!("Daily progress reset for {}", day_key(today));
        self.emit(StoreEvent::DayRolledOver { day: today });
        true
    }

    pub fn record_game_result(&mut self, final_score: u64) {
        self.roll_over_if_needed();
        self.progress.record_game_result(final_score);
        self.persist_progress();
        info!(
            "Recorded game: {} points (today {} points, {} games)",
            final_score, self.progress.points_today, self.progress.games_played_today
        );
        self.emit(StoreEvent::ProgressUpdated {
            points_today: self.progress.points_today,
            games_played_today: self.progress.games_played_today,
            high_score_games_today: self.progress.high_score_games_today,
        });
    }

    pub fn claim_eligibility(&mut self) -> ClaimEligibility {
        self.roll_over_if_needed();
        self.progress.eligibility()
    }

    /// Set the claimed flag; identity verification has already passed
    pub fn mark_claimed(&mut self, tier: ClaimTier) {
        self.roll_over_if_needed();
        let today = self.clock.today();
        self.progress.mark_claimed(tier, today);
        self.persist_progress();
        info!("{} claimed", tier);
        self.emit(StoreEvent::RewardClaimed { tier });
    }

    // ------------------------------------------------------------------------
    // Streak, cooldown, settings
    // ------------------------------------------------------------------------

    pub fn streak(&self) -> &LoginStreak {
        &self.streak
    }

    /// Register a login today; persisted only when the streak moves
    pub fn record_login(&mut self) -> bool {
        let today = self.clock.today();
        if !self.streak.record_login(today) {
            return false;
        }
        self.persist(keys::LAST_LOGIN, &day_key(today));
        self.persist(keys::LOGIN_STREAK, &self.streak.days.to_string());
        debug!("Login streak now {} days", self.streak.days);
        self.emit(StoreEvent::StreakUpdated { days: self.streak.days });
        true
    }

    pub fn extra_plays(&self) -> u32 {
        self.ledger.quantity_of(items::EXTRA_PLAYS)
    }

    pub fn cooldown(&self) -> &PlayCooldown {
        &self.cooldown
    }

    /// Time until the next free game, `None` when one is available
    pub fn cooldown_remaining_ms(&mut self) -> Option<i64> {
        let now = self.clock.now_ms();
        if self.cooldown.clear_expired(now) {
            self.persist_cooldown();
            self.emit(StoreEvent::CooldownChanged { next_free_game_at: None });
        }
        self.cooldown.remaining_ms(now)
    }

    pub fn start_cooldown(&mut self) {
        self.cooldown.start(self.clock.now_ms());
        self.persist_cooldown();
        self.emit(StoreEvent::CooldownChanged {
            next_free_game_at: self.cooldown.next_free_game_at,
        });
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.persist(keys::MUTED, &muted.to_string());
        self.emit(StoreEvent::SettingsChanged { muted });
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    fn snapshot_values(&self) -> Result<Vec<(&'static str, String)>> {
        let mut values = vec![
            (
                keys::INVENTORY,
                serde_json::to_string(self.ledger.entries())
                    .map_err(|e| anyhow!("Failed to serialize inventory: {}", e))?,
            ),
            (
                keys::ACTIVE_POWERUPS,
                serde_json::to_string(self.powerups.entries())
                    .map_err(|e| anyhow!("Failed to serialize power-ups: {}", e))?,
            ),
            (
                keys::CREDITED_REFERENCES,
                serde_json::to_string(&self.credited_references)
                    .map_err(|e| anyhow!("Failed to serialize references: {}", e))?,
            ),
            (keys::MUTED, self.muted.to_string()),
            (keys::LOGIN_STREAK, self.streak.days.to_string()),
        ];
        values.extend(self.progress_values());
        if let Some(last) = self.streak.last_login {
            values.push((keys::LAST_LOGIN, day_key(last)));
        }
        if let Some(at) = self.cooldown.next_free_game_at {
            values.push((keys::NEXT_GAME_TIME, at.to_string()));
        }
        Ok(values)
    }

    fn progress_values(&self) -> Vec<(&'static str, String)> {
        let mut values = vec![
            (keys::PROGRESS_DAY, day_key(self.progress.day)),
            (keys::DAILY_SCORE, self.progress.points_today.to_string()),
            (keys::GAMES_PLAYED, self.progress.games_played_today.to_string()),
            (keys::HIGH_SCORE_GAMES, self.progress.high_score_games_today.to_string()),
            (keys::CLAIMED_LEVEL1, self.progress.claimed_tier1.to_string()),
            (keys::CLAIMED_LEVEL2, self.progress.claimed_tier2.to_string()),
        ];
        if let Some(day) = self.progress.last_claim_day {
            values.push((keys::LAST_CLAIM, day_key(day)));
        }
        values
    }

    fn persist(&self, key: &str, value: &str) {
        if let Err(e) = self.kv.set(key, value) {
            warn!("Failed to persist {}: {}", key, e);
        }
    }

    fn persist_json<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.persist(key, &json),
            Err(e) => warn!("Failed to serialize {}: {}", key, e),
        }
    }

    fn persist_inventory(&self) {
        self.persist_json(keys::INVENTORY, self.ledger.entries());
    }

    fn persist_power_ups(&self) {
        self.persist_json(keys::ACTIVE_POWERUPS, self.powerups.entries());
    }

    fn persist_progress(&self) {
        for (key, value) in self.progress_values() {
            self.persist(key, &value);
        }
    }

    fn persist_cooldown(&self) {
        let result = match self.cooldown.next_free_game_at {
            Some(at) => self.kv.set(keys::NEXT_GAME_TIME, &at.to_string()),
            None => self.kv.remove(keys::NEXT_GAME_TIME),
        };
        if let Err(e) = result {
            warn!("Failed to persist {}: {}", keys::NEXT_GAME_TIME, e);
        }
    }
}

/// Periodically drop expired power-ups until the handle is aborted
pub fn spawn_sweeper(store: SharedStore, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let expired = store.lock().await.sweep_power_ups();
            if !expired.is_empty() {
                debug!("Sweeper removed {} expired power-ups", expired.len());
            }
        }
    })
}

fn read_raw(kv: &dyn KeyValueStore, key: &str) -> Option<String> {
    match kv.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to read {}: {}", key, e);
            None
        }
    }
}

fn load_json<T: DeserializeOwned>(kv: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = read_raw(kv, key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring unreadable {}: {}", key, e);
            None
        }
    }
}

fn load_parsed<T: FromStr>(kv: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = read_raw(kv, key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unreadable {}: {:?}", key, raw);
            None
        }
    }
}
