//! One play session: entry rules, taps, item use and end-of-game scoring.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

use super::playfield::{hit_margin, FallingItem, Playfield, SPAWN_INTERVAL_MS};
use crate::catalog::items;
use crate::error::GameError;
use crate::powerups::PowerUpKind;
use crate::store::GameStore;

/// Session length before boosts
pub const BASE_DURATION_SECS: u32 = 60;

/// Seconds added per timer boost
pub const TIMER_BOOST_SECS: u32 = 30;

/// How the session was paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEntry {
    ExtraPlay,
    FreeGame,
}

/// Outcome of a tap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TapResult {
    pub hits: Vec<FallingItem>,
    pub score: u64,
}

/// Final tally handed to daily progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameResult {
    pub raw_score: u64,
    pub streak_days: u32,
    pub bonus_pct: u32,
    pub final_score: u64,
    pub recorded: bool,
    pub entry: SessionEntry,
}

pub struct GameSession {
    playfield: Playfield,
    rng: StdRng,
    score: u64,
    time_left_secs: u32,
    entry: SessionEntry,
    last_spawn_ms: Option<i64>,
    running: bool,
}

impl GameSession {
    /// Start a session with an entropy-seeded spawner
    pub fn start(store: &mut GameStore) -> Result<Self, GameError> {
        Self::start_with_rng(store, StdRng::from_entropy())
    }

    /// Spend an extra play if one is held, otherwise require the free game
    /// cooldown to have run out. Precision is switched on when uses remain.
    pub fn start_with_rng(store: &mut GameStore, rng: StdRng) -> Result<Self, GameError> {
        let entry = if store.consume_one(items::EXTRA_PLAYS) {
            SessionEntry::ExtraPlay
        } else if let Some(remaining_ms) = store.cooldown_remaining_ms() {
            return Err(GameError::CooldownActive { remaining_ms });
        } else {
            SessionEntry::FreeGame
        };

        if store.precision_uses() > 0 && !store.is_power_up_active(PowerUpKind::Precision) {
            if let Err(e) = store.activate_power_up(PowerUpKind::Precision) {
                debug!("Precision not activated at start: {}", e);
            }
        }

        info!(
            "Game started ({:?}, {} extra plays left)",
            entry,
            store.extra_plays()
        );
        Ok(Self {
            playfield: Playfield::new(),
            rng,
            score: 0,
            time_left_secs: BASE_DURATION_SECS,
            entry,
            last_spawn_ms: None,
            running: true,
        })
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn time_left_secs(&self) -> u32 {
        self.time_left_secs
    }

    pub fn entry(&self) -> SessionEntry {
        self.entry
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn playfield(&self) -> &Playfield {
        &self.playfield
    }

    /// Direct access for scripted placements
    pub fn playfield_mut(&mut self) -> &mut Playfield {
        &mut self.playfield
    }

    /// Spawn an item if the spawn interval has elapsed. Returns true on spawn.
    pub fn spawn_due(&mut self, now_ms: i64) -> bool {
        if !self.running {
            return false;
        }
        let due = self
            .last_spawn_ms
            .map_or(true, |last| now_ms - last >= SPAWN_INTERVAL_MS);
        if due {
            self.playfield.spawn(&mut self.rng, now_ms);
            self.last_spawn_ms = Some(now_ms);
        }
        due
    }

    /// One 60 Hz motion tick
    pub fn advance_frame(&mut self) -> usize {
        if !self.running {
            return 0;
        }
        self.playfield.advance()
    }

    /// Count down one second; returns false once time is up
    pub fn tick_second(&mut self) -> bool {
        if self.running && self.time_left_secs > 0 {
            self.time_left_secs -= 1;
        }
        self.running && self.time_left_secs > 0
    }

    /// Hit every item under (x, y)
    pub fn tap(&mut self, store: &mut GameStore, x: f32, y: f32) -> Result<TapResult, GameError> {
        if !self.running {
            return Err(GameError::NotRunning);
        }
        let margin = hit_margin(store.is_power_up_active(PowerUpKind::Precision));
        let hits = self.playfield.take_hits(x, y, margin);
        for hit in &hits {
            self.score = hit.kind.apply(self.score);
        }
        if !hits.is_empty() {
            debug!("Tap hit {} items, score {}", hits.len(), self.score);
        }
        Ok(TapResult {
            hits,
            score: self.score,
        })
    }

    /// Spend one TNT and remove every rock. Returns the rocks removed.
    pub fn use_tnt(&mut self, store: &mut GameStore) -> Result<usize, GameError> {
        if !self.running {
            return Err(GameError::NotRunning);
        }
        if !store.consume_one(items::TNT_PACK) {
            return Err(GameError::OutOfItem(items::TNT_PACK.to_string()));
        }
        let removed = self.playfield.clear_rocks();
        info!("TNT cleared {} rocks", removed);
        Ok(removed)
    }

    /// Spend one timer boost. Returns the new time left.
    pub fn use_timer_boost(&mut self, store: &mut GameStore) -> Result<u32, GameError> {
        if !self.running {
            return Err(GameError::NotRunning);
        }
        if !store.consume_one(items::TIMER_BOOST) {
            return Err(GameError::OutOfItem(items::TIMER_BOOST.to_string()));
        }
        self.time_left_secs += TIMER_BOOST_SECS;
        info!("Timer boost: {}s left", self.time_left_secs);
        Ok(self.time_left_secs)
    }

    /// Manually switch precision on mid-game
    pub fn use_precision(&mut self, store: &mut GameStore) -> Result<i64, GameError> {
        if !self.running {
            return Err(GameError::NotRunning);
        }
        store
            .activate_power_up(PowerUpKind::Precision)
            .map(|active| active.expires_at)
    }

    /// End the session and clear every running power-up. A non-zero final
    /// score (after the streak bonus) is recorded and, when no extra plays
    /// remain, starts the free game cooldown. A scoreless session leaves both
    /// untouched.
    pub fn finish(&mut self, store: &mut GameStore) -> Result<GameResult, GameError> {
        if !self.running {
            return Err(GameError::NotRunning);
        }
        self.running = false;
        self.playfield.clear();

        let streak = *store.streak();
        let final_score = streak.apply(self.score);
        let recorded = final_score > 0;
        if recorded {
            store.record_game_result(final_score);
            if store.extra_plays() == 0 {
                store.start_cooldown();
            }
        }
        store.reset_power_ups(None);

        info!(
            "Game over: {} raw, {} final ({}% streak bonus)",
            self.score,
            final_score,
            streak.bonus_pct()
        );
        Ok(GameResult {
            raw_score: self.score,
            streak_days: streak.days,
            bonus_pct: streak.bonus_pct(),
            final_score,
            recorded,
            entry: self.entry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::config::GameConfig;
    use crate::game::playfield::ItemType;
    use crate::storage::{keys, KeyValueStore, MemoryStore};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn open(kv: &Arc<MemoryStore>, clock: &Arc<ManualClock>) -> GameStore {
        GameStore::open(kv.clone(), clock.clone(), &GameConfig::default())
    }

    fn start_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 10).unwrap()
    }

    fn mine_one_nugget(session: &mut GameSession, store: &mut GameStore) {
        session.playfield_mut().place(ItemType::Gold, 0.0, 0.0, 2.0);
        assert_eq!(session.tap(store, 20.0, 20.0).unwrap().hits.len(), 1);
    }

    #[test]
    fn test_scoring_with_streak_bonus() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at_date(start_day()));
        drop(open(&kv, &clock));
        clock.advance_days(1);
        let mut store = open(&kv, &clock);
        assert_eq!(store.streak().days, 2);

        let mut session = GameSession::start_with_rng(&mut store, seeded()).unwrap();
        let field = session.playfield_mut();
        field.place(ItemType::Gold, 0.0, 0.0, 2.0);
        field.place(ItemType::Diamond, 100.0, 0.0, 1.5);
        field.place(ItemType::Rock, 200.0, 0.0, 2.0);
        field.place(ItemType::Rock, 300.0, 0.0, 2.0);

        for x in [20.0, 125.0, 220.0, 320.0] {
            assert_eq!(session.tap(&mut store, x, 20.0).unwrap().hits.len(), 1);
        }
        assert_eq!(session.score(), 50);

        let result = session.finish(&mut store).unwrap();
        assert_eq!(result.bonus_pct, 20);
        assert_eq!(result.final_score, 60);
        assert_eq!(store.progress().points_today, 60);
        assert_eq!(store.progress().games_played_today, 1);
    }

    #[test]
    fn test_rocks_cannot_drive_score_negative() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at_date(start_day()));
        let mut store = open(&kv, &clock);
        let mut session = GameSession::start_with_rng(&mut store, seeded()).unwrap();

        session.playfield_mut().place(ItemType::Gold, 0.0, 0.0, 2.0);
        session.playfield_mut().place(ItemType::Rock, 50.0, 100.0, 2.0);
        session.playfield_mut().place(ItemType::Rock, 150.0, 100.0, 2.0);
        session.tap(&mut store, 10.0, 10.0).unwrap();
        session.tap(&mut store, 60.0, 110.0).unwrap();
        session.tap(&mut store, 160.0, 110.0).unwrap();
        assert_eq!(session.score(), 0);

        let result = session.finish(&mut store).unwrap();
        assert!(!result.recorded);
        assert_eq!(store.progress().games_played_today, 0);
    }

    #[test]
    fn test_scoreless_game_keeps_free_game() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at_date(start_day()));
        let mut store = open(&kv, &clock);

        let mut session = GameSession::start_with_rng(&mut store, seeded()).unwrap();
        assert_eq!(session.entry(), SessionEntry::FreeGame);
        let result = session.finish(&mut store).unwrap();
        assert!(!result.recorded);

        assert_eq!(store.cooldown_remaining_ms(), None);
        assert_eq!(kv.get(keys::NEXT_GAME_TIME).unwrap(), None);
        let again = GameSession::start_with_rng(&mut store, seeded()).unwrap();
        assert_eq!(again.entry(), SessionEntry::FreeGame);
    }

    #[test]
    fn test_cooldown_after_free_game() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at_date(start_day()));
        let mut store = open(&kv, &clock);

        let mut session = GameSession::start_with_rng(&mut store, seeded()).unwrap();
        assert_eq!(session.entry(), SessionEntry::FreeGame);
        mine_one_nugget(&mut session, &mut store);
        session.finish(&mut store).unwrap();

        match GameSession::start_with_rng(&mut store, seeded()) {
            Err(GameError::CooldownActive { remaining_ms }) => assert_eq!(remaining_ms, 3_600_000),
            other => panic!("expected cooldown, got {:?}", other.map(|s| s.score())),
        }

        clock.advance_ms(3_600_000);
        assert!(GameSession::start_with_rng(&mut store, seeded()).is_ok());
    }

    #[test]
    fn test_extra_play_bypasses_cooldown() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at_date(start_day()));
        let mut store = open(&kv, &clock);
        store.start_cooldown();
        store.credit(items::EXTRA_PLAYS, 1);

        let mut first = GameSession::start_with_rng(&mut store, seeded()).unwrap();
        assert_eq!(first.entry(), SessionEntry::ExtraPlay);
        assert_eq!(store.extra_plays(), 1);
        first.finish(&mut store).unwrap();

        let mut second = GameSession::start_with_rng(&mut store, seeded()).unwrap();
        assert_eq!(store.extra_plays(), 0);
        mine_one_nugget(&mut second, &mut store);
        second.finish(&mut store).unwrap();

        let next_game = kv.get(keys::NEXT_GAME_TIME).unwrap().unwrap();
        assert_eq!(next_game, (clock.now_ms() + 3_600_000).to_string());
        assert!(GameSession::start_with_rng(&mut store, seeded()).is_err());
    }

    #[test]
    fn test_precision_auto_activates_and_resets() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at_date(start_day()));
        let mut store = open(&kv, &clock);
        store.credit(items::PRECISION_PACK, 1);

        let mut session = GameSession::start_with_rng(&mut store, seeded()).unwrap();
        assert!(store.is_power_up_active(PowerUpKind::Precision));
        assert_eq!(store.precision_uses(), 2);

        // 14 px outside the rectangle is inside the enlarged margin
        session.playfield_mut().place(ItemType::Gold, 100.0, 100.0, 2.0);
        assert_eq!(session.tap(&mut store, 86.0, 120.0).unwrap().hits.len(), 1);

        session.finish(&mut store).unwrap();
        assert!(!store.is_power_up_active(PowerUpKind::Precision));
        assert_eq!(store.precision_uses(), 2);
    }

    #[test]
    fn test_tnt_and_timer_boost() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at_date(start_day()));
        let mut store = open(&kv, &clock);
        let mut session = GameSession::start_with_rng(&mut store, seeded()).unwrap();

        assert_eq!(
            session.use_tnt(&mut store),
            Err(GameError::OutOfItem(items::TNT_PACK.to_string()))
        );

        store.credit(items::TNT_PACK, 1);
        store.credit(items::TIMER_BOOST, 1);
        session.playfield_mut().place(ItemType::Rock, 0.0, 0.0, 2.0);
        session.playfield_mut().place(ItemType::Gold, 100.0, 0.0, 2.0);
        assert_eq!(session.use_tnt(&mut store), Ok(1));
        assert_eq!(session.playfield().items().len(), 1);
        assert_eq!(store.quantity_of(items::TNT_PACK), 0);

        assert_eq!(session.use_timer_boost(&mut store), Ok(90));
        assert_eq!(
            session.use_timer_boost(&mut store),
            Err(GameError::OutOfItem(items::TIMER_BOOST.to_string()))
        );
    }

    #[test]
    fn test_timer_runs_out() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at_date(start_day()));
        let mut store = open(&kv, &clock);
        let mut session = GameSession::start_with_rng(&mut store, seeded()).unwrap();

        let mut seconds = 0;
        while session.tick_second() {
            seconds += 1;
        }
        assert_eq!(seconds, BASE_DURATION_SECS - 1);
        assert_eq!(session.time_left_secs(), 0);

        session.finish(&mut store).unwrap();
        assert_eq!(session.tap(&mut store, 0.0, 0.0), Err(GameError::NotRunning));
        assert_eq!(session.finish(&mut store), Err(GameError::NotRunning));
    }

    #[test]
    fn test_spawn_interval() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at_date(start_day()));
        let mut store = open(&kv, &clock);
        let mut session = GameSession::start_with_rng(&mut store, seeded()).unwrap();

        assert!(session.spawn_due(0));
        assert!(!session.spawn_due(799));
        assert!(session.spawn_due(800));
        assert_eq!(session.playfield().items().len(), 2);
    }
}
