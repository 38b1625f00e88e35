//! Read-only views of the store for HUDs and the CLI.

use serde::Serialize;

use crate::catalog::items;
use crate::daily::{ClaimEligibility, TIER1_POINTS_TARGET, TIER2_GAMES_TARGET};
use crate::powerups::PowerUpKind;
use crate::store::GameStore;
use crate::streak::format_countdown;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventorySummary {
    pub tnt: u32,
    pub timer_boosts: u32,
    pub precision_packs: u32,
    pub precision_uses: u32,
    pub extra_plays: u32,
}

impl InventorySummary {
    pub fn from_store(store: &GameStore) -> Self {
        Self {
            tnt: store.quantity_of(items::TNT_PACK),
            timer_boosts: store.quantity_of(items::TIMER_BOOST),
            precision_packs: store.quantity_of(items::PRECISION_PACK),
            precision_uses: store.precision_uses(),
            extra_plays: store.extra_plays(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub day: String,
    pub points_today: u64,
    pub points_target: u64,
    pub tier1_percent: u8,
    pub games_played_today: u32,
    pub high_score_games_today: u32,
    pub high_score_games_target: u32,
    pub tier2_percent: u8,
    pub claimed_tier1: bool,
    pub claimed_tier2: bool,
    pub eligibility: ClaimEligibility,
    pub message: String,
}

impl ProgressSummary {
    pub fn from_store(store: &mut GameStore) -> Self {
        let progress = store.progress();
        Self {
            day: crate::clock::day_key(progress.day),
            points_today: progress.points_today,
            points_target: TIER1_POINTS_TARGET,
            tier1_percent: progress.tier1_percent(),
            games_played_today: progress.games_played_today,
            high_score_games_today: progress.high_score_games_today,
            high_score_games_target: TIER2_GAMES_TARGET,
            tier2_percent: progress.tier2_percent(),
            claimed_tier1: progress.claimed_tier1,
            claimed_tier2: progress.claimed_tier2,
            eligibility: progress.eligibility(),
            message: progress.status_message(),
        }
    }
}

/// Everything the start screen shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub inventory: InventorySummary,
    pub progress: ProgressSummary,
    pub streak_days: u32,
    pub streak_bonus_pct: u32,
    pub next_free_game_in: Option<String>,
    pub precision_remaining_ms: Option<i64>,
    pub muted: bool,
}

impl StoreSummary {
    pub fn collect(store: &mut GameStore) -> Self {
        let progress = ProgressSummary::from_store(store);
        let next_free_game_in = store.cooldown_remaining_ms().map(format_countdown);
        let precision_remaining_ms = store.power_up_remaining_ms(PowerUpKind::Precision);
        let streak = *store.streak();
        Self {
            inventory: InventorySummary::from_store(store),
            progress,
            streak_days: streak.days,
            streak_bonus_pct: streak.bonus_pct(),
            next_free_game_in,
            precision_remaining_ms,
            muted: store.muted(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::GameConfig;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;
    use std::sync::Arc;

    #[test]
    fn test_summary_reflects_store() {
        let clock = Arc::new(ManualClock::at_date(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()));
        let mut store = GameStore::open(Arc::new(MemoryStore::new()), clock, &GameConfig::default());
        store.credit(items::PRECISION_PACK, 2);
        store.credit(items::EXTRA_PLAYS, 1);
        store.record_game_result(250);
        store.start_cooldown();

        let summary = StoreSummary::collect(&mut store);
        assert_eq!(
            summary.inventory,
            InventorySummary {
                tnt: 0,
                timer_boosts: 0,
                precision_packs: 2,
                precision_uses: 6,
                extra_plays: 2,
            }
        );
        assert_eq!(summary.progress.day, "2026-09-01");
        assert_eq!(summary.progress.tier1_percent, 50);
        assert_eq!(summary.streak_days, 1);
        assert_eq!(summary.streak_bonus_pct, 10);
        assert_eq!(summary.next_free_game_in.as_deref(), Some("60:00"));
        assert_eq!(summary.precision_remaining_ms, None);
    }
}
