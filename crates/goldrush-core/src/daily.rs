//! ============================================================================
//! Daily Progress - Day-scoped counters behind the two reward tiers
//! ============================================================================
//! - **Tier 1 (Daily Reward)**: 500+ points today
//! - **Tier 2 (Bonus Reward)**: 5+ games of 1500+ points today
//!
//! Counters and claimed flags reset whenever the stored day key is not today.
//! ============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Points needed today for tier 1
pub const TIER1_POINTS_TARGET: u64 = 500;

/// A game at or above this final score counts towards tier 2
pub const HIGH_SCORE_THRESHOLD: u64 = 1500;

/// High-score games needed today for tier 2
pub const TIER2_GAMES_TARGET: u32 = 5;

/// Reward tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimTier {
    Tier1,
    Tier2,
}

impl ClaimTier {
    /// Map the displayed level number (1 or 2)
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Tier1),
            2 => Some(Self::Tier2),
            _ => None,
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            Self::Tier1 => 1,
            Self::Tier2 => 2,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Tier1 => "Daily Reward",
            Self::Tier2 => "Bonus Reward",
        }
    }
}

impl fmt::Display for ClaimTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level {}: {}", self.level(), self.display_name())
    }
}

/// Which tiers can be claimed right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ClaimEligibility {
    pub tier1: bool,
    pub tier2: bool,
}

impl ClaimEligibility {
    pub fn allows(&self, tier: ClaimTier) -> bool {
        match tier {
            ClaimTier::Tier1 => self.tier1,
            ClaimTier::Tier2 => self.tier2,
        }
    }

    pub fn any(&self) -> bool {
        self.tier1 || self.tier2
    }
}

/// Today's counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyProgress {
    pub day: NaiveDate,
    pub points_today: u64,
    pub games_played_today: u32,
    pub high_score_games_today: u32,
    pub claimed_tier1: bool,
    pub claimed_tier2: bool,
    /// Most recent day either tier was claimed (kept across resets)
    pub last_claim_day: Option<NaiveDate>,
}

impl DailyProgress {
    pub fn fresh(day: NaiveDate) -> Self {
        Self {
            day,
            points_today: 0,
            games_played_today: 0,
            high_score_games_today: 0,
            claimed_tier1: false,
            claimed_tier2: false,
            last_claim_day: None,
        }
    }

    /// Reset counters if `today` is a different day. Returns true on reset.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.day == today {
            return false;
        }
        let last_claim_day = self.last_claim_day;
        *self = Self::fresh(today);
        self.last_claim_day = last_claim_day;
        true
    }

    /// Add a finished game's (already multiplied) score
    pub fn record_game_result(&mut self, final_score: u64) {
        self.points_today = self.points_today.saturating_add(final_score);
        self.games_played_today = self.games_played_today.saturating_add(1);
        if final_score >= HIGH_SCORE_THRESHOLD {
            self.high_score_games_today = self.high_score_games_today.saturating_add(1);
        }
    }

    pub fn eligibility(&self) -> ClaimEligibility {
        ClaimEligibility {
            tier1: self.points_today >= TIER1_POINTS_TARGET && !self.claimed_tier1,
            tier2: self.high_score_games_today >= TIER2_GAMES_TARGET && !self.claimed_tier2,
        }
    }

    /// Record a claim; verification happens before this is called
    pub fn mark_claimed(&mut self, tier: ClaimTier, today: NaiveDate) {
        match tier {
            ClaimTier::Tier1 => self.claimed_tier1 = true,
            ClaimTier::Tier2 => self.claimed_tier2 = true,
        }
        self.last_claim_day = Some(today);
    }

    pub fn is_claimed(&self, tier: ClaimTier) -> bool {
        match tier {
            ClaimTier::Tier1 => self.claimed_tier1,
            ClaimTier::Tier2 => self.claimed_tier2,
        }
    }

    /// Status line for the claim panel
    pub fn status_message(&self) -> String {
        if self.claimed_tier1 && self.claimed_tier2 {
            "🎉 You already claimed everything today! Come back tomorrow.".to_string()
        } else if self.eligibility().any() {
            "You have rewards available!".to_string()
        } else {
            format!(
                "Progress: {}/{} points • {}/{} games of {}+",
                self.points_today,
                TIER1_POINTS_TARGET,
                self.high_score_games_today,
                TIER2_GAMES_TARGET,
                HIGH_SCORE_THRESHOLD
            )
        }
    }

    /// Tier 1 progress in 0..=100
    pub fn tier1_percent(&self) -> u8 {
        percent(self.points_today, TIER1_POINTS_TARGET)
    }

    /// Tier 2 progress in 0..=100
    pub fn tier2_percent(&self) -> u8 {
        percent(self.high_score_games_today as u64, TIER2_GAMES_TARGET as u64)
    }
}

fn percent(value: u64, target: u64) -> u8 {
    if target == 0 {
        return 100;
    }
    ((value.min(target) * 100) / target) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn test_high_score_threshold_inclusive() {
        let mut progress = DailyProgress::fresh(day(1));
        progress.record_game_result(1500);
        assert_eq!(progress.high_score_games_today, 1);

        progress.record_game_result(1499);
        assert_eq!(progress.high_score_games_today, 1);
        assert_eq!(progress.games_played_today, 2);
        assert_eq!(progress.points_today, 2999);
    }

    #[test]
    fn test_eligibility_and_claim() {
        let mut progress = DailyProgress::fresh(day(1));
        progress.record_game_result(499);
        assert_eq!(progress.eligibility(), ClaimEligibility { tier1: false, tier2: false });

        progress.record_game_result(1);
        assert!(progress.eligibility().tier1);

        progress.mark_claimed(ClaimTier::Tier1, day(1));
        assert!(!progress.eligibility().tier1);
        assert_eq!(progress.last_claim_day, Some(day(1)));

        for _ in 0..5 {
            progress.record_game_result(2000);
        }
        assert_eq!(progress.eligibility(), ClaimEligibility { tier1: false, tier2: true });
    }

    #[test]
    fn test_rollover_resets_once() {
        let mut progress = DailyProgress::fresh(day(1));
        for _ in 0..5 {
            progress.record_game_result(1600);
        }
        progress.mark_claimed(ClaimTier::Tier1, day(1));
        progress.mark_claimed(ClaimTier::Tier2, day(1));

        assert!(!progress.roll_over(day(1)));
        assert_eq!(progress.games_played_today, 5);

        assert!(progress.roll_over(day(2)));
        assert_eq!(progress.points_today, 0);
        assert_eq!(progress.games_played_today, 0);
        assert_eq!(progress.high_score_games_today, 0);
        assert!(!progress.claimed_tier1);
        assert!(!progress.claimed_tier2);
        assert_eq!(progress.last_claim_day, Some(day(1)));

        assert!(!progress.roll_over(day(2)));
    }

    #[test]
    fn test_status_messages() {
        let mut progress = DailyProgress::fresh(day(1));
        progress.record_game_result(1600);
        assert_eq!(progress.status_message(), "You have rewards available!");

        progress.mark_claimed(ClaimTier::Tier1, day(1));
        assert_eq!(
            progress.status_message(),
            "Progress: 1600/500 points • 1/5 games of 1500+"
        );

        progress.mark_claimed(ClaimTier::Tier2, day(1));
        assert!(progress.status_message().contains("already claimed everything"));
    }

    #[test]
    fn test_percent_clamped() {
        let mut progress = DailyProgress::fresh(day(1));
        progress.record_game_result(250);
        assert_eq!(progress.tier1_percent(), 50);
        progress.record_game_result(5000);
        assert_eq!(progress.tier1_percent(), 100);
        assert_eq!(progress.tier2_percent(), 20);
    }

    #[test]
    fn test_tier_levels() {
        assert_eq!(ClaimTier::from_level(1), Some(ClaimTier::Tier1));
        assert_eq!(ClaimTier::from_level(3), None);
        assert_eq!(ClaimTier::Tier2.to_string(), "Level 2: Bonus Reward");
    }
}
