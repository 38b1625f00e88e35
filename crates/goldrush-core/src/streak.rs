//! ============================================================================
//! Login Streak & Play Cooldown
//! ============================================================================
//! The streak counts consecutive days with a login and adds 10% per day to
//! the final score (capped at 5 days). The cooldown spaces free games one
//! hour apart; extra plays bypass it.
//! ============================================================================

use chrono::NaiveDate;
use serde::Serialize;

/// Bonus percentage per streak day
pub const STREAK_BONUS_PER_DAY_PCT: u32 = 10;

/// Streak days that count towards the bonus
pub const STREAK_BONUS_MAX_DAYS: u32 = 5;

/// Wait between free games
pub const FREE_GAME_COOLDOWN_MS: i64 = 60 * 60 * 1000;

/// Consecutive-day login counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LoginStreak {
    pub last_login: Option<NaiveDate>,
    pub days: u32,
}

impl LoginStreak {
    /// Register a login on `today`. Returns true when the streak changed.
    pub fn record_login(&mut self, today: NaiveDate) -> bool {
        match self.last_login {
            Some(last) if last == today => {
                if self.days == 0 {
                    self.days = 1;
                    return true;
                }
                false
            }
            Some(last) if today.pred_opt() == Some(last) => {
                self.days = self.days.max(1).saturating_add(1);
                self.last_login = Some(today);
                true
            }
            _ => {
                self.days = 1;
                self.last_login = Some(today);
                true
            }
        }
    }

    /// Score bonus in percent (0..=50)
    pub fn bonus_pct(&self) -> u32 {
        self.days.min(STREAK_BONUS_MAX_DAYS) * STREAK_BONUS_PER_DAY_PCT
    }

    /// `floor(raw * (1 + bonus))` in integer arithmetic
    pub fn apply(&self, raw_score: u64) -> u64 {
        raw_score.saturating_mul(100 + self.bonus_pct() as u64) / 100
    }
}

/// When the next free game unlocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PlayCooldown {
    pub next_free_game_at: Option<i64>,
}

impl PlayCooldown {
    /// Start the cooldown after a free game
    pub fn start(&mut self, now_ms: i64) {
        self.next_free_game_at = Some(now_ms.saturating_add(FREE_GAME_COOLDOWN_MS));
    }

    /// Milliseconds until the next free game, `None` if available now
    pub fn remaining_ms(&self, now_ms: i64) -> Option<i64> {
        self.next_free_game_at
            .map(|at| at.saturating_sub(now_ms))
            .filter(|remaining| *remaining > 0)
    }

    /// Forget a cooldown that has run out. Returns true if one was cleared.
    pub fn clear_expired(&mut self, now_ms: i64) -> bool {
        if self.next_free_game_at.is_some() && self.remaining_ms(now_ms).is_none() {
            self.next_free_game_at = None;
            return true;
        }
        false
    }
}

/// `mm:ss` countdown display
pub fn format_countdown(remaining_ms: i64) -> String {
    let remaining = remaining_ms.max(0);
    let minutes = remaining / 60_000;
    let seconds = (remaining % 60_000) / 1000;
    format!("{:02}:{:02}", minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, d).unwrap()
    }

    #[test]
    fn test_first_login_starts_at_one() {
        let mut streak = LoginStreak::default();
        assert!(streak.record_login(day(1)));
        assert_eq!(streak.days, 1);
        assert!(!streak.record_login(day(1)));
        assert_eq!(streak.days, 1);
    }

    #[test]
    fn test_consecutive_days_increment() {
        let mut streak = LoginStreak::default();
        for d in 1..=7 {
            streak.record_login(day(d));
        }
        assert_eq!(streak.days, 7);
        assert_eq!(streak.bonus_pct(), 50);
    }

    #[test]
    fn test_skipped_day_resets() {
        let mut streak = LoginStreak::default();
        streak.record_login(day(1));
        streak.record_login(day(2));
        streak.record_login(day(4));
        assert_eq!(streak.days, 1);
        assert_eq!(streak.last_login, Some(day(4)));
    }

    #[test]
    fn test_bonus_applied_with_floor() {
        let streak = LoginStreak { last_login: Some(day(1)), days: 2 };
        assert_eq!(streak.bonus_pct(), 20);
        // gold + diamond - rock - rock
        assert_eq!(streak.apply(50), 60);
        assert_eq!(streak.apply(7), 8);

        let none = LoginStreak::default();
        assert_eq!(none.apply(123), 123);
    }

    #[test]
    fn test_cooldown() {
        let mut cooldown = PlayCooldown::default();
        assert_eq!(cooldown.remaining_ms(0), None);

        cooldown.start(1_000);
        assert_eq!(cooldown.remaining_ms(1_000), Some(FREE_GAME_COOLDOWN_MS));
        assert!(!cooldown.clear_expired(2_000));

        let unlock = 1_000 + FREE_GAME_COOLDOWN_MS;
        assert_eq!(cooldown.remaining_ms(unlock), None);
        assert!(cooldown.clear_expired(unlock));
        assert_eq!(cooldown.next_free_game_at, None);
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(FREE_GAME_COOLDOWN_MS), "60:00");
        assert_eq!(format_countdown(61_500), "01:01");
        assert_eq!(format_countdown(-5), "00:00");
    }
}
