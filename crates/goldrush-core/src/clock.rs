//! ============================================================================
//! Clock - Injectable time source for expiry and day-boundary logic
//! ============================================================================
//! Every timestamp in the store (power-up expiry, play cooldown) and every
//! calendar day key (daily progress, login streak) comes from a `Clock`, so
//! tests can roll days over without touching the wall clock.
//! ============================================================================

use chrono::{DateTime, Local, NaiveDate, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of "now" for the game store
pub trait Clock: Send + Sync {
    /// Current time as Unix milliseconds
    fn now_ms(&self) -> i64;

    /// Today's calendar date (the day key for daily progress)
    fn today(&self) -> NaiveDate;
}

/// Wall clock; day keys follow the device's local calendar
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Manually advanced clock for tests and headless simulations.
/// Day keys are derived from the stored instant in UTC.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
        }
    }

    /// Start at midnight UTC of the given date
    pub fn at_date(date: NaiveDate) -> Self {
        let ms = date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_default();
        Self::new(ms)
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    pub fn advance_days(&self, days: i64) {
        self.advance_ms(days * 86_400_000);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn today(&self) -> NaiveDate {
        DateTime::<Utc>::from_timestamp_millis(self.now_ms())
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }
}

/// Wall clock plus a forward offset, for driving a session faster than real
/// time. Day keys follow the local calendar like `SystemClock`.
#[derive(Debug, Default)]
pub struct SimulatedClock {
    offset_ms: AtomicI64,
}

impl SimulatedClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ms(&self, delta_ms: i64) {
        self.offset_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Total simulated time added so far
    pub fn offset_ms(&self) -> i64 {
        self.offset_ms.load(Ordering::SeqCst)
    }
}

impl Clock for SimulatedClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis() + self.offset_ms()
    }

    fn today(&self) -> NaiveDate {
        DateTime::<Utc>::from_timestamp_millis(self.now_ms())
            .map(|dt| dt.with_timezone(&Local).date_naive())
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

/// Format a date as the persisted day key (ISO `YYYY-MM-DD`)
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a persisted day key; `None` for anything unreadable
pub fn parse_day_key(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_day_rollover() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let clock = ManualClock::at_date(date);
        assert_eq!(clock.today(), date);

        clock.advance_ms(86_399_999);
        assert_eq!(clock.today(), date);

        clock.advance_ms(1);
        assert_eq!(clock.today(), date.succ_opt().unwrap());
    }

    #[test]
    fn test_day_key_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        assert_eq!(day_key(date), "2026-01-02");
        assert_eq!(parse_day_key("2026-01-02"), Some(date));
        assert_eq!(parse_day_key("Fri Jan 02 2026"), None);
    }

    #[test]
    fn test_simulated_clock_runs_ahead_of_wall_clock() {
        let clock = SimulatedClock::new();
        let wall = SystemClock.now_ms();
        assert!((clock.now_ms() - wall).abs() < 1_000);

        clock.advance_ms(20_000);
        clock.advance_ms(40_000);
        assert_eq!(clock.offset_ms(), 60_000);
        let ahead = clock.now_ms() - SystemClock.now_ms();
        assert!((59_000..=60_000).contains(&ahead));
    }
}
