//! ============================================================================
//! Active Power-Ups - Time-boxed gameplay modifiers
//! ============================================================================
//! Each activation appends `{kind, expires_at}`. Entries are dropped once
//! `expires_at <= now`, either by the periodic sweeper or before any query.
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::catalog::items;

/// Precision lasts 20 seconds per activation
pub const PRECISION_DURATION_MS: i64 = 20_000;

/// Interval of the background expiry sweep
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Kinds of time-boxed power-ups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUpKind {
    /// Click hitbox +50%
    Precision,
}

impl PowerUpKind {
    /// Ledger item spent to activate this power-up
    pub fn ledger_item(&self) -> &'static str {
        match self {
            Self::Precision => items::PRECISION_PACK,
        }
    }

    /// Default activation length
    pub fn default_duration_ms(&self) -> i64 {
        match self {
            Self::Precision => PRECISION_DURATION_MS,
        }
    }
}

impl fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Precision => write!(f, "precision"),
        }
    }
}

/// A running power-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePowerUp {
    #[serde(rename = "type")]
    pub kind: PowerUpKind,
    /// Unix milliseconds
    pub expires_at: i64,
}

/// Set of running power-ups. Time is always passed in, never read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PowerUpTracker {
    active: Vec<ActivePowerUp>,
}

impl PowerUpTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a snapshot, discarding entries that already expired
    pub fn from_snapshot(entries: Vec<ActivePowerUp>, now_ms: i64) -> Self {
        let mut tracker = Self { active: entries };
        tracker.sweep(now_ms);
        tracker
    }

    pub fn entries(&self) -> &[ActivePowerUp] {
        &self.active
    }

    /// Start a power-up. The caller has already spent the matching item.
    pub fn push(&mut self, kind: PowerUpKind, duration_ms: i64, now_ms: i64) -> ActivePowerUp {
        let entry = ActivePowerUp {
            kind,
            expires_at: now_ms + duration_ms,
        };
        self.active.push(entry);
        entry
    }

    /// True iff an entry of `kind` expires after `now_ms`
    pub fn is_active(&self, kind: PowerUpKind, now_ms: i64) -> bool {
        self.active
            .iter()
            .any(|p| p.kind == kind && p.expires_at > now_ms)
    }

    /// Milliseconds left on the longest-running entry of `kind`
    pub fn remaining_ms(&self, kind: PowerUpKind, now_ms: i64) -> Option<i64> {
        self.active
            .iter()
            .filter(|p| p.kind == kind && p.expires_at > now_ms)
            .map(|p| p.expires_at - now_ms)
            .max()
    }

    /// Drop expired entries; returns the kinds that were removed
    pub fn sweep(&mut self, now_ms: i64) -> Vec<PowerUpKind> {
        let mut expired = Vec::new();
        self.active.retain(|p| {
            if p.expires_at > now_ms {
                true
            } else {
                expired.push(p.kind);
                false
            }
        });
        expired
    }

    /// Force-clear entries of one kind (or all) regardless of expiry.
    /// Returns how many were removed.
    pub fn reset(&mut self, kind: Option<PowerUpKind>) -> usize {
        let before = self.active.len();
        match kind {
            Some(kind) => self.active.retain(|p| p.kind != kind),
            None => self.active.clear(),
        }
        before - self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_until_expiry() {
        let mut tracker = PowerUpTracker::new();
        tracker.push(PowerUpKind::Precision, PRECISION_DURATION_MS, 1_000);

        assert!(tracker.is_active(PowerUpKind::Precision, 1_000));
        assert!(tracker.is_active(PowerUpKind::Precision, 20_999));
        assert_eq!(tracker.remaining_ms(PowerUpKind::Precision, 11_000), Some(10_000));
        // expires_at <= now is expired
        assert!(!tracker.is_active(PowerUpKind::Precision, 21_000));
        assert_eq!(tracker.remaining_ms(PowerUpKind::Precision, 21_000), None);
    }

    #[test]
    fn test_sweep_removes_expired_only() {
        let mut tracker = PowerUpTracker::new();
        tracker.push(PowerUpKind::Precision, 5_000, 0);
        tracker.push(PowerUpKind::Precision, 30_000, 0);

        assert_eq!(tracker.sweep(5_000), vec![PowerUpKind::Precision]);
        assert_eq!(tracker.entries().len(), 1);
        assert!(tracker.sweep(6_000).is_empty());
    }

    #[test]
    fn test_reset_ignores_expiry() {
        let mut tracker = PowerUpTracker::new();
        tracker.push(PowerUpKind::Precision, 60_000, 0);
        tracker.push(PowerUpKind::Precision, 60_000, 0);

        assert_eq!(tracker.reset(Some(PowerUpKind::Precision)), 2);
        assert!(!tracker.is_active(PowerUpKind::Precision, 1));

        tracker.push(PowerUpKind::Precision, 60_000, 0);
        assert_eq!(tracker.reset(None), 1);
        assert!(tracker.entries().is_empty());
    }

    #[test]
    fn test_snapshot_drops_expired() {
        let snapshot = vec![
            ActivePowerUp { kind: PowerUpKind::Precision, expires_at: 10 },
            ActivePowerUp { kind: PowerUpKind::Precision, expires_at: 50 },
        ];
        let tracker = PowerUpTracker::from_snapshot(snapshot, 20);
        assert_eq!(tracker.entries().len(), 1);
        assert_eq!(tracker.entries()[0].expires_at, 50);
    }

    #[test]
    fn test_serialized_shape() {
        let entry = ActivePowerUp { kind: PowerUpKind::Precision, expires_at: 1234 };
        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"type":"precision","expiresAt":1234}"#
        );
    }
}
