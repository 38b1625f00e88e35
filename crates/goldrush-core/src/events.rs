//! ============================================================================
//! Store Events - Change notifications for display surfaces
//! ============================================================================
//! Every store mutation publishes an event on a tokio broadcast channel.
//! Views subscribe once and re-render on receipt instead of re-reading the
//! persisted values on a timer.
//! ============================================================================

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::daily::ClaimTier;
use crate::powerups::PowerUpKind;
use crate::purchase::PurchaseState;

/// Buffered events per subscriber before the oldest are dropped
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StoreEvent {
    InventoryChanged {
        item_id: String,
        quantity: u32,
    },
    PowerUpActivated {
        kind: PowerUpKind,
        expires_at: i64,
    },
    PowerUpExpired {
        kind: PowerUpKind,
    },
    PowerUpsReset {
        kind: Option<PowerUpKind>,
        removed: usize,
    },
    DayRolledOver {
        day: NaiveDate,
    },
    ProgressUpdated {
        points_today: u64,
        games_played_today: u32,
        high_score_games_today: u32,
    },
    RewardClaimed {
        tier: ClaimTier,
    },
    StreakUpdated {
        days: u32,
    },
    CooldownChanged {
        next_free_game_at: Option<i64>,
    },
    PurchaseStateChanged {
        item_id: String,
        reference: Option<String>,
        state: PurchaseState,
    },
    SettingsChanged {
        muted: bool,
    },
}

/// Sending half owned by the store
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Publish; having no subscribers is not an error
    pub fn emit(&self, event: StoreEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(StoreEvent::SettingsChanged { muted: true });
        bus.emit(StoreEvent::StreakUpdated { days: 2 });

        assert_eq!(rx.recv().await.unwrap(), StoreEvent::SettingsChanged { muted: true });
        assert_eq!(rx.recv().await.unwrap(), StoreEvent::StreakUpdated { days: 2 });
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new();
        bus.emit(StoreEvent::PowerUpExpired { kind: PowerUpKind::Precision });
    }

    #[test]
    fn test_event_json_shape() {
        let event = StoreEvent::InventoryChanged {
            item_id: "tnt_pack".into(),
            quantity: 2,
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"event":"inventory_changed","item_id":"tnt_pack","quantity":2}"#
        );
    }
}
