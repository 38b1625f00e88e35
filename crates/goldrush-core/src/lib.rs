//! ============================================================================
//! GOLDRUSH-CORE: Gold Rush Miner game economy
//! ============================================================================
//! Everything the mini-app keeps about a player between sessions:
//! - Catalog of consumables and chest packs
//! - Inventory ledger with the precision use-pool
//! - Time-boxed power-ups with a background expiry sweep
//! - Fail-closed purchase pipeline against the wallet host
//! - Daily progress, reward tiers, login streak and play cooldown
//! - Game session scoring
//! ============================================================================

pub mod catalog;
pub mod clock;
pub mod config;
pub mod daily;
pub mod error;
pub mod events;
pub mod game;
pub mod ledger;
pub mod powerups;
pub mod purchase;
pub mod rewards;
pub mod storage;
pub mod store;
pub mod streak;
pub mod summary;
pub mod wallet;

// Re-export main types for convenience
pub use catalog::{CatalogItem, TokenAmount};
pub use clock::{Clock, ManualClock, SimulatedClock, SystemClock};
pub use config::GameConfig;
pub use daily::{ClaimEligibility, ClaimTier, DailyProgress};
pub use error::{ClaimError, GameError, PurchaseError, VerifyError, WalletError};
pub use events::{EventBus, StoreEvent};
pub use game::{GameResult, GameSession};
pub use ledger::{InventoryEntry, Ledger, PrecisionAccounting};
pub use powerups::{ActivePowerUp, PowerUpKind, PowerUpTracker};
pub use purchase::{PurchasePipeline, PurchaseReceipt, PurchaseState};
pub use rewards::RewardClaimer;
pub use storage::{KeyValueStore, MemoryStore, RedbStore};
pub use store::{spawn_sweeper, GameStore, SharedStore};
pub use summary::StoreSummary;
