//! ============================================================================
//! Game Loop - Scoring contract of a Gold Rush session
//! ============================================================================
//! Rendering and input capture live in the host; this module owns what
//! affects the economy:
//! - **playfield**: spawn rules, motion, hit testing and TNT
//! - **session**: entry rules, taps, boosts and the end-of-game tally
//! ============================================================================

pub mod playfield;
pub mod session;

pub use playfield::{FallingItem, ItemType, Playfield};
pub use session::{GameResult, GameSession, SessionEntry, TapResult};
