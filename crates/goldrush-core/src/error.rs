//! ============================================================================
//! Error Types - Failures surfaced to the player
//! ============================================================================
//! None of these are fatal. Each maps to a short alert via `user_message()`
//! and leaves the store snapshot unchanged.
//! ============================================================================

use crate::daily::ClaimTier;
use crate::powerups::PowerUpKind;

/// Wallet host command failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("Wallet host not available")]
    Unavailable,

    #[error("Wallet host error: {0}")]
    Host(String),
}

/// Payment verification collaborator failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("Verification transport error: {0}")]
    Transport(String),

    #[error("Verification response unreadable: {0}")]
    Parse(String),
}

/// Why a purchase attempt ended in `Rejected`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PurchaseError {
    #[error("Item not found: {0}")]
    UnknownItem(String),

    #[error("Wallet host not available")]
    HostUnavailable,

    #[error("Payment cancelled by user")]
    Cancelled,

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("Payment reference mismatch: expected {expected}, got {received}")]
    ReferenceMismatch { expected: String, received: String },

    #[error("Payment verification failed: {0}")]
    VerificationRejected(String),

    #[error("Payment verification error: {0}")]
    VerificationError(String),

    #[error("Purchase reference already credited: {0}")]
    AlreadyCredited(String),
}

impl PurchaseError {
    /// Alert text for the shop
    pub fn user_message(&self) -> String {
        match self {
            Self::UnknownItem(_) => "This item is not available.".to_string(),
            Self::HostUnavailable => {
                "Purchases are only available inside World App.".to_string()
            }
            Self::Cancelled => "You cancelled the payment.".to_string(),
            Self::PaymentFailed(_) => "Payment failed. Please try again.".to_string(),
            Self::ReferenceMismatch { .. }
            | Self::VerificationRejected(_)
            | Self::VerificationError(_) => {
                "We could not confirm your payment. No items were added.".to_string()
            }
            Self::AlreadyCredited(_) => "This purchase was already delivered.".to_string(),
        }
    }
}

/// Game session failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Next free game in {remaining_ms} ms")]
    CooldownActive { remaining_ms: i64 },

    #[error("Session is not running")]
    NotRunning,

    #[error("No {0} in inventory")]
    OutOfItem(String),

    #[error("{0} already active")]
    AlreadyActive(PowerUpKind),
}

impl GameError {
    pub fn user_message(&self) -> String {
        match self {
            Self::CooldownActive { remaining_ms } => format!(
                "Please wait {} for next free game or use Extra Plays!",
                crate::streak::format_countdown(*remaining_ms)
            ),
            Self::NotRunning => "Start a game first.".to_string(),
            Self::OutOfItem(item) => format!("You have no {} left.", item),
            Self::AlreadyActive(kind) => format!("{} is already active.", kind),
        }
    }
}

/// Reward claim failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    #[error("{0} is not claimable")]
    NotEligible(ClaimTier),

    #[error("Identity verification rejected: {0}")]
    VerificationRejected(String),

    #[error("Identity verification unavailable: {0}")]
    VerificationUnavailable(String),
}

impl ClaimError {
    pub fn user_message(&self) -> String {
        match self {
            Self::NotEligible(tier) => format!("{} is not available yet.", tier),
            Self::VerificationRejected(_) => "Could not verify your World ID. Please try again.".to_string(),
            Self::VerificationUnavailable(_) => "Error processing. Please try again.".to_string(),
        }
    }
}
