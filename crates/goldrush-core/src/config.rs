//! ============================================================================
//! Configuration - Environment-backed settings
//! ============================================================================
//! Values come from the process environment (a `.env` file is loaded first
//! when present). Everything has a default so the store works offline.
//! ============================================================================

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ledger::PrecisionAccounting;

/// Merchant address receiving shop payments
pub const DEFAULT_PAYMENT_ADDRESS: &str = "0x7dba00d3544b999834b2fb12b46528cad6459d36";

/// Identity action gating reward claims
pub const CLAIM_ACTION: &str = "gold-rush-miner-claim";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Store file path (None: ~/.goldrush/store.redb)
    pub db_path: Option<String>,
    /// Destination of shop payments
    pub payment_address: String,
    /// Mini-app confirm-payment endpoint
    pub confirm_url: Option<String>,
    /// Developer portal credentials for server-side verification
    pub app_id: Option<String>,
    pub api_key: Option<String>,
    pub portal_url: Option<String>,
    /// Default for the mute toggle when nothing is persisted
    pub muted: bool,
    pub precision_accounting: PrecisionAccounting,
    /// Identity action used for reward claims
    pub claim_action: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            payment_address: DEFAULT_PAYMENT_ADDRESS.to_string(),
            confirm_url: None,
            app_id: None,
            api_key: None,
            portal_url: None,
            muted: false,
            precision_accounting: PrecisionAccounting::default(),
            claim_action: CLAIM_ACTION.to_string(),
        }
    }
}

impl GameConfig {
    /// Load `.env` (if any) and read the environment
    pub fn load() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let precision_accounting = match non_empty("GOLDRUSH_PRECISION_ACCOUNTING") {
            Some(raw) => raw.parse().unwrap_or_else(|e: String| {
                warn!("{} - using pooled accounting", e);
                PrecisionAccounting::default()
            }),
            None => defaults.precision_accounting,
        };

        Self {
            db_path: non_empty("GOLDRUSH_DB_PATH"),
            payment_address: non_empty("GOLDRUSH_PAYMENT_ADDRESS")
                .unwrap_or(defaults.payment_address),
            confirm_url: non_empty("GOLDRUSH_CONFIRM_URL"),
            app_id: non_empty("WLD_APP_ID"),
            api_key: non_empty("WLD_API_KEY"),
            portal_url: non_empty("GOLDRUSH_PORTAL_URL"),
            muted: non_empty("GOLDRUSH_MUTED")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.muted),
            precision_accounting,
            claim_action: non_empty("GOLDRUSH_CLAIM_ACTION").unwrap_or(defaults.claim_action),
        }
    }
}

/// "1", "true", "yes", "on" (any case) are true
pub fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
