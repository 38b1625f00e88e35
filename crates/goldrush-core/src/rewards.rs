//! ============================================================================
//! Reward Claims - Identity-gated daily tiers
//! ============================================================================
//! A tier is marked claimed only after the identity verifier accepts the
//! claim action. Eligibility is checked before the verifier is called and
//! re-checked afterwards, since the day may have rolled over meanwhile.
//! ============================================================================

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{GameConfig, CLAIM_ACTION};
use crate::daily::ClaimTier;
use crate::error::{ClaimError, WalletError};
use crate::store::SharedStore;
use crate::wallet::{IdentityStatus, IdentityVerifier};

/// Signal sent when the player has no username
pub const DEFAULT_CLAIM_SIGNAL: &str = "claim";

pub struct RewardClaimer {
    store: SharedStore,
    verifier: Arc<dyn IdentityVerifier>,
    action: String,
}

impl RewardClaimer {
    pub fn new(store: SharedStore, verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self::with_action(store, verifier, CLAIM_ACTION)
    }

    /// Claim with `config.claim_action`
    pub fn from_config(
        store: SharedStore,
        verifier: Arc<dyn IdentityVerifier>,
        config: &GameConfig,
    ) -> Self {
        Self::with_action(store, verifier, config.claim_action.clone())
    }

    pub fn with_action(
        store: SharedStore,
        verifier: Arc<dyn IdentityVerifier>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            store,
            verifier,
            action: action.into(),
        }
    }

    /// Verify identity and mark `tier` claimed
    pub async fn claim(&self, tier: ClaimTier, username: Option<&str>) -> Result<(), ClaimError> {
        if !self.store.lock().await.claim_eligibility().allows(tier) {
            return Err(ClaimError::NotEligible(tier));
        }

        let signal = username
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_CLAIM_SIGNAL);
        info!("Verifying identity for {} claim", tier);

        match self.verifier.verify(&self.action, signal).await {
            Ok(IdentityStatus::Verified) => {}
            Ok(IdentityStatus::Rejected(reason)) => {
                warn!("Identity verification rejected: {}", reason);
                return Err(ClaimError::VerificationRejected(reason));
            }
            Err(WalletError::Unavailable) => {
                return Err(ClaimError::VerificationUnavailable(
                    "wallet host not available".to_string(),
                ));
            }
            Err(WalletError::Host(message)) => {
                warn!("Identity verification error: {}", message);
                return Err(ClaimError::VerificationUnavailable(message));
            }
        }

        let mut store = self.store.lock().await;
        if !store.claim_eligibility().allows(tier) {
            return Err(ClaimError::NotEligible(tier));
        }
        store.mark_claimed(tier);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::GameConfig;
    use crate::storage::MemoryStore;
    use crate::store::GameStore;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    struct FixedIdentity {
        answer: Result<IdentityStatus, WalletError>,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl FixedIdentity {
        fn new(answer: Result<IdentityStatus, WalletError>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl IdentityVerifier for FixedIdentity {
        async fn verify(&self, action: &str, signal: &str) -> Result<IdentityStatus, WalletError> {
            self.seen
                .lock()
                .unwrap()
                .push((action.to_string(), signal.to_string()));
            self.answer.clone()
        }
    }

    async fn store_with_points(points: u64) -> SharedStore {
        let clock = Arc::new(ManualClock::at_date(NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()));
        let shared =
            GameStore::open(Arc::new(MemoryStore::new()), clock, &GameConfig::default()).into_shared();
        shared.lock().await.record_game_result(points);
        shared
    }

    #[tokio::test]
    async fn test_claim_marks_tier_after_verification() {
        let store = store_with_points(620).await;
        let identity = FixedIdentity::new(Ok(IdentityStatus::Verified));
        let claimer = RewardClaimer::new(store.clone(), identity.clone());

        claimer.claim(ClaimTier::Tier1, Some("miner42")).await.unwrap();
        assert!(store.lock().await.progress().claimed_tier1);
        assert_eq!(
            identity.seen.lock().unwrap()[0],
            ("gold-rush-miner-claim".to_string(), "miner42".to_string())
        );

        assert_eq!(
            claimer.claim(ClaimTier::Tier1, None).await,
            Err(ClaimError::NotEligible(ClaimTier::Tier1))
        );
    }

    #[tokio::test]
    async fn test_configured_claim_action_is_sent() {
        let store = store_with_points(700).await;
        let identity = FixedIdentity::new(Ok(IdentityStatus::Verified));
        let config = GameConfig::from_lookup(|key| {
            (key == "GOLDRUSH_CLAIM_ACTION").then(|| "miner-weekend-claim".to_string())
        });
        let claimer = RewardClaimer::from_config(store.clone(), identity.clone(), &config);

        claimer.claim(ClaimTier::Tier1, None).await.unwrap();
        assert_eq!(
            identity.seen.lock().unwrap()[0],
            ("miner-weekend-claim".to_string(), DEFAULT_CLAIM_SIGNAL.to_string())
        );
    }

    #[tokio::test]
    async fn test_ineligible_tier_skips_verifier() {
        let store = store_with_points(100).await;
        let identity = FixedIdentity::new(Ok(IdentityStatus::Verified));
        let claimer = RewardClaimer::new(store, identity.clone());

        assert_eq!(
            claimer.claim(ClaimTier::Tier2, None).await,
            Err(ClaimError::NotEligible(ClaimTier::Tier2))
        );
        assert!(identity.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_verification_leaves_state() {
        let store = store_with_points(900).await;
        for answer in [
            Ok(IdentityStatus::Rejected("max verifications reached".into())),
            Err(WalletError::Unavailable),
            Err(WalletError::Host("timeout".into())),
        ] {
            let claimer = RewardClaimer::new(store.clone(), FixedIdentity::new(answer));
            assert!(claimer.claim(ClaimTier::Tier1, None).await.is_err());
        }
        assert!(!store.lock().await.progress().claimed_tier1);
    }

    #[tokio::test]
    async fn test_default_signal() {
        let store = store_with_points(500).await;
        let identity = FixedIdentity::new(Ok(IdentityStatus::Verified));
        RewardClaimer::new(store, identity.clone())
            .claim(ClaimTier::Tier1, Some(""))
            .await
            .unwrap();
        assert_eq!(identity.seen.lock().unwrap()[0].1, "claim");
    }
}
