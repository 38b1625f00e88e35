//! ============================================================================
//! Purchase Pipeline - Fail-closed shop checkout
//! ============================================================================
//! Idle -> ReferenceIssued -> PaymentSubmitted -> VerificationPending ->
//! Credited | Rejected
//!
//! Items are credited only after the verifier explicitly confirms the
//! payment. Anything else (cancellation, host error, reference mismatch,
//! verifier rejection, transport or parse failure) rejects without touching
//! the ledger. The store lock is never held across the wallet or verifier
//! await points.
//! ============================================================================

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::catalog::{self, CatalogItem, PRICE_TOKEN_DECIMALS, PRICE_TOKEN_SYMBOL};
use crate::config::GameConfig;
use crate::error::{PurchaseError, WalletError};
use crate::events::StoreEvent;
use crate::store::SharedStore;
use crate::wallet::{
    verifier_from_config, PayCommand, PayOutcome, PaymentVerifier, TokenTransfer, WalletPayment,
};

/// Prefix of every purchase reference
pub const REFERENCE_PREFIX: &str = "goldrush";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseState {
    Idle,
    ReferenceIssued,
    PaymentSubmitted,
    VerificationPending,
    Credited,
    Rejected,
}

/// What a successful purchase delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseReceipt {
    pub item_id: String,
    pub reference: String,
    pub transaction_id: String,
    pub credits: Vec<(String, u32)>,
}

/// Fresh unguessable reference for one attempt
pub fn new_reference(item_id: &str) -> String {
    format!("{}_{}_{}", REFERENCE_PREFIX, item_id, Uuid::new_v4().simple())
}

/// Wallet request for one unit of `item`
pub fn pay_command(item: &CatalogItem, reference: &str, destination: &str) -> PayCommand {
    PayCommand {
        reference: reference.to_string(),
        to: destination.to_string(),
        tokens: vec![TokenTransfer {
            symbol: PRICE_TOKEN_SYMBOL.to_string(),
            token_amount: item.price.to_decimals(PRICE_TOKEN_DECIMALS).to_string(),
        }],
        description: item.payment_description(),
    }
}

pub struct PurchasePipeline {
    store: SharedStore,
    wallet: Arc<dyn WalletPayment>,
    verifier: Arc<dyn PaymentVerifier>,
    destination: String,
}

impl PurchasePipeline {
    pub fn new(
        store: SharedStore,
        wallet: Arc<dyn WalletPayment>,
        verifier: Arc<dyn PaymentVerifier>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            store,
            wallet,
            verifier,
            destination: destination.into(),
        }
    }

    /// Pay `config.payment_address` and verify with the configured verifier.
    /// Fails when no verifier is configured.
    pub fn from_config(
        store: SharedStore,
        wallet: Arc<dyn WalletPayment>,
        config: &GameConfig,
    ) -> Result<Self> {
        let verifier = verifier_from_config(config).ok_or_else(|| {
            anyhow!("No payment verifier configured: set WLD_APP_ID and WLD_API_KEY or GOLDRUSH_CONFIRM_URL")
        })?;
        Ok(Self::new(store, wallet, verifier, config.payment_address.clone()))
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Run one checkout for `item_id`
    pub async fn purchase(&self, item_id: &str) -> Result<PurchaseReceipt, PurchaseError> {
        let Some(item) = catalog::find(item_id) else {
            warn!("Purchase of unknown item {}", item_id);
            return self
                .reject(item_id, None, PurchaseError::UnknownItem(item_id.to_string()))
                .await;
        };

        let reference = new_reference(item.id);
        info!("Starting purchase of {} ({} {})", item.id, item.price, PRICE_TOKEN_SYMBOL);
        self.transition(item.id, Some(&reference), PurchaseState::ReferenceIssued)
            .await;

        let command = pay_command(item, &reference, &self.destination);
        self.transition(item.id, Some(&reference), PurchaseState::PaymentSubmitted)
            .await;

        let outcome = match self.wallet.pay(command).await {
            Ok(outcome) => outcome,
            Err(WalletError::Unavailable) => {
                return self
                    .reject(item.id, Some(&reference), PurchaseError::HostUnavailable)
                    .await;
            }
            Err(WalletError::Host(message)) => {
                return self
                    .reject(item.id, Some(&reference), PurchaseError::PaymentFailed(message))
                    .await;
            }
        };

        let payment = match outcome {
            PayOutcome::Success(payment) => payment,
            PayOutcome::Cancelled => {
                return self
                    .reject(item.id, Some(&reference), PurchaseError::Cancelled)
                    .await;
            }
            PayOutcome::Failed(status) => {
                return self
                    .reject(item.id, Some(&reference), PurchaseError::PaymentFailed(status))
                    .await;
            }
        };

        if payment.reference != reference {
            error!(
                "Payment reference mismatch for {}: expected {}, got {}",
                item.id, reference, payment.reference
            );
            let mismatch = PurchaseError::ReferenceMismatch {
                expected: reference.clone(),
                received: payment.reference.clone(),
            };
            return self.reject(item.id, Some(&reference), mismatch).await;
        }

        self.transition(item.id, Some(&reference), PurchaseState::VerificationPending)
            .await;

        let response = match self.verifier.verify(&payment).await {
            Ok(response) => response,
            Err(e) => {
                error!("Payment verification error: {}", e);
                return self
                    .reject(item.id, Some(&reference), PurchaseError::VerificationError(e.to_string()))
                    .await;
            }
        };
        if !response.success {
            warn!("Payment {} rejected: {}", payment.transaction_id, response.message);
            return self
                .reject(
                    item.id,
                    Some(&reference),
                    PurchaseError::VerificationRejected(response.message),
                )
                .await;
        }

        let credits = item.credits();
        let credited = self.store.lock().await.credit_purchase(&reference, &credits);
        if let Err(e) = credited {
            return self.reject(item.id, Some(&reference), e).await;
        }

        self.transition(item.id, Some(&reference), PurchaseState::Credited)
            .await;
        info!("Purchase of {} completed ({})", item.id, payment.transaction_id);

        Ok(PurchaseReceipt {
            item_id: item.id.to_string(),
            reference,
            transaction_id: payment.transaction_id,
            credits: credits
                .into_iter()
                .map(|(id, quantity)| (id.to_string(), quantity))
                .collect(),
        })
    }

    async fn transition(&self, item_id: &str, reference: Option<&str>, state: PurchaseState) {
        self.store.lock().await.emit(StoreEvent::PurchaseStateChanged {
            item_id: item_id.to_string(),
            reference: reference.map(str::to_string),
            state,
        });
    }

    async fn reject(
        &self,
        item_id: &str,
        reference: Option<&str>,
        reason: PurchaseError,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        warn!("Purchase of {} rejected: {}", item_id, reason);
        self.transition(item_id, reference, PurchaseState::Rejected).await;
        Err(reason)
    }
}
