//! ============================================================================
//! Wallet Module - External collaborators of the economy
//! ============================================================================
//! The wallet host owns payments and identity; this crate only talks to it
//! through these traits.
//!
//! ## Collaborators
//! - **WalletPayment**: shows the host's payment sheet, returns the outcome
//! - **PaymentVerifier**: confirms a submitted payment before any credit
//! - **IdentityVerifier**: proof-of-personhood check gating reward claims
//!
//! ## Usage
//! ```rust,ignore
//! use goldrush_core::wallet::{ConfirmEndpointVerifier, PaymentVerifier};
//!
//! let verifier = ConfirmEndpointVerifier::new("https://miner.example/api/confirm-payment");
//! let response = verifier.verify(&payload).await?;
//! ```
//! ============================================================================

mod http;

pub use http::{
    evaluate_portal_transaction, verifier_from_config, ConfirmEndpointVerifier, PortalTransaction,
    PortalVerifier,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{VerifyError, WalletError};

/// One token leg of a payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub symbol: String,
    /// Raw integer amount as a decimal string
    pub token_amount: String,
}

/// Payment request handed to the wallet host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayCommand {
    pub reference: String,
    /// Destination address
    pub to: String,
    pub tokens: Vec<TokenTransfer>,
    pub description: String,
}

/// Success payload returned by the wallet host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSuccess {
    pub status: String,
    pub transaction_id: String,
    /// Echo of `PayCommand::reference`
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl PaymentSuccess {
    pub fn new(transaction_id: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            transaction_id: transaction_id.into(),
            reference: reference.into(),
            from: None,
            chain: None,
            timestamp: None,
        }
    }
}

/// Result of the payment command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayOutcome {
    Success(PaymentSuccess),
    /// The player closed the payment sheet
    Cancelled,
    /// Any other non-success status reported by the host
    Failed(String),
}

/// Answer of the verification collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "transactionId", skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

impl VerificationResponse {
    pub fn confirmed(transaction_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message: "Payment confirmed!".to_string(),
            transaction_id: Some(transaction_id.into()),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            transaction_id: None,
        }
    }
}

/// Result of the identity command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityStatus {
    Verified,
    Rejected(String),
}

/// Host payment command
#[async_trait]
pub trait WalletPayment: Send + Sync {
    async fn pay(&self, command: PayCommand) -> Result<PayOutcome, WalletError>;
}

/// Confirms a submitted payment
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    async fn verify(&self, payment: &PaymentSuccess) -> Result<VerificationResponse, VerifyError>;
}

/// Host identity command
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, action: &str, signal: &str) -> Result<IdentityStatus, WalletError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_payload_wire_shape() {
        let payload = PaymentSuccess::new("0xabc", "goldrush_tnt_pack_1");
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({
                "status": "success",
                "transaction_id": "0xabc",
                "reference": "goldrush_tnt_pack_1",
            })
        );
    }

    #[test]
    fn test_verification_response_defaults() {
        let parsed: VerificationResponse = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(!parsed.success);
        assert!(parsed.message.is_empty());
        assert_eq!(parsed.transaction_id, None);

        let parsed: VerificationResponse = serde_json::from_str(
            r#"{"success":true,"message":"Payment confirmed!","transactionId":"0x1"}"#,
        )
        .unwrap();
        assert_eq!(parsed, VerificationResponse::confirmed("0x1"));
    }
}
