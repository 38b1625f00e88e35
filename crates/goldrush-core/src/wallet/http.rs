//! ============================================================================
//! HTTP Payment Verifiers
//! ============================================================================
//! - ConfirmEndpointVerifier: POSTs the success payload to the mini-app's
//!   confirm endpoint and relays its `{success, message}` answer
//! - PortalVerifier: asks the developer portal for the transaction and accepts
//!   it iff the reference matches and the status is not "failed"
//! ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{PaymentSuccess, PaymentVerifier, VerificationResponse};
use crate::config::GameConfig;
use crate::error::VerifyError;

/// Developer portal host
pub const DEFAULT_PORTAL_URL: &str = "https://developer.worldcoin.org";

#[derive(Debug, Serialize)]
struct ConfirmRequest<'a> {
    payload: &'a PaymentSuccess,
}

/// Verifier backed by the mini-app's confirm-payment route
pub struct ConfirmEndpointVerifier {
    client: Client,
    url: String,
}

impl ConfirmEndpointVerifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    /// From `GOLDRUSH_CONFIRM_URL`, if set
    pub fn from_config(config: &GameConfig) -> Option<Self> {
        config.confirm_url.as_deref().map(Self::new)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PaymentVerifier for ConfirmEndpointVerifier {
    async fn verify(&self, payment: &PaymentSuccess) -> Result<VerificationResponse, VerifyError> {
        debug!("Confirming payment {} at {}", payment.reference, self.url);

        let response = self
            .client
            .post(&self.url)
            .json(&ConfirmRequest { payload: payment })
            .send()
            .await
            .map_err(|e| VerifyError::Transport(format!("Failed to reach confirm endpoint: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VerifyError::Transport(format!("Confirm endpoint error {}: {}", status, body)));
        }

        response
            .json::<VerificationResponse>()
            .await
            .map_err(|e| VerifyError::Parse(format!("Failed to parse confirm response: {}", e)))
    }
}

/// Transaction record returned by the developer portal
#[derive(Debug, Clone, Deserialize)]
pub struct PortalTransaction {
    pub reference: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "transactionStatus")]
    pub transaction_status: Option<String>,
}

/// Accept iff the portal echoes our reference and the transfer did not fail
pub fn evaluate_portal_transaction(
    transaction: &PortalTransaction,
    payment: &PaymentSuccess,
) -> VerificationResponse {
    let failed = [&transaction.status, &transaction.transaction_status]
        .iter()
        .any(|s| s.as_deref() == Some("failed"));

    if transaction.reference == payment.reference && !failed {
        VerificationResponse::confirmed(payment.transaction_id.clone())
    } else {
        VerificationResponse::rejected("Payment verification failed")
    }
}

/// Server-side verifier talking to the developer portal directly
pub struct PortalVerifier {
    client: Client,
    base_url: String,
    app_id: String,
    api_key: String,
}

impl PortalVerifier {
    pub fn new(app_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_PORTAL_URL, app_id, api_key)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        app_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            app_id: app_id.into(),
            api_key: api_key.into(),
        }
    }

    /// From `WLD_APP_ID` and `WLD_API_KEY` (both required), on
    /// `GOLDRUSH_PORTAL_URL` when set
    pub fn from_config(config: &GameConfig) -> Option<Self> {
        let app_id = config.app_id.as_deref()?;
        let api_key = config.api_key.as_deref()?;
        let base_url = config.portal_url.as_deref().unwrap_or(DEFAULT_PORTAL_URL);
        Some(Self::with_base_url(base_url, app_id, api_key))
    }

    /// Transaction lookup URL (without the app id query)
    pub fn transaction_url(&self, transaction_id: &str) -> String {
        format!("{}/api/v2/minikit/transaction/{}", self.base_url, transaction_id)
    }
}

#[async_trait]
impl PaymentVerifier for PortalVerifier {
    async fn verify(&self, payment: &PaymentSuccess) -> Result<VerificationResponse, VerifyError> {
        info!("Verifying payment with reference: {}", payment.reference);

        let response = self
            .client
            .get(self.transaction_url(&payment.transaction_id))
            .query(&[("app_id", self.app_id.as_str())])
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| VerifyError::Transport(format!("Failed to reach portal: {}", e)))?;

        if !response.status().is_success() {
            warn!("Portal response not OK: {}", response.status());
            return Ok(VerificationResponse::rejected("Failed to verify with WLD API"));
        }

        let transaction: PortalTransaction = response
            .json()
            .await
            .map_err(|e| VerifyError::Parse(format!("Failed to parse portal transaction: {}", e)))?;

        let verdict = evaluate_portal_transaction(&transaction, payment);
        if verdict.success {
            info!("Payment {} verified", payment.transaction_id);
        } else {
            warn!("Payment {} failed portal verification", payment.transaction_id);
        }
        Ok(verdict)
    }
}

/// Portal credentials win over the confirm endpoint. `None` when neither is
/// configured, in which case no purchase can be verified.
pub fn verifier_from_config(config: &GameConfig) -> Option<Arc<dyn PaymentVerifier>> {
    if let Some(portal) = PortalVerifier::from_config(config) {
        info!("Verifying payments against the developer portal");
        return Some(Arc::new(portal));
    }
    if let Some(confirm) = ConfirmEndpointVerifier::from_config(config) {
        info!("Verifying payments via {}", confirm.url());
        return Some(Arc::new(confirm));
    }
    warn!("No payment verifier configured");
    None
}
