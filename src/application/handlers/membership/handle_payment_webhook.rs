//! HandlePaymentWebhookHandler - Command handler for provider payment webhooks.
//!
//! There is no caller identity on this path. Trust comes from the HMAC
//! signature over the raw body, so the signature is checked before the body
//! is parsed at all.

use std::sync::Arc;

use crate::domain::foundation::{PaymentId, Timestamp, UserId};
use crate::domain::membership::{
    classify_webhook, IgnoreReason, PlanCatalog, ReconcileOutcome, Reconciliation,
    VerificationSource, WebhookError, WebhookSignatureVerifier,
};
use crate::ports::MembershipStore;

/// Command to handle a payment webhook.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Raw webhook payload, exactly as received.
    pub payload: Vec<u8>,
    /// Signature header, if present.
    pub signature: Option<String>,
}

/// Result of webhook processing. Every variant is acknowledged with 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlePaymentWebhookResult {
    /// This delivery activated the membership period.
    Reconciled { payment_id: PaymentId, user_id: UserId },
    /// The payment was already reconciled by an earlier delivery or by the client.
    AlreadyReconciled { payment_id: PaymentId },
    /// Verified but not actionable.
    Ignored { reason: IgnoreReason },
}

/// Handler for the webhook path.
pub struct HandlePaymentWebhookHandler {
    store: Option<Arc<dyn MembershipStore>>,
    verifier: Option<Arc<WebhookSignatureVerifier>>,
    catalog: Arc<PlanCatalog>,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        store: Option<Arc<dyn MembershipStore>>,
        verifier: Option<Arc<WebhookSignatureVerifier>>,
        catalog: Arc<PlanCatalog>,
    ) -> Self {
        Self {
            store,
            verifier,
            catalog,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<HandlePaymentWebhookResult, WebhookError> {
        // 1. Store and signing secret must be configured
        let store = self
            .store
            .as_ref()
            .ok_or(WebhookError::NotConfigured("membership store"))?;
        let verifier = self
            .verifier
            .as_ref()
            .ok_or(WebhookError::NotConfigured("webhook secret"))?;

        // 2. Verify signature over the raw bytes
        verifier
            .verify(&cmd.payload, cmd.signature.as_deref())
            .map_err(|e| {
                tracing::warn!(error = %e, "Webhook signature rejected");
                e
            })?;

        // 3-5. Parse, extract and validate
        let actionable = match classify_webhook(&cmd.payload, &self.catalog) {
            Ok(actionable) => actionable,
            Err(reason) => {
                tracing::info!(reason = %reason, "Webhook ignored");
                return Ok(HandlePaymentWebhookResult::Ignored { reason });
            }
        };

        // 6. Reconcile atomically
        let reconciliation = Reconciliation::build(
            actionable.payment_id.clone(),
            actionable.user_id.clone(),
            actionable.plan,
            &actionable.payment,
            &self.catalog,
            VerificationSource::Webhook,
            Timestamp::now(),
        )
        .ok_or_else(|| WebhookError::Database("period end out of range".to_string()))?;

        let outcome = store.reconcile(&reconciliation).await.map_err(|e| {
            tracing::error!(
                payment_id = %actionable.payment_id,
                error = %e,
                "Webhook reconciliation failed"
            );
            WebhookError::Database(e.to_string())
        })?;

        // 7. Acknowledge
        match outcome {
            ReconcileOutcome::Applied => {
                tracing::info!(
                    payment_id = %actionable.payment_id,
                    user_id = %actionable.user_id,
                    plan = %actionable.plan,
                    "Membership activated from webhook"
                );
                Ok(HandlePaymentWebhookResult::Reconciled {
                    payment_id: actionable.payment_id,
                    user_id: actionable.user_id,
                })
            }
            ReconcileOutcome::AlreadyReconciled(existing) => {
                tracing::debug!(
                    payment_id = %existing.payment_id,
                    source = %existing.source,
                    "Webhook for already reconciled payment"
                );
                Ok(HandlePaymentWebhookResult::AlreadyReconciled {
                    payment_id: existing.payment_id,
                })
            }
        }
    }
}
