//! VerifyPaymentHandler - Command handler for client-submitted payment verification.
//!
//! After a checkout redirect the browser submits `{paymentId, planType}`.
//! Nothing in that submission is trusted: the payment is re-fetched from the
//! provider with server-held credentials and must match the caller, the plan
//! and the plan's price before a membership period is granted.
//!
//! Each step below is a hard gate. A failure at any step returns before any
//! write happens.

use std::sync::Arc;

use crate::domain::foundation::{PaymentId, Timestamp, UserId};
use crate::domain::membership::{
    validate_capture, PaymentVerificationRecord, PlanCatalog, PlanType, ReconcileOutcome,
    Reconciliation, SubscriptionState, SubscriptionStatus, VerificationError, VerificationSource,
};
use crate::ports::{
    MembershipStore, PaymentGateway, RateLimitKey, RateLimitResult, RateLimiter, SessionValidator,
};

use super::authenticate::authenticate;

/// Command to verify a payment the client says it completed.
#[derive(Debug, Clone, Default)]
pub struct VerifyPaymentCommand {
    /// Raw bearer token from the `Authorization` header.
    pub bearer_token: Option<String>,
    pub payment_id: String,
    pub plan_type: String,
}

/// Membership summary returned to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipSummary {
    pub plan: String,
    pub status: SubscriptionStatus,
    pub plan_type: PlanType,
    pub period_end: Timestamp,
}

impl From<&SubscriptionState> for MembershipSummary {
    fn from(state: &SubscriptionState) -> Self {
        Self {
            plan: state.plan.clone(),
            status: state.status,
            plan_type: state.plan_type,
            period_end: state.period_end,
        }
    }
}

/// Result of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyPaymentResult {
    /// This request activated the membership period.
    Verified(MembershipSummary),
    /// The payment had already been reconciled for this caller and plan.
    /// Carries the caller's current membership, if one is stored.
    AlreadyVerified(Option<MembershipSummary>),
}

impl VerifyPaymentResult {
    pub fn membership(&self) -> Option<&MembershipSummary> {
        match self {
            VerifyPaymentResult::Verified(summary) => Some(summary),
            VerifyPaymentResult::AlreadyVerified(summary) => summary.as_ref(),
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            VerifyPaymentResult::Verified(_) => "Payment verified. Membership activated",
            VerifyPaymentResult::AlreadyVerified(_) => "Payment already verified",
        }
    }
}

/// Handler for the client-verify path.
pub struct VerifyPaymentHandler {
    store: Option<Arc<dyn MembershipStore>>,
    gateway: Option<Arc<dyn PaymentGateway>>,
    session_validator: Arc<dyn SessionValidator>,
    rate_limiter: Arc<dyn RateLimiter>,
    catalog: Arc<PlanCatalog>,
    payment_id_prefix: String,
}

impl VerifyPaymentHandler {
    pub fn new(
        store: Option<Arc<dyn MembershipStore>>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        session_validator: Arc<dyn SessionValidator>,
        rate_limiter: Arc<dyn RateLimiter>,
        catalog: Arc<PlanCatalog>,
        payment_id_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            gateway,
            session_validator,
            rate_limiter,
            catalog,
            payment_id_prefix: payment_id_prefix.into(),
        }
    }

    pub async fn handle(
        &self,
        cmd: VerifyPaymentCommand,
    ) -> Result<VerifyPaymentResult, VerificationError> {
        // 1. Store must be configured
        let store = self
            .store
            .as_ref()
            .ok_or(VerificationError::Configuration("membership store"))?;

        // 2. Authenticate caller
        let user = authenticate(self.session_validator.as_ref(), cmd.bearer_token.as_deref()).await?;

        // 3. Rate limit (the attempt is counted even if it is denied)
        self.enforce_rate_limit(&user.id).await?;

        // 4. Validate request
        let payment_id = PaymentId::with_prefix(cmd.payment_id.trim(), &self.payment_id_prefix)?;
        let plan: PlanType = cmd.plan_type.trim().parse()?;

        // 5. Provider credentials must be configured
        let gateway = self
            .gateway
            .as_ref()
            .ok_or(VerificationError::Configuration("payment provider credentials"))?;

        // 6. Idempotency short-circuit
        if let Some(existing) = store
            .find_verification(&payment_id)
            .await
            .map_err(|e| VerificationError::infrastructure(e.to_string()))?
        {
            return self.resolve_existing(store.as_ref(), &existing, &user.id, plan).await;
        }

        // 7. Fetch the authoritative payment
        let payment = gateway.fetch_payment(&payment_id).await.map_err(|e| {
            tracing::warn!(
                payment_id = %payment_id,
                user_id = %user.id,
                code = %e.code,
                error = %e.message,
                "Payment lookup failed"
            );
            VerificationError::ProviderUnavailable
        })?;

        // 8. Validate capture, currency and amount
        if payment.id != payment_id.as_str() {
            tracing::warn!(
                payment_id = %payment_id,
                returned_id = %payment.id,
                "Provider returned a different payment"
            );
            return Err(VerificationError::ProviderUnavailable);
        }
        validate_capture(&payment, plan, &self.catalog).map_err(|mismatch| {
            tracing::warn!(
                payment_id = %payment_id,
                user_id = %user.id,
                reason = %mismatch,
                "Payment failed capture validation"
            );
            VerificationError::PaymentRejected(mismatch)
        })?;

        // 9. Payment metadata must name this caller and plan
        match payment.claimed_ownership() {
            Some((owner, claimed_plan)) if owner == user.id && claimed_plan == plan => {}
            _ => {
                tracing::warn!(
                    payment_id = %payment_id,
                    user_id = %user.id,
                    "Payment metadata does not match caller"
                );
                return Err(VerificationError::OwnershipMismatch);
            }
        }

        // 10. Reconcile atomically
        let reconciliation = Reconciliation::build(
            payment_id.clone(),
            user.id.clone(),
            plan,
            &payment,
            &self.catalog,
            VerificationSource::Api,
            Timestamp::now(),
        )
        .ok_or_else(|| VerificationError::infrastructure("period end out of range"))?;

        let outcome = store.reconcile(&reconciliation).await.map_err(|e| {
            tracing::error!(payment_id = %payment_id, error = %e, "Reconciliation failed");
            VerificationError::infrastructure(e.to_string())
        })?;

        match outcome {
            ReconcileOutcome::Applied => {
                tracing::info!(
                    payment_id = %payment_id,
                    user_id = %user.id,
                    plan = %plan,
                    period_end = %reconciliation.subscription.period_end.to_rfc3339(),
                    "Membership activated"
                );
                // 11. Report the new period
                Ok(VerifyPaymentResult::Verified(MembershipSummary::from(
                    &reconciliation.subscription,
                )))
            }
            ReconcileOutcome::AlreadyReconciled(existing) => {
                if existing.is_bound_to(&user.id, plan) {
                    self.resolve_existing(store.as_ref(), &existing, &user.id, plan).await
                } else {
                    tracing::warn!(
                        payment_id = %payment_id,
                        user_id = %user.id,
                        "Payment claimed concurrently by another subscription"
                    );
                    Err(VerificationError::AlreadyUsed)
                }
            }
        }
    }

    async fn enforce_rate_limit(&self, user_id: &UserId) -> Result<(), VerificationError> {
        let key = RateLimitKey::payment_verify(user_id);
        let result = self.rate_limiter.check(&key).await.map_err(|e| {
            tracing::error!(user_id = %user_id, error = %e, "Rate limiter unavailable");
            VerificationError::infrastructure(e.to_string())
        })?;

        match result {
            RateLimitResult::Allowed(_) => Ok(()),
            RateLimitResult::Denied(denied) => {
                tracing::info!(
                    user_id = %user_id,
                    retry_after_secs = denied.retry_after_secs,
                    "Payment verification rate limited"
                );
                Err(VerificationError::RateLimited {
                    retry_after_secs: denied.retry_after_secs,
                })
            }
        }
    }

    async fn resolve_existing(
        &self,
        store: &dyn MembershipStore,
        existing: &PaymentVerificationRecord,
        user_id: &UserId,
        plan: PlanType,
    ) -> Result<VerifyPaymentResult, VerificationError> {
        if !existing.is_bound_to(user_id, plan) {
            tracing::warn!(
                payment_id = %existing.payment_id,
                user_id = %user_id,
                "Payment already linked to another subscription"
            );
            return Err(VerificationError::AlreadyLinked);
        }

        let current = store
            .find_subscription(user_id)
            .await
            .map_err(|e| VerificationError::infrastructure(e.to_string()))?;

        tracing::debug!(payment_id = %existing.payment_id, "Payment already verified");
        Ok(VerifyPaymentResult::AlreadyVerified(
            current.as_ref().map(MembershipSummary::from),
        ))
    }
}
