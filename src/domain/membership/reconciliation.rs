//! Reconciliation: turning a validated payment into the four membership writes.
//!
//! Both payment paths build a [`Reconciliation`] and hand it to the store,
//! which applies it atomically. Creating the verification record is the
//! linearization point: the store writes it create-only, and whoever loses
//! the race receives [`ReconcileOutcome::AlreadyReconciled`] instead of
//! applying a second period.

use crate::domain::foundation::{PaymentId, Timestamp, UserId};

use super::payment::ProviderPayment;
use super::plan::{PlanCatalog, PlanType};
use super::records::{
    PaymentVerificationRecord, PublicUserMarker, SubscriptionState, SubscriptionStatus,
    TransactionRecord, VerificationSource,
};

/// Name recorded as the provider on every record.
pub const PAYMENT_PROVIDER: &str = "razorpay";

/// Computes the end of the paid period starting at `now`.
///
/// The period always starts from the verification time; an unexpired
/// earlier period is not extended.
pub fn period_end(plan: PlanType, now: Timestamp) -> Option<Timestamp> {
    now.add_calendar_months(plan.period_months())
}

/// Result of applying a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// This call created the verification record and applied all writes.
    Applied,
    /// A record for this payment already existed; nothing was written.
    AlreadyReconciled(PaymentVerificationRecord),
}

/// The complete, atomic set of writes for one payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub verification: PaymentVerificationRecord,
    pub subscription: SubscriptionState,
    pub transaction: TransactionRecord,
    pub marker: PublicUserMarker,
}

impl Reconciliation {
    /// Builds the writes for a payment that has already passed validation.
    ///
    /// Returns `None` only if the period end is not representable.
    pub fn build(
        payment_id: PaymentId,
        user_id: UserId,
        plan: PlanType,
        payment: &ProviderPayment,
        catalog: &PlanCatalog,
        source: VerificationSource,
        now: Timestamp,
    ) -> Option<Self> {
        let details = catalog.details(plan);
        let period_end = period_end(plan, now)?;

        let verification = PaymentVerificationRecord {
            payment_id: payment_id.clone(),
            user_id: user_id.clone(),
            plan_type: plan,
            provider: PAYMENT_PROVIDER.to_string(),
            source,
            verified_at: now,
        };

        let subscription = SubscriptionState {
            user_id: user_id.clone(),
            plan: details.label.to_string(),
            plan_type: plan,
            status: SubscriptionStatus::Active,
            provider: PAYMENT_PROVIDER.to_string(),
            last_payment_id: payment_id.clone(),
            amount_minor: payment.amount,
            currency: payment.currency.to_uppercase(),
            period_start: now,
            period_end,
            created_at: now,
            updated_at: now,
        };

        let transaction = TransactionRecord {
            payment_id,
            user_id,
            plan_type: plan,
            amount_minor: payment.amount,
            currency: payment.currency.to_uppercase(),
            method: payment.method.clone(),
            email: payment.email.clone(),
            contact: payment.contact.clone(),
            provider_status: payment.status.clone(),
            captured: payment.captured,
            source,
            provider_created_at: payment.created_at.and_then(Timestamp::from_unix_secs),
            recorded_at: now,
        };

        let marker = PublicUserMarker::from(&subscription);

        Some(Self {
            verification,
            subscription,
            transaction,
            marker,
        })
    }

    pub fn payment_id(&self) -> &PaymentId {
        &self.verification.payment_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.verification.user_id
    }
}
