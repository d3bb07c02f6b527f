//! Classification of verified webhook bodies.
//!
//! A verified body either describes a payment this service can reconcile
//! or it is ignored with a reason. Nothing here is an error: webhook
//! delivery is best-effort and unresolvable events must not be retried.

use serde::Deserialize;
use std::fmt;

use crate::domain::foundation::{PaymentId, UserId};

use super::payment::{validate_capture, PaymentMismatch, ProviderPayment};
use super::plan::{PlanCatalog, PlanType};

/// The only event type that activates memberships.
pub const PAYMENT_CAPTURED_EVENT: &str = "payment.captured";

#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    event: String,
    #[serde(default)]
    payload: EnvelopePayload,
}

#[derive(Debug, Default, Deserialize)]
struct EnvelopePayload {
    #[serde(default)]
    payment: Option<EntityWrapper>,
}

#[derive(Debug, Deserialize)]
struct EntityWrapper {
    entity: serde_json::Value,
}

/// A captured payment that passed every webhook check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionablePayment {
    pub payment_id: PaymentId,
    pub user_id: UserId,
    pub plan: PlanType,
    pub payment: ProviderPayment,
}

/// Why a verified webhook was acknowledged without action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    MalformedBody,
    UnhandledEvent(String),
    MissingPaymentEntity,
    IncompletePayment,
    MissingOwnership,
    InvalidPayment(PaymentMismatch),
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::MalformedBody => write!(f, "body is not a webhook event"),
            IgnoreReason::UnhandledEvent(event) => write!(f, "unhandled event '{}'", event),
            IgnoreReason::MissingPaymentEntity => write!(f, "event has no payment entity"),
            IgnoreReason::IncompletePayment => write!(f, "payment entity is missing required fields"),
            IgnoreReason::MissingOwnership => write!(f, "payment notes lack a valid user or plan"),
            IgnoreReason::InvalidPayment(mismatch) => write!(f, "{}", mismatch),
        }
    }
}

/// Decides whether a verified webhook body should be reconciled.
pub fn classify_webhook(body: &[u8], catalog: &PlanCatalog) -> Result<ActionablePayment, IgnoreReason> {
    let envelope: WebhookEnvelope =
        serde_json::from_slice(body).map_err(|_| IgnoreReason::MalformedBody)?;

    if envelope.event != PAYMENT_CAPTURED_EVENT {
        return Err(IgnoreReason::UnhandledEvent(envelope.event));
    }

    let entity = envelope
        .payload
        .payment
        .ok_or(IgnoreReason::MissingPaymentEntity)?
        .entity;

    let payment: ProviderPayment =
        serde_json::from_value(entity).map_err(|_| IgnoreReason::IncompletePayment)?;
    let payment_id =
        PaymentId::new(payment.id.clone()).map_err(|_| IgnoreReason::IncompletePayment)?;

    let (user_id, plan) = payment
        .claimed_ownership()
        .ok_or(IgnoreReason::MissingOwnership)?;

    validate_capture(&payment, plan, catalog).map_err(IgnoreReason::InvalidPayment)?;

    Ok(ActionablePayment {
        payment_id,
        user_id,
        plan,
        payment,
    })
}
