//! Membership domain module.
//!
//! Plans, payment validation and the reconciliation writes shared by the
//! client-verify and webhook paths.
//!
//! # Module Structure
//!
//! - `plan` - Plan types and the server-held price table
//! - `payment` - Provider payment object and capture checks
//! - `records` - Persisted verification, subscription, transaction and marker records
//! - `reconciliation` - Builds the atomic write set for one payment
//! - `webhook_verifier` - HMAC-SHA256 signature verification
//! - `webhook_event` - Classifies verified webhook bodies

mod errors;
mod payment;
mod plan;
mod reconciliation;
mod records;
mod webhook_errors;
mod webhook_event;
mod webhook_verifier;

pub use errors::VerificationError;
pub use payment::{validate_capture, PaymentMismatch, PaymentNotes, ProviderPayment, CAPTURED_STATUS};
pub use plan::{PlanCatalog, PlanDetails, PlanType};
pub use reconciliation::{period_end, ReconcileOutcome, Reconciliation, PAYMENT_PROVIDER};
pub use records::{
    PaymentVerificationRecord, PublicUserMarker, SubscriptionState, SubscriptionStatus,
    TransactionRecord, VerificationSource,
};
pub use webhook_errors::WebhookError;
pub use webhook_event::{classify_webhook, ActionablePayment, IgnoreReason, PAYMENT_CAPTURED_EVENT};
pub use webhook_verifier::WebhookSignatureVerifier;

#[cfg(test)]
pub(crate) use payment::fixtures;
#[cfg(test)]
pub(crate) use webhook_verifier::compute_test_signature;
