//! Provider-neutral payment object and capture validation.
//!
//! Both payment paths end up holding a [`ProviderPayment`]: the client-verify
//! path fetches one from the provider API, the webhook path pulls one out of
//! the signed event body. The checks that decide whether it may activate a
//! membership live here so the two paths cannot drift apart.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::domain::foundation::UserId;

use super::plan::{PlanCatalog, PlanType};

/// Provider status for funds that have been collected.
pub const CAPTURED_STATUS: &str = "captured";

/// Authoritative payment record as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderPayment {
    pub id: String,
    /// Amount in minor currency units.
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub captured: bool,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    /// Provider-side creation time, Unix seconds.
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_notes")]
    pub notes: PaymentNotes,
}

/// Metadata the checkout embedded in the payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNotes {
    #[serde(default)]
    pub user_uid: Option<String>,
    #[serde(default)]
    pub plan_type: Option<String>,
}

/// Providers send `notes: []` when no notes were attached.
fn deserialize_notes<'de, D>(deserializer: D) -> Result<PaymentNotes, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NotesRepr {
        List(Vec<serde_json::Value>),
        Map(PaymentNotes),
        Null(()),
    }

    Ok(match NotesRepr::deserialize(deserializer)? {
        NotesRepr::List(_) | NotesRepr::Null(()) => PaymentNotes::default(),
        NotesRepr::Map(notes) => notes,
    })
}

impl ProviderPayment {
    /// The user and plan the checkout bound this payment to, if both are present and valid.
    pub fn claimed_ownership(&self) -> Option<(UserId, PlanType)> {
        let user = self
            .notes
            .user_uid
            .as_deref()
            .and_then(|uid| UserId::new(uid).ok())?;
        let plan = self.notes.plan_type.as_deref()?.parse().ok()?;
        Some((user, plan))
    }
}

/// Reason a payment cannot activate the plan it was submitted for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentMismatch {
    #[error("payment status is '{0}', expected captured")]
    NotCaptured(String),

    #[error("payment capture flag is not set")]
    CaptureFlagUnset,

    #[error("currency {actual} does not match {expected}")]
    Currency { expected: String, actual: String },

    #[error("amount {actual} does not match plan price {expected}")]
    Amount { expected: i64, actual: i64 },
}

/// Checks that a payment is a completed capture of exactly the plan's price.
///
/// Amounts are compared as integer minor units.
pub fn validate_capture(
    payment: &ProviderPayment,
    plan: PlanType,
    catalog: &PlanCatalog,
) -> Result<(), PaymentMismatch> {
    if payment.status != CAPTURED_STATUS {
        return Err(PaymentMismatch::NotCaptured(payment.status.clone()));
    }
    if !payment.captured {
        return Err(PaymentMismatch::CaptureFlagUnset);
    }
    if !payment.currency.eq_ignore_ascii_case(catalog.currency()) {
        return Err(PaymentMismatch::Currency {
            expected: catalog.currency().to_string(),
            actual: payment.currency.clone(),
        });
    }
    let expected = catalog.details(plan).amount_minor;
    if payment.amount != expected {
        return Err(PaymentMismatch::Amount {
            expected,
            actual: payment.amount,
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A captured payment for `plan` that passes validation against `test_catalog()`.
    pub fn captured_payment(id: &str, user: &str, plan: PlanType) -> ProviderPayment {
        let amount = match plan {
            PlanType::Monthly => 100,
            PlanType::Yearly => 1000,
        };
        ProviderPayment {
            id: id.to_string(),
            amount,
            currency: "INR".to_string(),
            status: CAPTURED_STATUS.to_string(),
            captured: true,
            method: Some("upi".to_string()),
            email: Some(format!("{}@example.com", user)),
            contact: Some("+910000000000".to_string()),
            created_at: Some(1_704_067_200),
            notes: PaymentNotes {
                user_uid: Some(user.to_string()),
                plan_type: Some(plan.as_str().to_string()),
            },
        }
    }

    pub fn test_catalog() -> PlanCatalog {
        PlanCatalog::new("INR", 100, 1000)
    }
}
