//! Persisted membership records.
//!
//! Four documents change together whenever a payment is reconciled:
//! the verification record (idempotency lock), the per-user subscription,
//! an append-only transaction entry, and the public premium marker.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{PaymentId, Timestamp, UserId, ValidationError};

use super::plan::PlanType;

/// Which entry point reconciled a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationSource {
    /// Client-verify endpoint.
    Api,
    /// Provider webhook.
    Webhook,
}

impl VerificationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationSource::Api => "api",
            VerificationSource::Webhook => "webhook",
        }
    }
}

impl fmt::Display for VerificationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VerificationSource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api" => Ok(VerificationSource::Api),
            "webhook" => Ok(VerificationSource::Webhook),
            other => Err(ValidationError::invalid_format(
                "source",
                format!("unknown source '{}'", other),
            )),
        }
    }
}

/// Subscription status. Inactive is represented by absence of state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

/// Idempotency lock for one provider payment. Created once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVerificationRecord {
    pub payment_id: PaymentId,
    pub user_id: UserId,
    pub plan_type: PlanType,
    pub provider: String,
    pub source: VerificationSource,
    pub verified_at: Timestamp,
}

impl PaymentVerificationRecord {
    /// True when this payment was reconciled for the given user and plan.
    pub fn is_bound_to(&self, user_id: &UserId, plan_type: PlanType) -> bool {
        &self.user_id == user_id && self.plan_type == plan_type
    }
}

/// Current paid membership of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionState {
    pub user_id: UserId,
    /// Tier label, e.g. `premium_yearly`.
    pub plan: String,
    pub plan_type: PlanType,
    pub status: SubscriptionStatus,
    pub provider: String,
    pub last_payment_id: PaymentId,
    pub amount_minor: i64,
    pub currency: String,
    pub period_start: Timestamp,
    pub period_end: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SubscriptionState {
    /// Merges this new state over an existing one.
    ///
    /// Every field is replaced except `created_at`, which keeps the first
    /// activation time.
    pub fn merged_over(mut self, existing: Option<&SubscriptionState>) -> Self {
        if let Some(existing) = existing {
            self.created_at = existing.created_at;
        }
        self
    }
}

/// Append-only audit entry for one reconciled payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub payment_id: PaymentId,
    pub user_id: UserId,
    pub plan_type: PlanType,
    pub amount_minor: i64,
    pub currency: String,
    pub method: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub provider_status: String,
    pub captured: bool,
    pub source: VerificationSource,
    pub provider_created_at: Option<Timestamp>,
    pub recorded_at: Timestamp,
}

/// Denormalized `{isPremium, plan, status}` projection for cheap reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUserMarker {
    pub user_id: UserId,
    pub is_premium: bool,
    pub plan: String,
    pub status: SubscriptionStatus,
    pub updated_at: Timestamp,
}

impl From<&SubscriptionState> for PublicUserMarker {
    fn from(state: &SubscriptionState) -> Self {
        Self {
            user_id: state.user_id.clone(),
            is_premium: state.status == SubscriptionStatus::Active,
            plan: state.plan.clone(),
            status: state.status,
            updated_at: state.updated_at,
        }
    }
}
