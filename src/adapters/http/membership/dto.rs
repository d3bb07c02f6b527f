//! HTTP DTOs (Data Transfer Objects) for payment and membership endpoints.
//!
//! The two payment paths keep separate envelopes: client-verify answers with
//! `{success, ...}` and the provider webhook with `{ok, ...}`.

use serde::{Deserialize, Serialize};

use crate::application::handlers::membership::{GetMembershipResult, MembershipSummary};
use crate::domain::membership::SubscriptionState;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/payments/verify`.
///
/// Fields default to empty so that a malformed body still passes through
/// authentication and rate limiting before it is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub payment_id: String,
    pub plan_type: String,
}

impl VerifyPaymentRequest {
    /// Parses the body, treating anything that is not a JSON object of
    /// strings as an empty request.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Client-verify responses
// ════════════════════════════════════════════════════════════════════════════════

/// Membership block of a successful verification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipDto {
    pub plan: String,
    pub status: String,
    pub plan_type: String,
    /// End of the paid period (ISO 8601)
    pub period_end: String,
}

impl From<&MembershipSummary> for MembershipDto {
    fn from(summary: &MembershipSummary) -> Self {
        Self {
            plan: summary.plan.clone(),
            status: summary.status.as_str().to_string(),
            plan_type: summary.plan_type.as_str().to_string(),
            period_end: summary.period_end.to_rfc3339(),
        }
    }
}

/// `200` response of the client-verify endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership: Option<MembershipDto>,
}

/// Error envelope shared by the client-facing endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook responses
// ════════════════════════════════════════════════════════════════════════════════

/// Webhook acknowledgement. `error` is only present when `ok` is false.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookResponse {
    pub fn ok() -> Self {
        Self { ok: true, error: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Membership read model
// ════════════════════════════════════════════════════════════════════════════════

/// Stored subscription, as returned by `GET /api/membership`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDto {
    pub plan: String,
    pub plan_type: String,
    pub status: String,
    pub provider: String,
    pub last_payment_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub period_start: String,
    pub period_end: String,
}

impl From<&SubscriptionState> for SubscriptionDto {
    fn from(state: &SubscriptionState) -> Self {
        Self {
            plan: state.plan.clone(),
            plan_type: state.plan_type.as_str().to_string(),
            status: state.status.as_str().to_string(),
            provider: state.provider.clone(),
            last_payment_id: state.last_payment_id.to_string(),
            amount_minor: state.amount_minor,
            currency: state.currency.clone(),
            period_start: state.period_start.to_rfc3339(),
            period_end: state.period_end.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    pub success: bool,
    pub user_id: String,
    pub is_active: bool,
    pub subscription: Option<SubscriptionDto>,
}

impl From<GetMembershipResult> for MembershipResponse {
    fn from(result: GetMembershipResult) -> Self {
        Self {
            success: true,
            user_id: result.user_id.to_string(),
            is_active: result.is_active,
            subscription: result.subscription.as_ref().map(SubscriptionDto::from),
        }
    }
}
