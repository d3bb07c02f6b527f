//! Client-verify error types.
//!
//! Every gate of the verify flow fails with one of these. Nothing is
//! written before a failure, so all of them are safe for the user to retry
//! except the conflict variants, which are terminal.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Configuration | 500 |
//! | Unauthenticated | 401 |
//! | RateLimited | 429 |
//! | InvalidRequest | 400 |
//! | PaymentRejected | 400 |
//! | ProviderUnavailable | 400 |
//! | OwnershipMismatch | 403 |
//! | AlreadyLinked | 409 |
//! | AlreadyUsed | 409 |
//! | Infrastructure | 500 |

use axum::http::StatusCode;

use crate::domain::foundation::{AuthError, ValidationError};

use super::payment::PaymentMismatch;

/// Errors returned by the client-verify path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// A server-side dependency or credential is missing.
    Configuration(&'static str),

    /// Bearer token missing, invalid or expired.
    Unauthenticated(&'static str),

    /// Attempt ceiling reached for the current window.
    RateLimited { retry_after_secs: u32 },

    /// Request body failed validation.
    InvalidRequest { field: String, message: String },

    /// Provider reports a payment that cannot activate this plan.
    PaymentRejected(PaymentMismatch),

    /// Provider lookup failed or returned an unexpected object.
    ProviderUnavailable,

    /// Payment metadata names a different user or plan than the caller.
    OwnershipMismatch,

    /// Payment was already verified for a different user or plan.
    AlreadyLinked,

    /// Payment was claimed concurrently by a different user or plan.
    AlreadyUsed,

    /// Store or rate-limit backend failure.
    Infrastructure(String),
}

impl VerificationError {
    pub fn invalid_request(field: impl Into<String>, message: impl Into<String>) -> Self {
        VerificationError::InvalidRequest {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        VerificationError::Infrastructure(message.into())
    }

    /// Maps the error to the HTTP status returned to the client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            VerificationError::Configuration(_) | VerificationError::Infrastructure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            VerificationError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            VerificationError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            VerificationError::InvalidRequest { .. }
            | VerificationError::PaymentRejected(_)
            | VerificationError::ProviderUnavailable => StatusCode::BAD_REQUEST,
            VerificationError::OwnershipMismatch => StatusCode::FORBIDDEN,
            VerificationError::AlreadyLinked | VerificationError::AlreadyUsed => {
                StatusCode::CONFLICT
            }
        }
    }

    /// Message safe to show the caller. Infrastructure detail is never included.
    pub fn message(&self) -> String {
        match self {
            VerificationError::Configuration(_) => "Payment verification is not configured".to_string(),
            VerificationError::Unauthenticated(reason) => reason.to_string(),
            VerificationError::RateLimited { retry_after_secs } => format!(
                "Too many verification attempts. Try again in {} seconds",
                retry_after_secs
            ),
            VerificationError::InvalidRequest { field, message } => {
                format!("Invalid {}: {}", field, message)
            }
            VerificationError::PaymentRejected(mismatch) => {
                format!("Payment could not be verified: {}", mismatch)
            }
            VerificationError::ProviderUnavailable => "Unable to verify payment".to_string(),
            VerificationError::OwnershipMismatch => {
                "Payment does not belong to this account or plan".to_string()
            }
            VerificationError::AlreadyLinked => {
                "Payment is already linked to a different subscription".to_string()
            }
            VerificationError::AlreadyUsed => "Payment has already been used".to_string(),
            VerificationError::Infrastructure(_) => "Internal server error".to_string(),
        }
    }
}

impl std::fmt::Display for VerificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationError::Configuration(what) => write!(f, "not configured: {}", what),
            VerificationError::Infrastructure(detail) => write!(f, "infrastructure: {}", detail),
            other => write!(f, "{}", other.message()),
        }
    }
}

impl std::error::Error for VerificationError {}

impl From<AuthError> for VerificationError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => VerificationError::Unauthenticated("Token expired"),
            AuthError::InvalidToken | AuthError::ServiceUnavailable(_) => {
                VerificationError::Unauthenticated("Invalid or expired token")
            }
        }
    }
}

impl From<ValidationError> for VerificationError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyField { field } => {
                VerificationError::invalid_request(field, "is required")
            }
            ValidationError::InvalidFormat { field, reason } => {
                VerificationError::invalid_request(field, reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ══════════════════════════════════════════════════════════════
    // Status Code Mapping Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn each_variant_maps_to_documented_status() {
        let cases = [
            (VerificationError::Configuration("store"), 500),
            (VerificationError::Unauthenticated("Missing bearer token"), 401),
            (VerificationError::RateLimited { retry_after_secs: 10 }, 429),
            (VerificationError::invalid_request("plan_type", "unknown"), 400),
            (VerificationError::PaymentRejected(PaymentMismatch::CaptureFlagUnset), 400),
            (VerificationError::ProviderUnavailable, 400),
            (VerificationError::OwnershipMismatch, 403),
            (VerificationError::AlreadyLinked, 409),
            (VerificationError::AlreadyUsed, 409),
            (VerificationError::infrastructure("boom"), 500),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{:?}", err);
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Message Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn infrastructure_message_does_not_leak_detail() {
        let err = VerificationError::infrastructure("password authentication failed for user");
        assert_eq!(err.message(), "Internal server error");
        assert!(err.to_string().contains("password authentication"));
    }

    #[test]
    fn configuration_message_does_not_name_secret() {
        let err = VerificationError::Configuration("payment key secret");
        assert_eq!(err.message(), "Payment verification is not configured");
    }

    #[test]
    fn rate_limited_message_includes_retry_after() {
        let err = VerificationError::RateLimited { retry_after_secs: 42 };
        assert!(err.message().contains("42"));
    }

    // ══════════════════════════════════════════════════════════════
    // Conversion Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn auth_errors_become_unauthenticated() {
        assert_eq!(
            VerificationError::from(AuthError::TokenExpired),
            VerificationError::Unauthenticated("Token expired")
        );
        assert_eq!(
            VerificationError::from(AuthError::InvalidToken).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn validation_errors_become_invalid_request() {
        let err = VerificationError::from(ValidationError::empty_field("payment_id"));
        assert_eq!(err, VerificationError::invalid_request("payment_id", "is required"));
    }
}
