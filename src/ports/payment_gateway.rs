//! Payment gateway port for out-of-band payment lookup.
//!
//! The client-verify path never trusts what the browser reports about a
//! payment. It asks the provider for the authoritative record through this
//! port, using server-held credentials.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::PaymentId;
use crate::domain::membership::ProviderPayment;

/// Looks up payments at the provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Fetch the provider's authoritative record for a payment.
    async fn fetch_payment(&self, payment_id: &PaymentId) -> Result<ProviderPayment, PaymentError>;
}

/// Payment provider error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentError {
    /// Error code for categorization.
    pub code: PaymentErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl PaymentError {
    /// Create a new payment error.
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Create with provider code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Network connectivity issue or timeout.
    NetworkError,

    /// API credentials were rejected.
    AuthenticationError,

    /// Payment does not exist at the provider.
    NotFound,

    /// Provider throttled the request.
    RateLimitExceeded,

    /// Provider returned an error or an unparseable body.
    ProviderError,
}

impl PaymentErrorCode {
    /// Whether an error with this code may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError
                | PaymentErrorCode::RateLimitExceeded
                | PaymentErrorCode::ProviderError
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_errors_are_retryable() {
        assert!(PaymentError::network("timeout").retryable);
    }

    #[test]
    fn not_found_is_not_retryable() {
        let err = PaymentError::not_found("Payment");
        assert!(!err.retryable);
        assert_eq!(err.message, "Payment not found");
    }

    #[test]
    fn authentication_errors_are_not_retryable() {
        assert!(!PaymentError::authentication("bad key").retryable);
    }

    #[test]
    fn display_includes_code_and_message() {
        let err = PaymentError::new(PaymentErrorCode::ProviderError, "502 from upstream")
            .with_provider_code("SERVER_ERROR");
        assert_eq!(err.to_string(), "provider_error: 502 from upstream");
        assert_eq!(err.provider_code.as_deref(), Some("SERVER_ERROR"));
    }

    #[test]
    fn payment_gateway_trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn PaymentGateway>();
    }
}
