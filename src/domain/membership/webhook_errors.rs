//! Webhook error types for provider webhook handling.
//!
//! Only hard failures live here. Events that are valid but not actionable
//! are reported as an ignored outcome, never as an error, so the provider
//! does not retry them.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Store or signing secret is not configured on this server.
    #[error("Webhook processing is not configured: {0}")]
    NotConfigured(&'static str),

    /// Request carried no signature header.
    #[error("Missing signature")]
    MissingSignature,

    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if the provider should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Database(_) | WebhookError::NotConfigured(_))
    }

    /// Maps the error to an appropriate HTTP status code.
    ///
    /// Status codes determine provider retry behavior:
    /// - 2xx: Event acknowledged, no retry
    /// - 4xx: Client error, no retry
    /// - 5xx: Server error, will retry
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MissingSignature | WebhookError::InvalidSignature => {
                StatusCode::UNAUTHORIZED
            }
            WebhookError::NotConfigured(_) | WebhookError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to return to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            WebhookError::NotConfigured(_) => "Webhook endpoint is not configured",
            WebhookError::MissingSignature => "Missing signature",
            WebhookError::InvalidSignature => "Invalid signature",
            WebhookError::Database(_) => "Internal server error",
        }
    }
}
