//! Razorpay payment gateway adapter.
//!
//! Implements the `PaymentGateway` port against the Razorpay REST API.
//! Payments are fetched with HTTP basic auth (`key_id:key_secret`).
//!
//! # Configuration
//!
//! ```ignore
//! let config = RazorpayConfig::new(key_id, key_secret);
//! let gateway = RazorpayGateway::new(config)?;
//! let payment = gateway.fetch_payment(&payment_id).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::foundation::PaymentId;
use crate::domain::membership::ProviderPayment;
use crate::ports::{PaymentError, PaymentErrorCode, PaymentGateway};

/// Default Razorpay API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.razorpay.com";

/// Razorpay API configuration.
#[derive(Clone)]
pub struct RazorpayConfig {
    /// Public key identifier (rzp_live_... or rzp_test_...).
    key_id: String,

    /// Key secret paired with `key_id`.
    key_secret: SecretString,

    /// Base URL for the API (default: https://api.razorpay.com).
    api_base_url: String,

    /// Per-request timeout.
    timeout: Duration,
}

impl RazorpayConfig {
    /// Create a new Razorpay configuration.
    pub fn new(key_id: impl Into<String>, key_secret: SecretString) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `{base}/v1/payments/{id}`, with the id encoded as a single path segment.
    fn payment_url(&self, payment_id: &PaymentId) -> Result<reqwest::Url, PaymentError> {
        let invalid_base = || {
            PaymentError::new(
                PaymentErrorCode::ProviderError,
                format!("Invalid Razorpay base URL: {}", self.api_base_url),
            )
        };

        let mut url = reqwest::Url::parse(&self.api_base_url).map_err(|_| invalid_base())?;
        url.path_segments_mut()
            .map_err(|_| invalid_base())?
            .pop_if_empty()
            .push("v1")
            .push("payments")
            .push(payment_id.as_str());
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }
}

impl std::fmt::Debug for RazorpayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Error envelope returned by the Razorpay API.
#[derive(Debug, Deserialize)]
struct RazorpayErrorBody {
    error: RazorpayErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Razorpay payment gateway.
pub struct RazorpayGateway {
    config: RazorpayConfig,
    http_client: reqwest::Client,
}

impl RazorpayGateway {
    /// Create a new gateway with the given configuration.
    pub fn new(config: RazorpayConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, http_client })
    }

    fn error_from_response(status: reqwest::StatusCode, body: &str) -> PaymentError {
        let detail = serde_json::from_str::<RazorpayErrorBody>(body).ok().map(|b| b.error);
        let description = detail
            .as_ref()
            .and_then(|d| d.description.clone())
            .unwrap_or_else(|| format!("HTTP {}", status));

        let error = match status {
            reqwest::StatusCode::NOT_FOUND => PaymentError::not_found("Payment"),
            reqwest::StatusCode::UNAUTHORIZED => {
                PaymentError::authentication(format!("Razorpay rejected credentials: {}", description))
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => PaymentError::new(
                PaymentErrorCode::RateLimitExceeded,
                format!("Razorpay rate limit: {}", description),
            ),
            // Razorpay reports unknown payment IDs as 400 BAD_REQUEST_ERROR.
            reqwest::StatusCode::BAD_REQUEST => PaymentError::new(
                PaymentErrorCode::NotFound,
                format!("Razorpay rejected lookup: {}", description),
            ),
            _ => PaymentError::new(
                PaymentErrorCode::ProviderError,
                format!("Razorpay API error: {}", description),
            ),
        };

        match detail.and_then(|d| d.code) {
            Some(code) => error.with_provider_code(code),
            None => error,
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn fetch_payment(&self, payment_id: &PaymentId) -> Result<ProviderPayment, PaymentError> {
        let url = self.config.payment_url(payment_id)?;

        let response = self
            .http_client
            .get(url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.expose_secret()))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(payment_id = %payment_id, error = %e, "Razorpay request failed");
                PaymentError::network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = Self::error_from_response(status, &body);
            tracing::warn!(
                payment_id = %payment_id,
                %status,
                code = %error.code,
                "Razorpay payment lookup failed"
            );
            return Err(error);
        }

        response.json::<ProviderPayment>().await.map_err(|e| {
            tracing::error!(payment_id = %payment_id, error = %e, "Failed to parse Razorpay payment");
            PaymentError::new(
                PaymentErrorCode::ProviderError,
                format!("Failed to parse Razorpay response: {}", e),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RazorpayConfig {
        RazorpayConfig::new("rzp_test_key", SecretString::new("shh".to_string()))
    }

    #[test]
    fn payment_url_joins_base_and_id() {
        let config = config().with_base_url("http://localhost:9999/");
        let id = PaymentId::new("pay_123").unwrap();
        assert_eq!(
            config.payment_url(&id).unwrap().as_str(),
            "http://localhost:9999/v1/payments/pay_123"
        );

        let config = config.with_base_url("http://localhost:9999");
        assert_eq!(
            config.payment_url(&id).unwrap().as_str(),
            "http://localhost:9999/v1/payments/pay_123"
        );
    }

    #[test]
    fn payment_url_keeps_id_inside_one_segment() {
        let id = PaymentId::new("pay_x/../../orders?count=100#top").unwrap();
        let url = config().payment_url(&id).unwrap();

        assert_eq!(url.host_str(), Some("api.razorpay.com"));
        assert!(url.path().starts_with("/v1/payments/pay_x%2F"));
        assert_eq!(url.path_segments().map(|s| s.count()), Some(3));
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[test]
    fn unparseable_base_url_is_provider_error() {
        let config = config().with_base_url("not a url");
        let err = config.payment_url(&PaymentId::new("pay_1").unwrap()).unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::ProviderError);
    }

    #[test]
    fn debug_redacts_secret() {
        let debug = format!("{:?}", config());
        assert!(debug.contains("rzp_test_key"));
        assert!(!debug.contains("shh"));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Error Mapping
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn not_found_maps_to_not_found() {
        let err = RazorpayGateway::error_from_response(reqwest::StatusCode::NOT_FOUND, "");
        assert_eq!(err.code, PaymentErrorCode::NotFound);
        assert!(!err.retryable);
    }

    #[test]
    fn unauthorized_maps_to_authentication() {
        let err = RazorpayGateway::error_from_response(reqwest::StatusCode::UNAUTHORIZED, "");
        assert_eq!(err.code, PaymentErrorCode::AuthenticationError);
    }

    #[test]
    fn throttling_is_retryable() {
        let err = RazorpayGateway::error_from_response(reqwest::StatusCode::TOO_MANY_REQUESTS, "");
        assert_eq!(err.code, PaymentErrorCode::RateLimitExceeded);
        assert!(err.retryable);
    }

    #[test]
    fn bad_request_carries_provider_code_and_description() {
        let body = r#"{"error":{"code":"BAD_REQUEST_ERROR","description":"The id provided does not exist"}}"#;
        let err = RazorpayGateway::error_from_response(reqwest::StatusCode::BAD_REQUEST, body);
        assert_eq!(err.code, PaymentErrorCode::NotFound);
        assert_eq!(err.provider_code.as_deref(), Some("BAD_REQUEST_ERROR"));
        assert!(err.message.contains("does not exist"));
    }

    #[test]
    fn server_error_maps_to_provider_error() {
        let err = RazorpayGateway::error_from_response(
            reqwest::StatusCode::BAD_GATEWAY,
            "<html>upstream</html>",
        );
        assert_eq!(err.code, PaymentErrorCode::ProviderError);
        assert!(err.message.contains("502"));
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let gateway = RazorpayGateway::new(
            config()
                .with_base_url("http://127.0.0.1:1")
                .with_timeout(Duration::from_millis(500)),
        )
        .unwrap();

        let err = gateway
            .fetch_payment(&PaymentId::new("pay_1").unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.code, PaymentErrorCode::NetworkError);
    }
}
