//! Payment configuration (Razorpay)
//!
//! Credentials are optional at load time. A missing key pair or webhook
//! secret surfaces as a configuration error on the request that needs it.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use crate::adapters::payment::{RazorpayConfig, DEFAULT_API_BASE_URL};
use crate::domain::membership::{PlanCatalog, WebhookSignatureVerifier};

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Razorpay key ID
    pub key_id: Option<String>,

    /// Razorpay key secret
    pub key_secret: Option<SecretString>,

    /// Webhook signing secret
    pub webhook_secret: Option<SecretString>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Provider lookup timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// ISO currency payments must be made in
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Monthly plan price in minor units
    #[serde(default = "default_monthly_price")]
    pub monthly_price_minor: i64,

    /// Yearly plan price in minor units
    #[serde(default = "default_yearly_price")]
    pub yearly_price_minor: i64,

    /// Prefix every provider payment ID carries
    #[serde(default = "default_payment_id_prefix")]
    pub payment_id_prefix: String,
}

impl PaymentConfig {
    /// The plan table shared by both payment paths.
    pub fn catalog(&self) -> PlanCatalog {
        PlanCatalog::new(
            self.currency.clone(),
            self.monthly_price_minor,
            self.yearly_price_minor,
        )
    }

    /// Gateway settings, when both halves of the key pair are present.
    pub fn razorpay_config(&self) -> Option<RazorpayConfig> {
        let key_id = self.key_id.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
        let key_secret = self
            .key_secret
            .as_ref()
            .filter(|s| !s.expose_secret().trim().is_empty())?;

        Some(
            RazorpayConfig::new(key_id, key_secret.clone())
                .with_base_url(self.api_base_url.clone())
                .with_timeout(Duration::from_secs(self.request_timeout_secs)),
        )
    }

    /// Signature verifier, when a webhook secret is present.
    pub fn webhook_verifier(&self) -> Option<WebhookSignatureVerifier> {
        self.webhook_secret
            .as_ref()
            .filter(|s| !s.expose_secret().trim().is_empty())
            .map(|s| WebhookSignatureVerifier::new(s.clone()))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidCurrency);
        }
        if self.monthly_price_minor <= 0 || self.yearly_price_minor <= 0 {
            return Err(ValidationError::InvalidPlanPrice);
        }
        if self.payment_id_prefix.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__PAYMENT_ID_PREFIX"));
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 60 {
            return Err(ValidationError::InvalidTimeout);
        }
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://") {
            return Err(ValidationError::InvalidProviderUrl);
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            key_id: None,
            key_secret: None,
            webhook_secret: None,
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout(),
            currency: default_currency(),
            monthly_price_minor: default_monthly_price(),
            yearly_price_minor: default_yearly_price(),
            payment_id_prefix: default_payment_id_prefix(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_currency() -> String {
    PlanCatalog::DEFAULT_CURRENCY.to_string()
}

fn default_monthly_price() -> i64 {
    PlanCatalog::DEFAULT_MONTHLY_PRICE_MINOR
}

fn default_yearly_price() -> i64 {
    PlanCatalog::DEFAULT_YEARLY_PRICE_MINOR
}

fn default_payment_id_prefix() -> String {
    "pay_".to_string()
}
