//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `PORTFOLIO_BILLING`
//! prefix and nested values use double underscores as separators.
//!
//! Only `server`, `payment` and `rate_limit` have full defaults. The
//! `database`, `redis` and `auth` sections are optional:
//!
//! - without `database`, the payment endpoints answer 500 unless
//!   `server.in_memory_store` is set (development only)
//! - without `redis`, rate limits use the database or process memory
//! - without `auth`, every bearer token is rejected; production refuses to
//!   start without it
//!
//! # Example
//!
//! ```no_run
//! use portfolio_billing::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr().unwrap());
//! ```

mod auth;
mod database;
mod error;
mod payment;
mod rate_limit;
mod redis;
mod server;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use rate_limit::RateLimitConfig;
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Where reconciled memberships are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    InMemory,
}

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL membership store and rate limit buckets
    pub database: Option<DatabaseConfig>,

    /// Shared rate limit counters
    pub redis: Option<RedisConfig>,

    /// Session token validation (OIDC)
    pub auth: Option<AuthConfig>,

    /// Provider credentials, webhook secret and plan prices
    #[serde(default)]
    pub payment: PaymentConfig,

    /// Verification attempt ceiling
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PORTFOLIO_BILLING` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PORTFOLIO_BILLING__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PORTFOLIO_BILLING__PAYMENT__KEY_ID=...` -> `payment.key_id = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PORTFOLIO_BILLING")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Payment secrets are not required here; their absence is reported
    /// per request as a configuration error.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if self.is_production() && self.auth.is_none() {
            return Err(ValidationError::MissingRequired("AUTH__ISSUER_URL"));
        }
        if let Some(database) = &self.database {
            database.validate()?;
        }
        if let Some(redis) = &self.redis {
            redis.validate()?;
        }
        if let Some(auth) = &self.auth {
            auth.validate(&self.server.environment)?;
        }
        self.payment.validate()?;
        self.rate_limit.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }

    /// Membership store to wire, or `None` when neither a database nor the
    /// in-memory store is configured.
    pub fn store_backend(&self) -> Option<StoreBackend> {
        if self.database.is_some() {
            Some(StoreBackend::Postgres)
        } else if self.server.in_memory_store {
            Some(StoreBackend::InMemory)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "PORTFOLIO_BILLING__SERVER__PORT",
        "PORTFOLIO_BILLING__SERVER__ENVIRONMENT",
        "PORTFOLIO_BILLING__SERVER__IN_MEMORY_STORE",
        "PORTFOLIO_BILLING__DATABASE__URL",
        "PORTFOLIO_BILLING__AUTH__ISSUER_URL",
        "PORTFOLIO_BILLING__AUTH__AUDIENCE",
        "PORTFOLIO_BILLING__PAYMENT__KEY_ID",
        "PORTFOLIO_BILLING__PAYMENT__KEY_SECRET",
        "PORTFOLIO_BILLING__PAYMENT__WEBHOOK_SECRET",
        "PORTFOLIO_BILLING__RATE_LIMIT__MAX_ATTEMPTS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn load_with(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        clear_env();
        for (key, value) in vars {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        clear_env();
        result
    }

    // ══════════════════════════════════════════════════════════════
    // Loading
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn loads_with_no_variables() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[]).unwrap();

        assert!(config.database.is_none());
        assert!(config.redis.is_none());
        assert!(config.auth.is_none());
        assert_eq!(config.store_backend(), None);
        assert!(config.payment.razorpay_config().is_none());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.rate_limit.max_attempts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn loads_nested_sections() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[
            ("PORTFOLIO_BILLING__SERVER__PORT", "3000"),
            ("PORTFOLIO_BILLING__DATABASE__URL", "postgres://billing@localhost/billing"),
            ("PORTFOLIO_BILLING__AUTH__ISSUER_URL", "https://auth.example.com"),
            ("PORTFOLIO_BILLING__AUTH__AUDIENCE", "portfolio"),
            ("PORTFOLIO_BILLING__PAYMENT__KEY_ID", "rzp_test_1"),
            ("PORTFOLIO_BILLING__PAYMENT__KEY_SECRET", "secret"),
            ("PORTFOLIO_BILLING__PAYMENT__WEBHOOK_SECRET", "whsec"),
            ("PORTFOLIO_BILLING__RATE_LIMIT__MAX_ATTEMPTS", "3"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(
            config.database.as_ref().map(|d| d.url.as_str()),
            Some("postgres://billing@localhost/billing")
        );
        assert_eq!(config.auth.as_ref().map(|a| a.audience.as_str()), Some("portfolio"));
        assert!(config.payment.razorpay_config().is_some());
        assert!(config.payment.webhook_verifier().is_some());
        assert_eq!(config.rate_limit.policy().max_attempts, 3);
        assert_eq!(config.store_backend(), Some(StoreBackend::Postgres));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn in_memory_store_requires_explicit_flag() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[("PORTFOLIO_BILLING__SERVER__IN_MEMORY_STORE", "true")]).unwrap();

        assert_eq!(config.store_backend(), Some(StoreBackend::InMemory));
        assert!(config.validate().is_ok());
    }

    // ══════════════════════════════════════════════════════════════
    // Validation
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn production_auth_must_be_https() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[
            ("PORTFOLIO_BILLING__SERVER__ENVIRONMENT", "production"),
            ("PORTFOLIO_BILLING__AUTH__ISSUER_URL", "http://auth.example.com"),
            ("PORTFOLIO_BILLING__AUTH__AUDIENCE", "portfolio"),
        ])
        .unwrap();

        assert!(config.is_production());
        assert!(matches!(
            config.validate(),
            Err(ValidationError::AuthorityMustBeHttps)
        ));
    }

    #[test]
    fn production_requires_auth_section() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[("PORTFOLIO_BILLING__SERVER__ENVIRONMENT", "production")]).unwrap();

        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired("AUTH__ISSUER_URL"))
        ));
    }

    #[test]
    fn database_takes_precedence_over_in_memory_flag() {
        let mut config = AppConfig {
            database: Some(DatabaseConfig {
                url: "postgres://localhost/billing".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        config.server.in_memory_store = true;
        assert_eq!(config.store_backend(), Some(StoreBackend::Postgres));
    }

    #[test]
    fn invalid_database_section_fails_validation() {
        let config = AppConfig {
            database: Some(DatabaseConfig {
                url: "mysql://localhost/billing".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidDatabaseUrl)
        ));
    }
}
