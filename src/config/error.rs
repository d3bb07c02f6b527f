//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address")]
    InvalidBindAddress,

    #[error("Invalid timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Auth issuer and JWKS URLs must use HTTPS in production")]
    AuthorityMustBeHttps,

    #[error("Currency must be a three-letter ISO code")]
    InvalidCurrency,

    #[error("Plan prices must be positive")]
    InvalidPlanPrice,

    #[error("Payment provider URL must be http(s)")]
    InvalidProviderUrl,

    #[error("The in-memory membership store cannot be used in production")]
    InMemoryStoreInProduction,

    #[error("Invalid rate limit: {0}")]
    InvalidRateLimit(&'static str),
}
