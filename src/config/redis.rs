//! Redis configuration
//!
//! When present, Redis backs the rate limiter so attempt counters are shared
//! across instances.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl RedisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Opens a multiplexed connection, bounded by the configured timeout.
    pub async fn connect(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        let client = redis::Client::open(self.url.as_str())?;
        match tokio::time::timeout(self.timeout(), client.get_multiplexed_tokio_connection()).await {
            Ok(connection) => connection,
            Err(_) => Err(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "timed out connecting to redis",
            ))),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("REDIS__URL"));
        }
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(ValidationError::InvalidRedisUrl);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RedisConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn validates_url_scheme() {
        let config = RedisConfig {
            url: "redis://localhost:6379".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = RedisConfig {
            url: "rediss://cache.example.com:6380".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = RedisConfig {
            url: "http://localhost:6379".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidRedisUrl)));
    }

    #[test]
    fn rejects_missing_url_and_zero_timeout() {
        assert!(matches!(
            RedisConfig::default().validate(),
            Err(ValidationError::MissingRequired(_))
        ));

        let config = RedisConfig {
            url: "redis://localhost:6379".to_string(),
            timeout_secs: 0,
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidTimeout)));
    }
}
