//! Rate limit configuration for payment verification attempts

use serde::Deserialize;

use crate::ports::RateLimitPolicy;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Verification attempts allowed per user per window
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u32,
}

impl RateLimitConfig {
    pub fn policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(self.max_attempts, self.window_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidRateLimit("max_attempts must be positive"));
        }
        if self.window_secs == 0 || self.window_secs > 86_400 {
            return Err(ValidationError::InvalidRateLimit(
                "window_secs must be between 1 and 86400",
            ));
        }
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            window_secs: default_window_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_window_secs() -> u32 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_five_per_minute() {
        let policy = RateLimitConfig::default().policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.window_secs, 60);
    }

    #[test]
    fn rejects_zero_values() {
        let config = RateLimitConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RateLimitConfig {
            window_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
