//! Rate limiting port for guarding payment verification against enumeration.
//!
//! Limits are fixed-window counters keyed by `(resource, identifier, window)`
//! where the window index is `floor(now_millis / window_millis)`. Every
//! implementation increments the counter and compares it to the ceiling in a
//! single atomic step, so concurrent attempts cannot all observe a stale
//! count. A rejected attempt therefore still consumes a slot.

use async_trait::async_trait;

use crate::domain::foundation::{Timestamp, UserId};

/// Port for rate limiting operations.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one attempt against the key's current window and decide on it.
    async fn check(&self, key: &RateLimitKey) -> Result<RateLimitResult, RateLimitError>;
}

/// Resource name for client payment verification attempts.
pub const PAYMENT_VERIFY_RESOURCE: &str = "payment_verify";

/// Key identifying what to rate limit.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct RateLimitKey {
    /// What is being limited, e.g. `payment_verify`.
    pub resource: String,
    /// Who is being limited, e.g. a user ID.
    pub identifier: String,
}

impl RateLimitKey {
    /// Key for a user's attempts against a resource.
    pub fn user_resource(user_id: &UserId, resource: &str) -> Self {
        Self {
            resource: resource.to_string(),
            identifier: user_id.to_string(),
        }
    }

    /// Key for a user's payment verification attempts.
    pub fn payment_verify(user_id: &UserId) -> Self {
        Self::user_resource(user_id, PAYMENT_VERIFY_RESOURCE)
    }

    /// Returns the Redis key string for this key in the given window.
    pub fn to_redis_key(&self, window_index: i64) -> String {
        format!("ratelimit:{}:{}:{}", self.resource, self.identifier, window_index)
    }
}

/// Ceiling and window size shared by every limiter backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Attempts allowed per window.
    pub max_attempts: u32,
    /// Window length in seconds.
    pub window_secs: u32,
}

impl RateLimitPolicy {
    pub fn new(max_attempts: u32, window_secs: u32) -> Self {
        Self {
            max_attempts,
            window_secs: window_secs.max(1),
        }
    }

    fn window_millis(&self) -> i64 {
        i64::from(self.window_secs) * 1000
    }

    /// Index of the fixed window containing `now`.
    pub fn window_index(&self, now: Timestamp) -> i64 {
        now.as_unix_millis().div_euclid(self.window_millis())
    }

    /// Start of the window with the given index.
    pub fn window_start(&self, window_index: i64) -> Timestamp {
        let millis = window_index * self.window_millis();
        Timestamp::from_unix_secs(millis.div_euclid(1000)).unwrap_or_default()
    }

    /// When the window with the given index ends.
    pub fn window_reset_at(&self, window_index: i64) -> Timestamp {
        self.window_start(window_index).plus_secs(i64::from(self.window_secs))
    }

    /// Decides on an attempt given the window's count *after* incrementing.
    pub fn evaluate(&self, count_after_increment: u64, window_index: i64, now: Timestamp) -> RateLimitResult {
        let reset_at = self.window_reset_at(window_index);

        if count_after_increment > u64::from(self.max_attempts) {
            let retry_after = (reset_at.as_unix_secs() - now.as_unix_secs()).max(1);
            let retry_after_secs = u32::try_from(retry_after).unwrap_or(self.window_secs);
            return RateLimitResult::Denied(RateLimitDenied {
                limit: self.max_attempts,
                retry_after_secs,
                message: format!(
                    "Rate limit exceeded. Retry after {} seconds.",
                    retry_after_secs
                ),
            });
        }

        let used = u32::try_from(count_after_increment).unwrap_or(u32::MAX);
        RateLimitResult::Allowed(RateLimitStatus {
            limit: self.max_attempts,
            remaining: self.max_attempts.saturating_sub(used),
            reset_at,
            window_secs: self.window_secs,
        })
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request is allowed; includes current status.
    Allowed(RateLimitStatus),
    /// Request is denied; includes denial details.
    Denied(RateLimitDenied),
}

impl RateLimitResult {
    /// Returns true if the request was allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed(_))
    }

    /// Returns true if the request was denied.
    pub fn is_denied(&self) -> bool {
        matches!(self, RateLimitResult::Denied(_))
    }
}

/// Current rate limit status.
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    /// Maximum requests allowed in the window.
    pub limit: u32,
    /// Remaining requests in the current window.
    pub remaining: u32,
    /// When the current window resets.
    pub reset_at: Timestamp,
    /// Window duration in seconds.
    pub window_secs: u32,
}

/// Details of a rate limit denial.
#[derive(Debug, Clone)]
pub struct RateLimitDenied {
    /// Maximum requests allowed in the window.
    pub limit: u32,
    /// Seconds until the client should retry.
    pub retry_after_secs: u32,
    /// Human-readable message explaining the denial.
    pub message: String,
}

/// Errors that can occur during rate limiting operations.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Rate limiter backend is unavailable.
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),
}
