//! Redis-backed rate limiter implementation for production deployments.
//!
//! Uses a fixed-window counter with Redis INCR + EXPIRE.
//! Suitable for multi-server deployments.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::Timestamp;
use crate::ports::{RateLimitError, RateLimitKey, RateLimitPolicy, RateLimitResult, RateLimiter};

/// Redis-backed rate limiter for production multi-server deployments.
///
/// Uses a fixed-window counter algorithm:
/// 1. INCR the window's key to count the attempt
/// 2. If count is 1, set EXPIRE so stale windows clean themselves up
/// 3. Hand the post-increment count to the policy
///
/// The window index is part of the key, so a missed EXPIRE can never extend
/// a window.
#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: MultiplexedConnection,
    policy: RateLimitPolicy,
}

impl RedisRateLimiter {
    /// Create a new Redis rate limiter.
    pub fn new(conn: MultiplexedConnection, policy: RateLimitPolicy) -> Self {
        Self { conn, policy }
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: &RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        let now = Timestamp::now();
        let window_index = self.policy.window_index(now);
        let redis_key = key.to_redis_key(window_index);

        let mut conn = self.conn.clone();

        let count: i64 = conn
            .incr(&redis_key, 1_i64)
            .await
            .map_err(|e: redis::RedisError| RateLimitError::Unavailable(e.to_string()))?;

        if count == 1 {
            conn.expire::<_, ()>(&redis_key, i64::from(self.policy.window_secs))
                .await
                .map_err(|e: redis::RedisError| RateLimitError::Unavailable(e.to_string()))?;
        }

        let count = u64::try_from(count).unwrap_or(0);
        Ok(self.policy.evaluate(count, window_index, now))
    }
}

impl std::fmt::Debug for RedisRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRateLimiter")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
