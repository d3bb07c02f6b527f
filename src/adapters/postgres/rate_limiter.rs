//! PostgreSQL-backed rate limiter.
//!
//! Used when a database is configured but Redis is not. Each attempt is a
//! single upsert on `rate_limit_buckets`, which increments and returns the
//! window's count atomically.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::Timestamp;
use crate::ports::{RateLimitError, RateLimitKey, RateLimitPolicy, RateLimitResult, RateLimiter};

/// Fixed-window rate limiter stored in PostgreSQL.
pub struct PostgresRateLimiter {
    pool: PgPool,
    policy: RateLimitPolicy,
}

impl PostgresRateLimiter {
    pub fn new(pool: PgPool, policy: RateLimitPolicy) -> Self {
        Self { pool, policy }
    }
}

#[async_trait]
impl RateLimiter for PostgresRateLimiter {
    async fn check(&self, key: &RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        let now = Timestamp::now();
        let window_index = self.policy.window_index(now);
        let window_start = self.policy.window_start(window_index);

        let (attempts,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO rate_limit_buckets (resource, identifier, window_start, attempts, updated_at)
            VALUES ($1, $2, $3, 1, now())
            ON CONFLICT (resource, identifier, window_start)
            DO UPDATE SET attempts = rate_limit_buckets.attempts + 1, updated_at = now()
            RETURNING attempts
            "#,
        )
        .bind(&key.resource)
        .bind(&key.identifier)
        .bind(window_start.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RateLimitError::Unavailable(e.to_string()))?;

        let count = u64::try_from(attempts).unwrap_or(0);
        Ok(self.policy.evaluate(count, window_index, now))
    }
}

impl std::fmt::Debug for PostgresRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresRateLimiter")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
