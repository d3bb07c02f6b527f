//! In-memory rate limiter implementation for testing and development.
//!
//! Uses a fixed-window counter held in a HashMap.
//! Not suitable for production multi-server deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::ports::{RateLimitError, RateLimitKey, RateLimitPolicy, RateLimitResult, RateLimiter};

/// In-memory rate limiter for testing and single-server deployments.
#[derive(Debug, Clone)]
pub struct InMemoryRateLimiter {
    policy: RateLimitPolicy,
    /// Counters keyed by `(key, window_index)`.
    windows: Arc<RwLock<HashMap<(RateLimitKey, i64), u64>>>,
}

impl InMemoryRateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Counts an attempt as if it happened at `now`.
    pub async fn check_at(&self, key: &RateLimitKey, now: Timestamp) -> RateLimitResult {
        let window_index = self.policy.window_index(now);
        let mut windows = self.windows.write().await;

        // Drop counters from earlier windows.
        windows.retain(|(_, index), _| *index >= window_index);

        let count = windows.entry((key.clone(), window_index)).or_insert(0);
        *count += 1;

        self.policy.evaluate(*count, window_index, now)
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: &RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        Ok(self.check_at(key, Timestamp::now()).await)
    }
}
