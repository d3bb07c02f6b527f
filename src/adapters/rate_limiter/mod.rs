//! Rate limiter adapters.
//!
//! Implementations of the RateLimiter port for different backends.
//!
//! ## Available Adapters
//!
//! - `InMemoryRateLimiter` - In-memory for testing and single-server
//! - `RedisRateLimiter` - Redis-backed for production multi-server
//!
//! A PostgreSQL-backed limiter lives in `adapters::postgres`.
//!
//! ## Usage
//!
//! ```ignore
//! use portfolio_billing::adapters::rate_limiter::InMemoryRateLimiter;
//! use portfolio_billing::ports::RateLimitPolicy;
//!
//! // For testing
//! let limiter = InMemoryRateLimiter::new(RateLimitPolicy::new(5, 60));
//!
//! // For production
//! let limiter = RedisRateLimiter::new(redis_conn, RateLimitPolicy::new(5, 60));
//! ```

mod in_memory;
mod redis;

pub use in_memory::InMemoryRateLimiter;
pub use self::redis::RedisRateLimiter;
