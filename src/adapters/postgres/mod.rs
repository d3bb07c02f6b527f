//! PostgreSQL adapters - Database implementations for store ports.
//!
//! - `PostgresMembershipStore` - Transactional payment reconciliation
//! - `PostgresRateLimiter` - Fixed-window counters in a bucket table

mod membership_store;
mod rate_limiter;

pub use membership_store::PostgresMembershipStore;
pub use rate_limiter::PostgresRateLimiter;
