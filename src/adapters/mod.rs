//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - Session token validation (OIDC, mock)
//! - `http` - Axum routes and response envelopes
//! - `membership` - In-memory membership store
//! - `payment` - Provider payment lookup (Razorpay, mock)
//! - `postgres` - PostgreSQL membership store and rate limiter
//! - `rate_limiter` - In-memory and Redis rate limiters

pub mod auth;
pub mod http;
pub mod membership;
pub mod payment;
pub mod postgres;
pub mod rate_limiter;
