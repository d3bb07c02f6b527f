//! Ports - interfaces the application layer depends on.
//!
//! Adapters implement these traits; handlers hold them as `Arc<dyn Trait>`.

mod membership_store;
mod payment_gateway;
mod rate_limiter;
mod session_validator;

pub use membership_store::MembershipStore;
pub use payment_gateway::{PaymentError, PaymentErrorCode, PaymentGateway};
pub use rate_limiter::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitPolicy, RateLimitResult,
    RateLimitStatus, RateLimiter, PAYMENT_VERIFY_RESOURCE,
};
pub use session_validator::SessionValidator;
