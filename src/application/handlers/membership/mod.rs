//! Membership handlers.
//!
//! ## Commands
//! - Verifying a client-submitted payment
//! - Processing provider payment webhooks
//!
//! ## Queries
//! - Get the caller's membership

mod authenticate;
mod get_membership;
mod handle_payment_webhook;
mod verify_payment;

// Commands
pub use handle_payment_webhook::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, HandlePaymentWebhookResult,
};
pub use verify_payment::{
    MembershipSummary, VerifyPaymentCommand, VerifyPaymentHandler, VerifyPaymentResult,
};

// Queries
pub use get_membership::{GetMembershipHandler, GetMembershipQuery, GetMembershipResult};
