//! HTTP adapter for payment verification and membership endpoints.
//!
//! - `POST /api/payments/verify` - Client-submitted payment verification
//! - `POST /api/webhooks/razorpay` - Provider webhook
//! - `GET /api/membership` - Caller's current subscription

pub mod dto;
mod handlers;
mod routes;

pub use handlers::{bearer_token, BillingAppState, PaymentsApiError, WebhookApiError, SIGNATURE_HEADER};
pub use routes::billing_routes;
