//! Axum router configuration for billing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{get_membership, handle_razorpay_webhook, verify_payment, BillingAppState};

/// Create the billing API router.
///
/// # Routes
///
/// ## User Endpoints (bearer token)
/// - `POST /api/payments/verify` - Verify a completed payment
/// - `GET /api/membership` - Current subscription of the caller
///
/// ## Webhook Endpoints (no auth, signature verified)
/// - `POST /api/webhooks/razorpay` - Provider payment events
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/api/payments/verify", post(verify_payment))
        .route("/api/membership", get(get_membership))
        .route("/api/webhooks/razorpay", post(handle_razorpay_webhook))
}
