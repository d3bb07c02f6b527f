//! HTTP handlers for payment and membership endpoints.
//!
//! These handlers connect Axum routes to application layer command/query
//! handlers. Authentication runs inside the application handlers so that the
//! configuration check always precedes it.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::application::handlers::membership::{
    GetMembershipHandler, GetMembershipQuery, HandlePaymentWebhookCommand,
    HandlePaymentWebhookHandler, VerifyPaymentCommand, VerifyPaymentHandler,
};
use crate::domain::membership::{VerificationError, WebhookError};

use super::dto::{
    ErrorResponse, MembershipDto, MembershipResponse, VerifyPaymentRequest, VerifyPaymentResponse,
    WebhookResponse,
};

/// Header carrying the provider's hex HMAC-SHA256 of the raw webhook body.
pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the billing routes.
///
/// Handlers are built once at startup and shared across requests.
#[derive(Clone)]
pub struct BillingAppState {
    pub verify_payment: Arc<VerifyPaymentHandler>,
    pub payment_webhook: Arc<HandlePaymentWebhookHandler>,
    pub get_membership: Arc<GetMembershipHandler>,
}

impl BillingAppState {
    pub fn new(
        verify_payment: VerifyPaymentHandler,
        payment_webhook: HandlePaymentWebhookHandler,
        get_membership: GetMembershipHandler,
    ) -> Self {
        Self {
            verify_payment: Arc::new(verify_payment),
            payment_webhook: Arc::new(payment_webhook),
            get_membership: Arc::new(get_membership),
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
///
/// Any other scheme, or a blank token, counts as no token.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

// ════════════════════════════════════════════════════════════════════════════════
// Client-verify
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments/verify - Verify a completed payment and activate membership
pub async fn verify_payment(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, PaymentsApiError> {
    let request = VerifyPaymentRequest::from_body(&body);
    let cmd = VerifyPaymentCommand {
        bearer_token: bearer_token(&headers),
        payment_id: request.payment_id,
        plan_type: request.plan_type,
    };

    let result = state.verify_payment.handle(cmd).await?;

    Ok(Json(VerifyPaymentResponse {
        success: true,
        message: result.message().to_string(),
        membership: result.membership().map(MembershipDto::from),
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Membership read
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/membership - Current subscription of the caller
pub async fn get_membership(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, PaymentsApiError> {
    let query = GetMembershipQuery {
        bearer_token: bearer_token(&headers),
    };

    let result = state.get_membership.handle(query).await?;

    Ok(Json(MembershipResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/razorpay - Provider payment webhook
///
/// The body is taken as raw bytes; the signature covers them exactly.
pub async fn handle_razorpay_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = HandlePaymentWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    state.payment_webhook.handle(cmd).await?;

    Ok(Json(WebhookResponse::ok()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// Converts client-path errors to `{success:false, error}` responses.
#[derive(Debug)]
pub struct PaymentsApiError(VerificationError);

impl From<VerificationError> for PaymentsApiError {
    fn from(err: VerificationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PaymentsApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Payment request failed");
        }

        let mut response = (status, Json(ErrorResponse::new(self.0.message()))).into_response();
        if let VerificationError::RateLimited { retry_after_secs } = self.0 {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

/// Converts webhook errors to `{ok:false, error}` responses.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let status: StatusCode = self.0.status_code();
        (status, Json(WebhookResponse::error(self.0.public_message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use secrecy::SecretString;
    use tower::ServiceExt;

    use crate::adapters::auth::MockSessionValidator;
    use crate::adapters::membership::InMemoryMembershipStore;
    use crate::adapters::payment::MockPaymentGateway;
    use crate::adapters::rate_limiter::InMemoryRateLimiter;
    use crate::domain::membership::fixtures::{captured_payment, test_catalog};
    use crate::domain::membership::{compute_test_signature, PlanType, WebhookSignatureVerifier};
    use crate::ports::{MembershipStore, RateLimitPolicy};

    use super::super::routes::billing_routes;

    const SECRET: &str = "whsec_test";

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    struct Harness {
        app: Router,
        store: Arc<InMemoryMembershipStore>,
        gateway: MockPaymentGateway,
    }

    fn harness(max_attempts: u32) -> Harness {
        let store = Arc::new(InMemoryMembershipStore::new());
        let gateway = MockPaymentGateway::new();
        let catalog = Arc::new(test_catalog());
        let validator = Arc::new(MockSessionValidator::new().with_test_user("token-a", "user-a"));

        let state = BillingAppState::new(
            VerifyPaymentHandler::new(
                Some(store.clone() as Arc<dyn MembershipStore>),
                Some(Arc::new(gateway.clone())),
                validator.clone(),
                Arc::new(InMemoryRateLimiter::new(RateLimitPolicy::new(max_attempts, 60))),
                catalog.clone(),
                "pay_",
            ),
            HandlePaymentWebhookHandler::new(
                Some(store.clone() as Arc<dyn MembershipStore>),
                Some(Arc::new(WebhookSignatureVerifier::new(SecretString::new(
                    SECRET.to_string(),
                )))),
                catalog,
            ),
            GetMembershipHandler::new(Some(store.clone() as Arc<dyn MembershipStore>), validator),
        );

        Harness {
            app: billing_routes().with_state(state),
            store,
            gateway,
        }
    }

    fn verify_request(token: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/payments/verify")
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Bearer token parsing
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn bearer_token_requires_bearer_scheme() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer abc"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), None);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Client-verify
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn verify_returns_membership() {
        let h = harness(5);
        h.gateway
            .set_payment(captured_payment("pay_1", "user-a", PlanType::Monthly));

        let response = h
            .app
            .oneshot(verify_request(
                Some("token-a"),
                r#"{"paymentId":"pay_1","planType":"monthly"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Payment verified. Membership activated");
        assert_eq!(json["membership"]["plan"], "premium_monthly");
        assert_eq!(json["membership"]["planType"], "monthly");
        assert_eq!(json["membership"]["status"], "active");
        assert!(json["membership"]["periodEnd"].is_string());
        assert_eq!(h.store.verification_count().await, 1);
    }

    #[tokio::test]
    async fn verify_without_token_is_401() {
        let h = harness(5);
        let response = h
            .app
            .oneshot(verify_request(None, r#"{"paymentId":"pay_1","planType":"monthly"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn malformed_body_is_400_after_auth() {
        let h = harness(5);
        let response = h
            .app
            .oneshot(verify_request(Some("token-a"), "not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(h.gateway.lookup_count(), 0);
    }

    #[tokio::test]
    async fn payment_id_with_path_characters_is_400() {
        let h = harness(5);
        let response = h
            .app
            .oneshot(verify_request(
                Some("token-a"),
                r#"{"paymentId":"pay_x/../../orders?count=100","planType":"monthly"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["success"], false);
        assert_eq!(h.gateway.lookup_count(), 0);
    }

    #[tokio::test]
    async fn rate_limited_response_carries_retry_after() {
        let h = harness(1);
        let body = r#"{"paymentId":"bad","planType":"monthly"}"#;

        let first = h
            .app
            .clone()
            .oneshot(verify_request(Some("token-a"), body))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::BAD_REQUEST);

        let second = h
            .app
            .oneshot(verify_request(Some("token-a"), body))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key(header::RETRY_AFTER));
        let json = json_body(second).await;
        assert_eq!(json["success"], false);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Webhook
    // ════════════════════════════════════════════════════════════════════════════

    fn webhook_request(body: &[u8], signature: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/webhooks/razorpay")
            .header("content-type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        builder.body(Body::from(body.to_vec())).unwrap()
    }

    fn captured_event(payment_id: &str, user: &str) -> Vec<u8> {
        let entity = serde_json::to_value(captured_payment(payment_id, user, PlanType::Yearly)).unwrap();
        serde_json::to_vec(&serde_json::json!({
            "event": "payment.captured",
            "payload": { "payment": { "entity": entity } }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn signed_webhook_is_acknowledged() {
        let h = harness(5);
        let body = captured_event("pay_w1", "user-b");
        let signature = compute_test_signature(SECRET, &body);

        let response = h
            .app
            .oneshot(webhook_request(&body, Some(&signature)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!({ "ok": true }));
        assert_eq!(h.store.verification_count().await, 1);
    }

    #[tokio::test]
    async fn unsigned_webhook_is_401() {
        let h = harness(5);
        let body = captured_event("pay_w1", "user-b");

        let response = h.app.oneshot(webhook_request(&body, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = json_body(response).await;
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "Missing signature");
        assert_eq!(h.store.verification_count().await, 0);
    }

    #[tokio::test]
    async fn ignored_event_is_still_ok() {
        let h = harness(5);
        let body = br#"{"event":"payment.failed","payload":{}}"#;
        let signature = compute_test_signature(SECRET, body);

        let response = h
            .app
            .oneshot(webhook_request(body, Some(&signature)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.store.verification_count().await, 0);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Membership read
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn membership_reflects_verified_payment() {
        let h = harness(5);
        h.gateway
            .set_payment(captured_payment("pay_1", "user-a", PlanType::Yearly));

        let verify = h
            .app
            .clone()
            .oneshot(verify_request(
                Some("token-a"),
                r#"{"paymentId":"pay_1","planType":"yearly"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(verify.status(), StatusCode::OK);

        let response = h
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/membership")
                    .header("authorization", "Bearer token-a")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["userId"], "user-a");
        assert_eq!(json["isActive"], true);
        assert_eq!(json["subscription"]["plan"], "premium_yearly");
        assert_eq!(json["subscription"]["lastPaymentId"], "pay_1");
    }
}
