//! HTTP adapters - REST API implementations.

pub mod membership;

use std::time::Duration;

use axum::http::{HeaderValue, Method};
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use membership::{billing_routes, BillingAppState};

/// Cross-cutting HTTP settings applied around every route.
#[derive(Debug, Clone, Default)]
pub struct HttpOptions {
    /// Allowed browser origins; empty disables CORS headers.
    pub cors_origins: Vec<String>,
    /// Per-request timeout.
    pub request_timeout: Option<Duration>,
}

/// Builds the complete application router.
pub fn app_router(state: BillingAppState, options: &HttpOptions) -> Router {
    let mut router = billing_routes()
        .with_state(state)
        .route("/health", get(health));

    let origins: Vec<HeaderValue> = options
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if !origins.is_empty() {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                ]),
        );
    }

    if let Some(timeout) = options.request_timeout {
        router = router.layer(TimeoutLayer::new(timeout));
    }

    router.layer(TraceLayer::new_for_http())
}

/// GET /health - Liveness probe
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
