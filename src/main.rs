//! portfolio-billing HTTP server.
//!
//! Wires configuration to adapters and serves the billing routes.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use sqlx::migrate::Migrator;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use portfolio_billing::adapters::auth::{
    OidcConfig, OidcSessionValidator, RejectAllSessionValidator,
};
use portfolio_billing::adapters::http::{app_router, BillingAppState, HttpOptions};
use portfolio_billing::adapters::membership::InMemoryMembershipStore;
use portfolio_billing::adapters::payment::RazorpayGateway;
use portfolio_billing::adapters::postgres::{PostgresMembershipStore, PostgresRateLimiter};
use portfolio_billing::adapters::rate_limiter::{InMemoryRateLimiter, RedisRateLimiter};
use portfolio_billing::application::{
    GetMembershipHandler, HandlePaymentWebhookHandler, VerifyPaymentHandler,
};
use portfolio_billing::config::{AppConfig, AuthConfig, StoreBackend};
use portfolio_billing::ports::{MembershipStore, PaymentGateway, RateLimiter, SessionValidator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config);
    config.validate().context("validating configuration")?;

    let pool = match &config.database {
        Some(database) => {
            let pool = database.connect().await.context("connecting to PostgreSQL")?;
            if database.run_migrations {
                Migrator::new(Path::new(&database.migrations_dir))
                    .await
                    .context("loading migrations")?
                    .run(&pool)
                    .await
                    .context("running migrations")?;
                tracing::info!("Database migrations applied");
            }
            Some(pool)
        }
        None => None,
    };

    let store = build_membership_store(&config, pool.as_ref());

    let rate_limiter = build_rate_limiter(&config, pool.as_ref()).await?;
    let session_validator = build_session_validator(config.auth.as_ref())?;

    let gateway: Option<Arc<dyn PaymentGateway>> = match config.payment.razorpay_config() {
        Some(razorpay) => Some(Arc::new(
            RazorpayGateway::new(razorpay).context("building payment gateway")?,
        )),
        None => {
            tracing::warn!("Payment provider credentials missing, payment verification disabled");
            None
        }
    };

    let verifier = config.payment.webhook_verifier().map(Arc::new);
    if verifier.is_none() {
        tracing::warn!("Webhook secret missing, webhook endpoint disabled");
    }

    let catalog = Arc::new(config.payment.catalog());
    let state = BillingAppState::new(
        VerifyPaymentHandler::new(
            store.clone(),
            gateway,
            session_validator.clone(),
            rate_limiter,
            catalog.clone(),
            config.payment.payment_id_prefix.clone(),
        ),
        HandlePaymentWebhookHandler::new(store.clone(), verifier, catalog),
        GetMembershipHandler::new(store, session_validator),
    );

    let options = HttpOptions {
        cors_origins: config.server.cors_origins_list(),
        request_timeout: Some(config.server.request_timeout()),
    };
    let app = app_router(state, &options);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!(%addr, environment = ?config.server.environment, "portfolio-billing listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    Ok(())
}

/// JSON logs in production, human-readable otherwise.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_membership_store(
    config: &AppConfig,
    pool: Option<&PgPool>,
) -> Option<Arc<dyn MembershipStore>> {
    match (config.store_backend(), pool) {
        (Some(StoreBackend::Postgres), Some(pool)) => {
            Some(Arc::new(PostgresMembershipStore::new(pool.clone())))
        }
        (Some(StoreBackend::InMemory), _) => {
            tracing::warn!("Using in-memory membership store, memberships are lost on restart");
            Some(Arc::new(InMemoryMembershipStore::new()))
        }
        _ => {
            tracing::error!("No database configured, payment endpoints will report a configuration error");
            None
        }
    }
}

/// Redis when configured, then PostgreSQL, then a process-local counter.
async fn build_rate_limiter(
    config: &AppConfig,
    pool: Option<&PgPool>,
) -> anyhow::Result<Arc<dyn RateLimiter>> {
    let policy = config.rate_limit.policy();

    if let Some(redis) = &config.redis {
        let connection = redis.connect().await.context("connecting to Redis")?;
        tracing::info!("Using Redis rate limiter");
        return Ok(Arc::new(RedisRateLimiter::new(connection, policy)));
    }

    if let Some(pool) = pool {
        tracing::info!("Using PostgreSQL rate limiter");
        return Ok(Arc::new(PostgresRateLimiter::new(pool.clone(), policy)));
    }

    tracing::warn!("No shared backend configured, rate limits are per-process");
    Ok(Arc::new(InMemoryRateLimiter::new(policy)))
}

fn build_session_validator(auth: Option<&AuthConfig>) -> anyhow::Result<Arc<dyn SessionValidator>> {
    match auth {
        Some(auth) => {
            let mut oidc = OidcConfig::new(auth.issuer_url.clone(), auth.audience.clone())
                .with_cache_duration(auth.jwks_cache_ttl());
            if let Some(jwks_url) = &auth.jwks_url {
                oidc = oidc.with_jwks_url(jwks_url.clone());
            }
            let validator = OidcSessionValidator::new(oidc).context("building OIDC validator")?;
            Ok(Arc::new(validator))
        }
        None => {
            tracing::warn!("No auth issuer configured, all bearer tokens will be rejected");
            Ok(Arc::new(RejectAllSessionValidator::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
