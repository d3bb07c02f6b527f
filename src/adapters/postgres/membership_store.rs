//! PostgreSQL implementation of MembershipStore.
//!
//! Reconciliation runs in one transaction. The verification insert uses
//! `ON CONFLICT (payment_id) DO NOTHING`, so the primary key on
//! `payment_verifications` is what serializes concurrent reconciles of the
//! same payment: the loser inserts nothing, reads the winner's row, and
//! rolls back without touching the other tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::foundation::{DomainError, ErrorCode, PaymentId, Timestamp, UserId};
use crate::domain::membership::{
    PaymentVerificationRecord, PublicUserMarker, ReconcileOutcome, Reconciliation,
    SubscriptionState,
};
use crate::ports::MembershipStore;

/// PostgreSQL implementation of the MembershipStore port.
pub struct PostgresMembershipStore {
    pool: PgPool,
}

impl PostgresMembershipStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Row types
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, sqlx::FromRow)]
struct VerificationRow {
    payment_id: String,
    user_id: String,
    plan_type: String,
    provider: String,
    source: String,
    verified_at: DateTime<Utc>,
}

impl TryFrom<VerificationRow> for PaymentVerificationRecord {
    type Error = DomainError;

    fn try_from(row: VerificationRow) -> Result<Self, Self::Error> {
        Ok(PaymentVerificationRecord {
            payment_id: PaymentId::new(row.payment_id).map_err(corrupt_row)?,
            user_id: UserId::new(row.user_id).map_err(corrupt_row)?,
            plan_type: row.plan_type.parse().map_err(corrupt_row)?,
            provider: row.provider,
            source: row.source.parse().map_err(corrupt_row)?,
            verified_at: Timestamp::from_datetime(row.verified_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    user_id: String,
    plan: String,
    plan_type: String,
    status: String,
    provider: String,
    last_payment_id: String,
    amount_minor: i64,
    currency: String,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for SubscriptionState {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(SubscriptionState {
            user_id: UserId::new(row.user_id).map_err(corrupt_row)?,
            plan: row.plan,
            plan_type: row.plan_type.parse().map_err(corrupt_row)?,
            status: row.status.parse().map_err(corrupt_row)?,
            provider: row.provider,
            last_payment_id: PaymentId::new(row.last_payment_id).map_err(corrupt_row)?,
            amount_minor: row.amount_minor,
            currency: row.currency,
            period_start: Timestamp::from_datetime(row.period_start),
            period_end: Timestamp::from_datetime(row.period_end),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MarkerRow {
    user_id: String,
    is_premium: bool,
    plan: String,
    status: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MarkerRow> for PublicUserMarker {
    type Error = DomainError;

    fn try_from(row: MarkerRow) -> Result<Self, Self::Error> {
        Ok(PublicUserMarker {
            user_id: UserId::new(row.user_id).map_err(corrupt_row)?,
            is_premium: row.is_premium,
            plan: row.plan,
            status: row.status.parse().map_err(corrupt_row)?,
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn corrupt_row(e: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::CorruptData, format!("Invalid stored value: {}", e))
}

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::database(format!("{}: {}", context, e))
}

// ════════════════════════════════════════════════════════════════════════════════
// Transaction steps
// ════════════════════════════════════════════════════════════════════════════════

/// Create-only insert of the verification record. Returns false if it already existed.
async fn insert_verification(
    tx: &mut Transaction<'_, Postgres>,
    record: &PaymentVerificationRecord,
) -> Result<bool, DomainError> {
    let inserted: Option<(String,)> = sqlx::query_as(
        r#"
        INSERT INTO payment_verifications (
            payment_id, user_id, plan_type, provider, source, verified_at
        ) VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (payment_id) DO NOTHING
        RETURNING payment_id
        "#,
    )
    .bind(record.payment_id.as_str())
    .bind(record.user_id.as_str())
    .bind(record.plan_type.as_str())
    .bind(&record.provider)
    .bind(record.source.as_str())
    .bind(record.verified_at.as_datetime())
    .fetch_optional(&mut **tx)
    .await
    .map_err(db_error("Failed to insert payment verification"))?;

    Ok(inserted.is_some())
}

/// Upsert that replaces every column except `created_at`.
async fn upsert_subscription(
    tx: &mut Transaction<'_, Postgres>,
    sub: &SubscriptionState,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO subscriptions (
            user_id, plan, plan_type, status, provider, last_payment_id,
            amount_minor, currency, period_start, period_end, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (user_id) DO UPDATE SET
            plan = EXCLUDED.plan,
            plan_type = EXCLUDED.plan_type,
            status = EXCLUDED.status,
            provider = EXCLUDED.provider,
            last_payment_id = EXCLUDED.last_payment_id,
            amount_minor = EXCLUDED.amount_minor,
            currency = EXCLUDED.currency,
            period_start = EXCLUDED.period_start,
            period_end = EXCLUDED.period_end,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(sub.user_id.as_str())
    .bind(&sub.plan)
    .bind(sub.plan_type.as_str())
    .bind(sub.status.as_str())
    .bind(&sub.provider)
    .bind(sub.last_payment_id.as_str())
    .bind(sub.amount_minor)
    .bind(&sub.currency)
    .bind(sub.period_start.as_datetime())
    .bind(sub.period_end.as_datetime())
    .bind(sub.created_at.as_datetime())
    .bind(sub.updated_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(db_error("Failed to upsert subscription"))?;

    Ok(())
}

async fn insert_transaction(
    tx: &mut Transaction<'_, Postgres>,
    reconciliation: &Reconciliation,
) -> Result<(), DomainError> {
    let txn = &reconciliation.transaction;

    sqlx::query(
        r#"
        INSERT INTO payment_transactions (
            payment_id, user_id, plan_type, amount_minor, currency, method, email,
            contact, provider_status, captured, source, provider_created_at, recorded_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(txn.payment_id.as_str())
    .bind(txn.user_id.as_str())
    .bind(txn.plan_type.as_str())
    .bind(txn.amount_minor)
    .bind(&txn.currency)
    .bind(&txn.method)
    .bind(&txn.email)
    .bind(&txn.contact)
    .bind(&txn.provider_status)
    .bind(txn.captured)
    .bind(txn.source.as_str())
    .bind(txn.provider_created_at.map(|t| *t.as_datetime()))
    .bind(txn.recorded_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.constraint() == Some("payment_transactions_pkey") {
                return DomainError::database("Transaction already recorded for payment")
                    .with_detail("payment_id", txn.payment_id.as_str());
            }
        }
        DomainError::database(format!("Failed to insert transaction: {}", e))
    })?;

    Ok(())
}

async fn upsert_marker(
    tx: &mut Transaction<'_, Postgres>,
    marker: &PublicUserMarker,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO public_user_markers (user_id, is_premium, plan, status, updated_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id) DO UPDATE SET
            is_premium = EXCLUDED.is_premium,
            plan = EXCLUDED.plan,
            status = EXCLUDED.status,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(marker.user_id.as_str())
    .bind(marker.is_premium)
    .bind(&marker.plan)
    .bind(marker.status.as_str())
    .bind(marker.updated_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(db_error("Failed to upsert public marker"))?;

    Ok(())
}

const SELECT_VERIFICATION: &str = r#"
    SELECT payment_id, user_id, plan_type, provider, source, verified_at
    FROM payment_verifications
    WHERE payment_id = $1
"#;

#[async_trait]
impl MembershipStore for PostgresMembershipStore {
    async fn find_verification(
        &self,
        payment_id: &PaymentId,
    ) -> Result<Option<PaymentVerificationRecord>, DomainError> {
        let row: Option<VerificationRow> = sqlx::query_as(SELECT_VERIFICATION)
            .bind(payment_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find payment verification"))?;

        row.map(PaymentVerificationRecord::try_from).transpose()
    }

    async fn reconcile(&self, reconciliation: &Reconciliation) -> Result<ReconcileOutcome, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        if !insert_verification(&mut tx, &reconciliation.verification).await? {
            let row: VerificationRow = sqlx::query_as(SELECT_VERIFICATION)
                .bind(reconciliation.payment_id().as_str())
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error("Failed to read existing verification"))?;

            tx.rollback()
                .await
                .map_err(db_error("Failed to roll back transaction"))?;

            tracing::debug!(
                payment_id = %reconciliation.payment_id(),
                "Payment already reconciled"
            );
            return Ok(ReconcileOutcome::AlreadyReconciled(row.try_into()?));
        }

        upsert_subscription(&mut tx, &reconciliation.subscription).await?;
        insert_transaction(&mut tx, reconciliation).await?;
        upsert_marker(&mut tx, &reconciliation.marker).await?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit reconciliation"))?;

        Ok(ReconcileOutcome::Applied)
    }

    async fn find_subscription(&self, user_id: &UserId) -> Result<Option<SubscriptionState>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT user_id, plan, plan_type, status, provider, last_payment_id,
                   amount_minor, currency, period_start, period_end, created_at, updated_at
            FROM subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find subscription"))?;

        row.map(SubscriptionState::try_from).transpose()
    }

    async fn find_public_marker(&self, user_id: &UserId) -> Result<Option<PublicUserMarker>, DomainError> {
        let row: Option<MarkerRow> = sqlx::query_as(
            r#"
            SELECT user_id, is_premium, plan, status, updated_at
            FROM public_user_markers
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find public marker"))?;

        row.map(PublicUserMarker::try_from).transpose()
    }
}
