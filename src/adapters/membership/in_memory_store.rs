//! In-memory membership store.
//!
//! All four collections sit behind one lock, so a reconciliation is applied
//! as a single critical section. Used by tests and by local runs without a
//! database.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::foundation::{DomainError, PaymentId, UserId};
use crate::domain::membership::{
    PaymentVerificationRecord, PublicUserMarker, ReconcileOutcome, Reconciliation,
    SubscriptionState, TransactionRecord,
};
use crate::ports::MembershipStore;

#[derive(Debug, Default)]
struct StoreState {
    verifications: HashMap<PaymentId, PaymentVerificationRecord>,
    subscriptions: HashMap<UserId, SubscriptionState>,
    transactions: Vec<TransactionRecord>,
    markers: HashMap<UserId, PublicUserMarker>,
}

/// Membership store held entirely in process memory.
#[derive(Debug, Default)]
pub struct InMemoryMembershipStore {
    state: Mutex<StoreState>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All transaction records, in insertion order.
    pub async fn transactions(&self) -> Vec<TransactionRecord> {
        self.state.lock().await.transactions.clone()
    }

    /// Number of verification records.
    pub async fn verification_count(&self) -> usize {
        self.state.lock().await.verifications.len()
    }

    /// Seeds a subscription directly, bypassing reconciliation.
    pub async fn insert_subscription(&self, subscription: SubscriptionState) {
        let mut state = self.state.lock().await;
        state
            .markers
            .insert(subscription.user_id.clone(), PublicUserMarker::from(&subscription));
        state.subscriptions.insert(subscription.user_id.clone(), subscription);
    }
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn find_verification(
        &self,
        payment_id: &PaymentId,
    ) -> Result<Option<PaymentVerificationRecord>, DomainError> {
        Ok(self.state.lock().await.verifications.get(payment_id).cloned())
    }

    async fn reconcile(&self, reconciliation: &Reconciliation) -> Result<ReconcileOutcome, DomainError> {
        let mut state = self.state.lock().await;

        if let Some(existing) = state.verifications.get(reconciliation.payment_id()) {
            return Ok(ReconcileOutcome::AlreadyReconciled(existing.clone()));
        }

        let user_id = reconciliation.user_id().clone();
        let subscription = reconciliation
            .subscription
            .clone()
            .merged_over(state.subscriptions.get(&user_id));

        state.verifications.insert(
            reconciliation.payment_id().clone(),
            reconciliation.verification.clone(),
        );
        state.subscriptions.insert(user_id.clone(), subscription);
        state.transactions.push(reconciliation.transaction.clone());
        state.markers.insert(user_id, reconciliation.marker.clone());

        Ok(ReconcileOutcome::Applied)
    }

    async fn find_subscription(&self, user_id: &UserId) -> Result<Option<SubscriptionState>, DomainError> {
        Ok(self.state.lock().await.subscriptions.get(user_id).cloned())
    }

    async fn find_public_marker(&self, user_id: &UserId) -> Result<Option<PublicUserMarker>, DomainError> {
        Ok(self.state.lock().await.markers.get(user_id).cloned())
    }
}
