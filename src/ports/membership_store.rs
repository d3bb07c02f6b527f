//! Membership store port.
//!
//! The store owns every membership record. The one write it exposes,
//! [`MembershipStore::reconcile`], applies a whole [`Reconciliation`]
//! atomically and is the only place payment idempotency is enforced.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PaymentId, UserId};
use crate::domain::membership::{
    PaymentVerificationRecord, PublicUserMarker, ReconcileOutcome, Reconciliation,
    SubscriptionState,
};

/// Transactional store for verification, subscription, transaction and marker records.
///
/// # Contract
///
/// `reconcile` must, in one atomic unit:
/// 1. create the verification record with a create-only write
/// 2. merge-upsert the subscription (keeping its original `created_at`)
/// 3. insert the transaction record
/// 4. upsert the public marker
///
/// If a verification record for the payment already exists, nothing is
/// written and the existing record is returned. Concurrent calls for the
/// same payment must serialize so exactly one observes `Applied`.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Find the verification record for a payment, if one exists.
    async fn find_verification(
        &self,
        payment_id: &PaymentId,
    ) -> Result<Option<PaymentVerificationRecord>, DomainError>;

    /// Apply all writes for a payment, or report that it was already reconciled.
    async fn reconcile(&self, reconciliation: &Reconciliation) -> Result<ReconcileOutcome, DomainError>;

    /// Current subscription of a user.
    async fn find_subscription(&self, user_id: &UserId) -> Result<Option<SubscriptionState>, DomainError>;

    /// Public premium marker of a user.
    async fn find_public_marker(&self, user_id: &UserId) -> Result<Option<PublicUserMarker>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_store_trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn MembershipStore>();
    }
}
