//! GetMembershipHandler - Query handler for the caller's current membership.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::membership::{SubscriptionState, VerificationError};
use crate::ports::{MembershipStore, SessionValidator};

use super::authenticate::authenticate;

/// Query for the authenticated caller's membership.
#[derive(Debug, Clone, Default)]
pub struct GetMembershipQuery {
    pub bearer_token: Option<String>,
}

/// Result of a membership lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetMembershipResult {
    pub user_id: UserId,
    pub subscription: Option<SubscriptionState>,
    /// True when a subscription exists and its period has not ended.
    pub is_active: bool,
}

/// Handler for reading the caller's membership.
pub struct GetMembershipHandler {
    store: Option<Arc<dyn MembershipStore>>,
    session_validator: Arc<dyn SessionValidator>,
}

impl GetMembershipHandler {
    pub fn new(
        store: Option<Arc<dyn MembershipStore>>,
        session_validator: Arc<dyn SessionValidator>,
    ) -> Self {
        Self {
            store,
            session_validator,
        }
    }

    pub async fn handle(&self, query: GetMembershipQuery) -> Result<GetMembershipResult, VerificationError> {
        let store = self
            .store
            .as_ref()
            .ok_or(VerificationError::Configuration("membership store"))?;

        let user = authenticate(self.session_validator.as_ref(), query.bearer_token.as_deref()).await?;

        let subscription = store.find_subscription(&user.id).await.map_err(|e| {
            tracing::error!(user_id = %user.id, error = %e, "Failed to load subscription");
            VerificationError::infrastructure(e.to_string())
        })?;

        let now = Timestamp::now();
        let is_active = subscription
            .as_ref()
            .map(|s| s.period_end > now)
            .unwrap_or(false);

        Ok(GetMembershipResult {
            user_id: user.id,
            subscription,
            is_active,
        })
    }
}
