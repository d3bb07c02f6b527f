//! Session validator used when no identity provider is configured.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};
use crate::ports::SessionValidator;

/// Rejects every token with `AuthError::InvalidToken`.
///
/// Installed by the binary outside production when the `auth` section is
/// absent, so authenticated endpoints answer 401 instead of trusting callers.
#[derive(Debug, Default, Clone, Copy)]
pub struct RejectAllSessionValidator;

impl RejectAllSessionValidator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SessionValidator for RejectAllSessionValidator {
    async fn validate(&self, _token: &str) -> Result<AuthenticatedUser, AuthError> {
        Err(AuthError::InvalidToken)
    }
}
