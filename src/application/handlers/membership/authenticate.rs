//! Bearer-token authentication shared by the membership handlers.

use crate::domain::foundation::{AuthError, AuthenticatedUser};
use crate::domain::membership::VerificationError;
use crate::ports::SessionValidator;

/// Resolves the caller from an optional bearer token.
pub(super) async fn authenticate(
    validator: &dyn SessionValidator,
    bearer_token: Option<&str>,
) -> Result<AuthenticatedUser, VerificationError> {
    let token = bearer_token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(VerificationError::Unauthenticated("Missing bearer token"))?;

    validator.validate(token).await.map_err(|e| {
        match &e {
            AuthError::ServiceUnavailable(detail) => {
                tracing::warn!(error = %detail, "Identity verifier unavailable");
            }
            _ => tracing::debug!(error = ?e, "Bearer token rejected"),
        }
        VerificationError::from(e)
    })
}
