//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `mock` - Token map for tests and local development
//! - `oidc` - JWKS-backed validation for any OIDC issuer
//! - `reject_all` - Stand-in when no issuer is configured

mod mock;
mod oidc;
mod reject_all;

pub use mock::MockSessionValidator;
pub use oidc::{OidcConfig, OidcSessionValidator};
pub use reject_all::RejectAllSessionValidator;
