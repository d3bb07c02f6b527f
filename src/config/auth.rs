//! Authentication configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// OIDC session-token validation settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Token issuer URL
    pub issuer_url: String,

    /// Expected `aud` claim
    pub audience: String,

    /// JWKS endpoint; derived from the issuer when unset
    pub jwks_url: Option<String>,

    /// JWKS cache TTL in seconds
    #[serde(default = "default_jwks_cache_ttl")]
    pub jwks_cache_ttl_secs: u64,
}

impl AuthConfig {
    pub fn jwks_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_cache_ttl_secs)
    }

    /// Validate authentication configuration
    ///
    /// Production deployments must reach the issuer and the JWKS endpoint
    /// over HTTPS.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.issuer_url.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__ISSUER_URL"));
        }
        if self.audience.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__AUDIENCE"));
        }

        if *environment == Environment::Production {
            let insecure = |url: &str| !url.starts_with("https://");
            if insecure(&self.issuer_url) || self.jwks_url.as_deref().is_some_and(insecure) {
                return Err(ValidationError::AuthorityMustBeHttps);
            }
        }

        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer_url: String::new(),
            audience: String::new(),
            jwks_url: None,
            jwks_cache_ttl_secs: default_jwks_cache_ttl(),
        }
    }
}

fn default_jwks_cache_ttl() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(issuer: &str) -> AuthConfig {
        AuthConfig {
            issuer_url: issuer.to_string(),
            audience: "portfolio".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.jwks_cache_ttl(), Duration::from_secs(3600));
        assert!(config.jwks_url.is_none());
    }

    #[test]
    fn requires_issuer_and_audience() {
        assert!(AuthConfig::default()
            .validate(&Environment::Development)
            .is_err());

        let config = AuthConfig {
            audience: String::new(),
            ..config("https://auth.example.com")
        };
        assert!(matches!(
            config.validate(&Environment::Development),
            Err(ValidationError::MissingRequired("AUTH__AUDIENCE"))
        ));
    }

    #[test]
    fn http_issuer_allowed_outside_production() {
        assert!(config("http://localhost:8081")
            .validate(&Environment::Development)
            .is_ok());
    }

    #[test]
    fn production_requires_https() {
        assert!(matches!(
            config("http://auth.example.com").validate(&Environment::Production),
            Err(ValidationError::AuthorityMustBeHttps)
        ));
        assert!(config("https://auth.example.com")
            .validate(&Environment::Production)
            .is_ok());

        let config = AuthConfig {
            jwks_url: Some("http://auth.example.com/keys".to_string()),
            ..config("https://auth.example.com")
        };
        assert!(matches!(
            config.validate(&Environment::Production),
            Err(ValidationError::AuthorityMustBeHttps)
        ));
    }
}
