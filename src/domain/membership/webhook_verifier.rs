//! Provider webhook signature verification.
//!
//! The provider signs the exact request body with HMAC-SHA256 using the
//! shared webhook secret and sends the lowercase hex digest in a header.
//! Verification must run over the raw bytes before any parsing.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::webhook_errors::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Verifier for provider webhook signatures.
pub struct WebhookSignatureVerifier {
    /// The webhook signing secret configured at the provider dashboard.
    secret: SecretString,
}

impl WebhookSignatureVerifier {
    /// Creates a new verifier with the given webhook secret.
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Verifies the signature header against the raw payload.
    ///
    /// # Errors
    ///
    /// - `MissingSignature` - header absent or blank
    /// - `InvalidSignature` - not hex, or digest mismatch
    pub fn verify(&self, payload: &[u8], signature: Option<&str>) -> Result<(), WebhookError> {
        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(WebhookError::MissingSignature)?;

        let provided = hex::decode(signature).map_err(|_| WebhookError::InvalidSignature)?;
        let expected = self.compute_signature(payload)?;

        if !constant_time_compare(&expected, &provided) {
            return Err(WebhookError::InvalidSignature);
        }
        Ok(())
    }

    fn compute_signature(&self, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| WebhookError::NotConfigured("webhook secret"))?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl std::fmt::Debug for WebhookSignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSignatureVerifier").finish_non_exhaustive()
    }
}

/// Performs constant-time comparison of two byte slices.
///
/// This prevents timing attacks that could leak information about the expected signature.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes the hex signature a provider would send, for test fixtures.
#[cfg(test)]
pub fn compute_test_signature(secret: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEST_SECRET: &str = "whsec_test_secret_12345";
    const PAYLOAD: &[u8] = br#"{"event":"payment.captured","payload":{"payment":{"entity":{"id":"pay_1"}}}}"#;

    fn verifier() -> WebhookSignatureVerifier {
        WebhookSignatureVerifier::new(SecretString::new(TEST_SECRET.to_string()))
    }

    // ══════════════════════════════════════════════════════════════
    // Signature Verification Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_valid_signature() {
        let signature = compute_test_signature(TEST_SECRET, PAYLOAD);
        assert!(verifier().verify(PAYLOAD, Some(&signature)).is_ok());
    }

    #[test]
    fn verify_accepts_uppercase_hex() {
        let signature = compute_test_signature(TEST_SECRET, PAYLOAD).to_uppercase();
        assert!(verifier().verify(PAYLOAD, Some(&signature)).is_ok());
    }

    #[test]
    fn verify_missing_signature_fails() {
        let result = verifier().verify(PAYLOAD, None);
        assert!(matches!(result, Err(WebhookError::MissingSignature)));

        let result = verifier().verify(PAYLOAD, Some("  "));
        assert!(matches!(result, Err(WebhookError::MissingSignature)));
    }

    #[test]
    fn verify_wrong_secret_fails() {
        let signature = compute_test_signature("whsec_other_secret", PAYLOAD);
        let result = verifier().verify(PAYLOAD, Some(&signature));
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn verify_tampered_payload_fails() {
        let signature = compute_test_signature(TEST_SECRET, PAYLOAD);
        let tampered = br#"{"event":"payment.captured","payload":{"payment":{"entity":{"id":"pay_2"}}}}"#;
        let result = verifier().verify(tampered, Some(&signature));
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn verify_reserialized_payload_fails() {
        // Whitespace differences alone must break the signature.
        let signature = compute_test_signature(TEST_SECRET, PAYLOAD);
        let value: serde_json::Value = serde_json::from_slice(PAYLOAD).unwrap();
        let pretty = serde_json::to_vec_pretty(&value).unwrap();
        let result = verifier().verify(&pretty, Some(&signature));
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn verify_non_hex_signature_fails() {
        let result = verifier().verify(PAYLOAD, Some("not_valid_hex"));
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn verify_truncated_signature_fails() {
        let signature = compute_test_signature(TEST_SECRET, PAYLOAD);
        let result = verifier().verify(PAYLOAD, Some(&signature[..32]));
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    // ══════════════════════════════════════════════════════════════
    // Constant-Time Comparison Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn constant_time_compare_equal_values() {
        assert!(constant_time_compare(b"hello", b"hello"));
    }

    #[test]
    fn constant_time_compare_different_values() {
        assert!(!constant_time_compare(b"hello", b"world"));
    }

    #[test]
    fn constant_time_compare_different_lengths() {
        assert!(!constant_time_compare(b"hello", b"hello world"));
    }

    #[test]
    fn constant_time_compare_empty_slices() {
        assert!(constant_time_compare(b"", b""));
    }

    proptest! {
        #[test]
        fn any_body_verifies_only_with_its_own_signature(
            body in proptest::collection::vec(any::<u8>(), 0..256),
            other in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            let signature = compute_test_signature(TEST_SECRET, &body);
            prop_assert!(verifier().verify(&body, Some(&signature)).is_ok());
            if other != body {
                prop_assert!(verifier().verify(&other, Some(&signature)).is_err());
            }
        }
    }
}
