//! `x-verify` signature checking.
//!
//! The provider signs a callback as
//! `hex(sha256(response + signature_path + salt_key)) + "###" + salt_index`,
//! where `response` is the base64 blob exactly as it appears on the wire.
//! Nothing is canonicalized before hashing.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::constants::{DEFAULT_SIGNATURE_PATH, SIGNATURE_SEPARATOR};

/// Verifies callback signatures against the shared salt key.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
    path_suffix: String,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &"[REDACTED]")
            .field("path_suffix", &self.path_suffix)
            .finish()
    }
}

impl SignatureVerifier {
    /// Create a verifier using the default `/pg/v1/status` path suffix.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self::with_path(secret, DEFAULT_SIGNATURE_PATH)
    }

    /// Create a verifier with the path suffix agreed with the provider.
    /// A suffix that differs from the provider's makes every callback fail.
    pub fn with_path(secret: impl Into<Vec<u8>>, path_suffix: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            path_suffix: path_suffix.into(),
        }
    }

    pub fn path_suffix(&self) -> &str {
        &self.path_suffix
    }

    /// Compute the digest the provider should have sent for `payload`.
    pub fn expected_digest(&self, payload: &str) -> String {
        compute_signature(payload, &self.path_suffix, &self.secret)
    }

    /// Check a claimed `x-verify` header against `payload`.
    ///
    /// Fails closed: a missing header, an empty payload, a header without
    /// `###` or an empty digest all return `false`.
    pub fn verify(&self, payload: &str, header: Option<&str>) -> bool {
        if payload.is_empty() {
            return false;
        }
        let Some((digest, _salt_index)) = header.and_then(split_signature_header) else {
            return false;
        };
        if digest.is_empty() {
            return false;
        }
        // Salt index is not checked against a salt table; one key is configured.
        let expected = self.expected_digest(payload);
        constant_time_eq(expected.as_bytes(), digest.as_bytes())
    }
}

/// `hex(sha256(payload + path_suffix + secret))`, lowercase.
pub fn compute_signature(payload: &str, path_suffix: &str, secret: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hasher.update(path_suffix.as_bytes());
    hasher.update(secret);
    hex::encode(hasher.finalize())
}

/// Build a full `x-verify` header value for `payload`.
pub fn sign_header(payload: &str, path_suffix: &str, secret: &[u8], salt_index: &str) -> String {
    format!(
        "{}{SIGNATURE_SEPARATOR}{salt_index}",
        compute_signature(payload, path_suffix, secret)
    )
}

/// Split `<digest>###<saltIndex>` into its parts, byte for byte.
/// Returns `None` when the separator is absent.
pub fn split_signature_header(header: &str) -> Option<(&str, &str)> {
    header.split_once(SIGNATURE_SEPARATOR)
}

/// Constant-time comparison over SHA-256 digests of both inputs, so timing
/// leaks neither content nor length.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let ha = Sha256::digest(a);
    let hb = Sha256::digest(b);
    ha.ct_eq(&hb).into()
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().fold(String::new(), |mut s, b| {
            use std::fmt::Write;
            let _ = write!(s, "{b:02x}");
            s
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = "eyJ0ZXN0IjoxfQ==";
    const SALT: &[u8] = b"test-salt";

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(SALT)
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            compute_signature(PAYLOAD, "/pg/v1/status", SALT),
            "ba52add9368c57efb57056e293af1e20fd84e2e75e37f8810b8d8253c6e7d170"
        );
    }

    #[test]
    fn test_signature_is_deterministic() {
        let a = verifier().expected_digest(PAYLOAD);
        let b = verifier().expected_digest(PAYLOAD);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_valid_header_verifies() {
        let header = sign_header(PAYLOAD, "/pg/v1/status", SALT, "1");
        assert!(verifier().verify(PAYLOAD, Some(&header)));
    }

    #[test]
    fn test_salt_index_is_not_validated() {
        let digest = compute_signature(PAYLOAD, "/pg/v1/status", SALT);
        assert!(verifier().verify(PAYLOAD, Some(&format!("{digest}###99"))));
        assert!(verifier().verify(PAYLOAD, Some(&format!("{digest}###"))));
    }

    #[test]
    fn test_single_bit_flip_fails() {
        let header = sign_header(PAYLOAD, "/pg/v1/status", SALT, "1");
        let mut bytes = PAYLOAD.as_bytes().to_vec();
        bytes[3] ^= 0x01;
        let tampered = String::from_utf8(bytes).unwrap();
        assert_ne!(tampered, PAYLOAD);
        assert!(!verifier().verify(&tampered, Some(&header)));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let header = sign_header(PAYLOAD, "/pg/v1/status", b"other-salt", "1");
        assert!(!verifier().verify(PAYLOAD, Some(&header)));
    }

    #[test]
    fn test_wrong_path_suffix_fails() {
        let header = sign_header(PAYLOAD, "/pg/v1/pay", SALT, "1");
        assert!(!verifier().verify(PAYLOAD, Some(&header)));

        let custom = SignatureVerifier::with_path(SALT, "/pg/v1/pay");
        assert!(custom.verify(PAYLOAD, Some(&header)));
    }

    #[test]
    fn test_comparison_is_case_sensitive() {
        let header = sign_header(PAYLOAD, "/pg/v1/status", SALT, "1").to_uppercase();
        assert!(!verifier().verify(PAYLOAD, Some(&header)));
    }

    #[test]
    fn test_fails_closed_on_bad_input() {
        let digest = compute_signature(PAYLOAD, "/pg/v1/status", SALT);
        assert!(!verifier().verify(PAYLOAD, None));
        assert!(!verifier().verify(PAYLOAD, Some(&digest)));
        assert!(!verifier().verify(PAYLOAD, Some("###1")));
        assert!(!verifier().verify("", Some(&format!("{digest}###1"))));
    }

    #[test]
    fn test_split_signature_header() {
        assert_eq!(split_signature_header("abc###1"), Some(("abc", "1")));
        assert_eq!(split_signature_header(" abc###1 "), Some((" abc", "1 ")));
        assert_eq!(split_signature_header("abc"), None);
    }

    #[test]
    fn test_padded_digest_fails() {
        let digest = compute_signature(PAYLOAD, "/pg/v1/status", SALT);
        assert!(!verifier().verify(PAYLOAD, Some(&format!(" {digest}###1"))));
        assert!(!verifier().verify(PAYLOAD, Some(&format!("{digest} ###1"))));
        assert!(verifier().verify(PAYLOAD, Some(&format!("{digest}###1 "))));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"token", b"token"));
        assert!(!constant_time_eq(b"token", b"tokens"));
        assert!(!constant_time_eq(b"", b"token"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let dbg = format!("{:?}", verifier());
        assert!(dbg.contains("[REDACTED]"));
        assert!(!dbg.contains("test-salt"));
    }
}
