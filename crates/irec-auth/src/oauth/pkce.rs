//! PKCE (RFC 7636) for the client side of the authorization-code flow.
//!
//! Only the S256 method is produced.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

/// Challenge method sent with every authorization request.
pub const CHALLENGE_METHOD: &str = "S256";

/// PKCE code verifier.
///
/// 32 random bytes encoded as base64url, which yields the 43-character
/// minimum length allowed by RFC 7636.
#[derive(Clone)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// Generate a cryptographically random verifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(super::random_token())
    }

    /// Rebuild a verifier stored with a pending login.
    #[must_use]
    pub fn from_stored(verifier: impl Into<String>) -> Self {
        Self(verifier.into())
    }

    /// Get the verifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the verifier and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// The S256 challenge for this verifier.
    #[must_use]
    pub fn challenge(&self) -> PkceChallenge {
        PkceChallenge::from_verifier(self)
    }
}

impl std::fmt::Debug for PkceVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PkceVerifier(***)")
    }
}

/// PKCE code challenge, `BASE64URL(SHA256(ASCII(code_verifier)))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge(String);

impl PkceChallenge {
    /// Compute the S256 challenge of a verifier.
    #[must_use]
    pub fn from_verifier(verifier: &PkceVerifier) -> Self {
        let hash = Sha256::digest(verifier.0.as_bytes());
        Self(URL_SAFE_NO_PAD.encode(hash))
    }

    /// Get the challenge as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
