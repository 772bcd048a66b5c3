//! OAuth 2.0 client primitives: PKCE, `state` and `nonce` values.

pub mod pkce;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;

pub use pkce::{CHALLENGE_METHOD, PkceChallenge, PkceVerifier};

/// 32 random bytes, base64url encoded without padding.
///
/// Used for `state`, `nonce` and PKCE verifiers.
#[must_use]
pub fn random_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compare two secrets without short-circuiting on the first difference.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
