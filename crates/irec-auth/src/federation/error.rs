//! Error types for the identity provider exchange.

use crate::session::IncompleteIdentity;

/// Errors that can occur while completing a login with the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum IdpError {
    /// The provider redirected back with an OAuth error instead of a code.
    #[error("Provider returned error: {error} - {description}")]
    ProviderRejected {
        /// The OAuth error code.
        error: String,
        /// Optional error description.
        description: String,
    },

    /// The callback carried no authorization code.
    #[error("Authorization code missing from callback")]
    MissingCode,

    /// Token exchange with the provider failed.
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// The token endpoint returned an OAuth error.
    #[error("OAuth error from provider: {error} - {description}")]
    OAuthError {
        /// The OAuth error code.
        error: String,
        /// Optional error description.
        description: String,
    },

    /// The token response carried no ID token.
    #[error("Token response did not include an ID token")]
    MissingIdToken,

    /// The ID token decoded but does not identify a user.
    #[error("Invalid ID token: {0}")]
    InvalidIdToken(String),

    /// The ID token failed decoding or claim validation (issuer, audience, expiry).
    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    /// The nonce in the ID token doesn't match the pending login.
    #[error("Nonce mismatch: ID token nonce does not match expected nonce")]
    NonceMismatch,

    /// The validated claims do not describe a usable identity.
    #[error(transparent)]
    IncompleteIdentity(#[from] IncompleteIdentity),

    /// The userinfo endpoint failed.
    #[error("Userinfo request failed: {0}")]
    UserinfoFailed(String),

    /// A network error occurred.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl IdpError {
    /// Creates a `ProviderRejected` error from callback parameters.
    #[must_use]
    pub fn provider_rejected(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self::ProviderRejected {
            error: error.into(),
            description: description.into(),
        }
    }

    /// Creates an `OAuthError` from a token endpoint response.
    #[must_use]
    pub fn oauth_error(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self::OAuthError {
            error: error.into(),
            description: description.into(),
        }
    }

}
