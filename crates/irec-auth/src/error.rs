//! Authentication session error types.
//!
//! Every failure the session lifecycle can produce is one variant of
//! [`AuthError`]. Each variant maps to exactly one response (see
//! `http::error`), and none of them is retried by the request that hit it.

use std::fmt;

use crate::federation::IdpError;
use crate::session::SessionError;
use crate::upstream::UpstreamError;

/// Errors that can occur while authenticating a browser session or using it.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The session cookie could not be decoded or the store is unavailable.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// The `state` returned by the provider does not match the login attempt.
    #[error("State mismatch: {reason}")]
    StateMismatch {
        /// Why the state was rejected.
        reason: String,
    },

    /// The authorization code could not be exchanged with the provider.
    #[error("Identity exchange failed: {0}")]
    Exchange(#[from] IdpError),

    /// A backend API call made on behalf of the user failed.
    #[error("Backend call failed: {0}")]
    Upstream(#[from] UpstreamError),

    /// A protected handler ran without a credential in the session.
    #[error("Session credential missing behind the auth gate")]
    MissingCredential,

    /// The auth configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `StateMismatch` error.
    #[must_use]
    pub fn state_mismatch(reason: impl Into<String>) -> Self {
        Self::StateMismatch {
            reason: reason.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns the `MissingCredential` error.
    ///
    /// Reaching this is a defect: the auth gate guarantees a credential for
    /// every protected route. Debug builds panic so tests surface the bug;
    /// release builds fail the single request.
    #[must_use]
    pub fn missing_credential() -> Self {
        if cfg!(debug_assertions) {
            panic!("protected handler reached without a session credential");
        }
        Self::MissingCredential
    }

    /// Returns `true` if this error is an infrastructure or upstream fault.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Session(_)
                | Self::Upstream(_)
                | Self::MissingCredential
                | Self::Configuration { .. }
        )
    }

    /// Returns the error category for logging.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Session(_) => ErrorCategory::Infrastructure,
            Self::StateMismatch { .. } => ErrorCategory::Authentication,
            Self::Exchange(_) => ErrorCategory::Federation,
            Self::Upstream(_) => ErrorCategory::Upstream,
            Self::MissingCredential => ErrorCategory::Internal,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }
}

/// Categories of errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The login attempt itself was rejected.
    Authentication,
    /// Session storage or cookie decoding.
    Infrastructure,
    /// Identity provider exchange.
    Federation,
    /// Backend API calls.
    Upstream,
    /// Configuration errors.
    Configuration,
    /// Broken internal invariants.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Federation => write!(f, "federation"),
            Self::Upstream => write!(f, "upstream"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
