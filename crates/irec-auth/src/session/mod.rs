//! Server-side browser sessions.
//!
//! A session is a record in a [`SessionBackend`] keyed by a [`SessionId`].
//! The browser only holds the id in one cookie, signed with a key derived
//! from the session secret. [`SessionStore`] is constructed once at startup and shared by
//! every handler; each request loads its own [`Session`] value.

mod backend;
mod profile;
mod store;
mod types;

pub use backend::{MemorySessionBackend, SessionBackend};
pub use profile::Profile;
pub use store::SessionStore;
#[cfg(test)]
pub(crate) use store::cookie_header;
pub use types::{
    AuthenticatedIdentity, BearerToken, IncompleteIdentity, PendingLogin, Session, SessionData, SessionId,
};

/// Errors produced while loading or saving a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session cookie is tampered, malformed or signed with another key.
    #[error("Session cookie could not be decoded")]
    Decode,

    /// The session backend failed.
    #[error("Session backend error: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
    },
}

impl SessionError {
    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
