//! Session value types.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::profile::Profile;

// =============================================================================
// Identifiers and credentials
// =============================================================================

/// Opaque session key carried (signed) in the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new random session id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Short prefix that is safe to log.
    #[must_use]
    pub fn log_prefix(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Bearer credential attached to backend calls.
///
/// Only obtainable from an authenticated session. `Debug` never prints the
/// token.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// The raw token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

// =============================================================================
// Login and identity
// =============================================================================

/// Parameters of a login that was started and awaits its callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingLogin {
    /// The `state` sent to the provider.
    pub state: String,

    /// The OIDC `nonce` sent to the provider.
    pub nonce: String,

    /// PKCE verifier matching the challenge sent to the provider.
    pub pkce_verifier: String,

    /// When the login was started.
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
}

impl PendingLogin {
    /// Returns `true` if the login is older than `ttl`.
    #[must_use]
    pub fn is_expired(&self, ttl: Duration, now: OffsetDateTime) -> bool {
        now - self.issued_at > ttl
    }
}

/// Everything a successful identity exchange writes into a session.
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    /// ID token forwarded to the backend.
    pub id_token: String,

    /// Provider access token, kept server-side.
    pub access_token: Option<String>,

    /// Typed profile built from the claims.
    pub profile: Profile,

    /// When the token stops being valid, if known.
    pub expires_at: Option<OffsetDateTime>,
}

/// An identity without a token or profile was offered to a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Incomplete identity: {0}")]
pub struct IncompleteIdentity(pub &'static str);

// =============================================================================
// Session data
// =============================================================================

/// Persisted contents of a session.
///
/// Fields are private so that `id_token` and `profile` can only be written
/// together through [`Session::authenticate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    profile: Option<Profile>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    expires_at: Option<OffsetDateTime>,
    #[serde(default)]
    pending_login: Option<PendingLogin>,
}

impl SessionData {
    /// Returns `true` if the data satisfies the session invariant: either no
    /// credential at all, or a non-empty credential with a non-empty profile.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        match (&self.id_token, &self.profile) {
            (None, None) => true,
            (Some(token), Some(profile)) => !token.is_empty() && !profile.is_empty(),
            _ => false,
        }
    }

    /// ID token, if authenticated.
    #[must_use]
    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_deref()
    }

    /// Profile, if authenticated.
    #[must_use]
    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }
}

/// A request-scoped session handle.
///
/// Obtained fresh from the `SessionStore` on every request. Mutations mark
/// the session dirty; `SessionStore::save` persists dirty sessions only.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    data: SessionData,
    is_new: bool,
    dirty: bool,
    rotated_from: Option<SessionId>,
}

impl Session {
    /// A fresh, empty, unsaved session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: SessionId::generate(),
            data: SessionData::default(),
            is_new: true,
            dirty: false,
            rotated_from: None,
        }
    }

    /// A session loaded from the store.
    pub(crate) fn from_stored(id: SessionId, data: SessionData) -> Self {
        Self {
            id,
            data,
            is_new: false,
            dirty: false,
            rotated_from: None,
        }
    }

    /// The session key.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns `true` if the session was created by this request.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Returns `true` if the session has unsaved changes.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Persisted contents.
    #[must_use]
    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Returns `true` if the session carries a credential.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.data.id_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// ID token, if authenticated.
    #[must_use]
    pub fn id_token(&self) -> Option<&str> {
        self.data.id_token()
    }

    /// Credential for backend calls, if authenticated.
    #[must_use]
    pub fn bearer_token(&self) -> Option<BearerToken> {
        self.data
            .id_token
            .as_ref()
            .filter(|t| !t.is_empty())
            .map(|t| BearerToken(t.clone()))
    }

    /// Provider access token, if one was issued.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.data.access_token.as_deref()
    }

    /// Profile of the authenticated user.
    #[must_use]
    pub fn profile(&self) -> Option<&Profile> {
        self.data.profile()
    }

    /// Token expiry, if known.
    #[must_use]
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.data.expires_at
    }

    /// Returns `true` if the token expiry is known and has passed.
    #[must_use]
    pub fn is_token_expired(&self, now: OffsetDateTime) -> bool {
        self.data.expires_at.is_some_and(|at| at <= now)
    }

    /// The login awaiting its callback, if any.
    #[must_use]
    pub fn pending_login(&self) -> Option<&PendingLogin> {
        self.data.pending_login.as_ref()
    }

    /// Record a started login.
    pub fn begin_login(&mut self, login: PendingLogin) {
        self.data.pending_login = Some(login);
        self.dirty = true;
    }

    /// Populate the session from a successful identity exchange.
    ///
    /// Token, profile and expiry are written together; the pending login is
    /// cleared and the session id rotated. Nothing is written if the
    /// identity is incomplete.
    ///
    /// # Errors
    ///
    /// Returns `IncompleteIdentity` if the token or profile is empty.
    pub fn authenticate(&mut self, identity: AuthenticatedIdentity) -> Result<(), IncompleteIdentity> {
        if identity.id_token.is_empty() {
            return Err(IncompleteIdentity("empty id token"));
        }
        if identity.profile.is_empty() {
            return Err(IncompleteIdentity("empty profile"));
        }

        self.data = SessionData {
            id_token: Some(identity.id_token),
            access_token: identity.access_token,
            profile: Some(identity.profile),
            expires_at: identity.expires_at,
            pending_login: None,
        };
        self.rotate_id();
        self.dirty = true;
        Ok(())
    }

    fn rotate_id(&mut self) {
        if !self.is_new && self.rotated_from.is_none() {
            self.rotated_from = Some(self.id);
        }
        self.id = SessionId::generate();
    }

    pub(crate) fn take_rotated_from(&mut self) -> Option<SessionId> {
        self.rotated_from.take()
    }

    pub(crate) fn mark_saved(&mut self) {
        self.dirty = false;
        self.is_new = false;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
