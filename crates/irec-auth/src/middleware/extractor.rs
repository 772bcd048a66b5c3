//! Extractor giving protected handlers their session credential.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::error::AuthError;
use crate::session::{BearerToken, Profile, Session, SessionStore};

/// The authenticated session of a request behind the [`AuthGate`](super::AuthGate).
///
/// The session is re-read from the store; nothing is passed down from the
/// gate. A stored session without a credential here means the gate was
/// bypassed, which is a defect (see [`AuthError::missing_credential`]). A
/// record that vanished since the gate ran is a lost race, not a defect.
///
/// # Example
///
/// ```ignore
/// async fn positions(auth: Authenticated, State(api): State<BackendClient>) -> Result<Html<String>, AuthError> {
///     let positions: Vec<Position> = api.get_json(auth.token(), &["positions"]).await?;
///     Ok(Html(render_positions(auth.profile(), &positions)))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Authenticated {
    session: Session,
    token: BearerToken,
    profile: Profile,
}

impl Authenticated {
    /// Credential for backend calls.
    #[must_use]
    pub fn token(&self) -> &BearerToken {
        &self.token
    }

    /// Profile of the signed-in user.
    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// The loaded session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
    SessionStore: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = SessionStore::from_ref(state);
        let session = store.load(&parts.headers).await?;

        match (session.bearer_token(), session.profile().cloned()) {
            (Some(token), Some(profile)) => Ok(Self {
                session,
                token,
                profile,
            }),
            // A login completing in another tab between the gate and this
            // reload rotates the session id and removes the record the gate
            // saw, so the cookie still sent here resolves to a new session.
            _ if session.is_new() => {
                tracing::debug!(
                    path = %parts.uri.path(),
                    "Session record gone after the gate, rotated by a concurrent login"
                );
                Err(AuthError::MissingCredential)
            }
            _ => Err(AuthError::missing_credential()),
        }
    }
}
