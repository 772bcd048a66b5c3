//! The auth gate placed in front of every protected route.

use async_trait::async_trait;
use axum::{
    http::request::Parts,
    response::{IntoResponse, Redirect},
};
use time::OffsetDateTime;

use super::interceptor::{Flow, Interceptor};
use crate::error::AuthError;
use crate::session::SessionStore;

/// Lets a request through only if its session carries a credential.
///
/// - session cannot be loaded: 500, distinct from being logged out
/// - no `id_token`: 303 to the unauthenticated route
/// - `id_token` present: continue
///
/// With `enforce_token_expiry`, a session whose token has expired counts as
/// logged out.
#[derive(Debug, Clone)]
pub struct AuthGate {
    store: SessionStore,
    unauthenticated: String,
    enforce_token_expiry: bool,
}

impl AuthGate {
    /// Creates a gate redirecting to `unauthenticated`.
    #[must_use]
    pub fn new(store: SessionStore, unauthenticated: impl Into<String>) -> Self {
        let enforce_token_expiry = store.config().enforce_token_expiry;
        Self {
            store,
            unauthenticated: unauthenticated.into(),
            enforce_token_expiry,
        }
    }
}

#[async_trait]
impl Interceptor for AuthGate {
    fn name(&self) -> &'static str {
        "auth_gate"
    }

    async fn intercept(&self, parts: &Parts) -> Flow {
        let session = match self.store.load(&parts.headers).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(path = %parts.uri.path(), error = %e, "Session lookup failed");
                return Flow::Respond(AuthError::from(e).into_response());
            }
        };

        if !session.is_authenticated() {
            tracing::debug!(path = %parts.uri.path(), "No session credential, redirecting");
            return Flow::Respond(Redirect::to(&self.unauthenticated).into_response());
        }

        if self.enforce_token_expiry && session.is_token_expired(OffsetDateTime::now_utc()) {
            tracing::debug!(
                session_id = %session.id().log_prefix(),
                "Session token expired, redirecting"
            );
            return Flow::Respond(Redirect::to(&self.unauthenticated).into_response());
        }

        Flow::Continue
    }
}
