//! Login and callback handlers (identity exchange).
//!
//! ```text
//! Start -> CodeReceived -> {StateValidated | Rejected}
//!       -> {TokenExchanged | ExchangeFailed}
//!       -> SessionWritten | ErrorRendered
//! ```
//!
//! Nothing is written to the session unless the whole exchange succeeds.

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Key, SignedCookieJar};
use serde::Deserialize;
use time::OffsetDateTime;

use super::templates::render_error_page;
use crate::config::RouteConfig;
use crate::error::AuthError;
use crate::federation::{IdpClient, IdpError};
use crate::oauth::constant_time_eq;
use crate::session::{Session, SessionError, SessionStore};

/// State for the login and callback handlers.
#[derive(Clone)]
pub struct ExchangeState {
    /// Session store.
    pub store: SessionStore,
    /// Identity provider client.
    pub idp: IdpClient,
    /// Redirect targets.
    pub routes: RouteConfig,
}

impl ExchangeState {
    /// Creates the exchange state.
    #[must_use]
    pub fn new(store: SessionStore, idp: IdpClient, routes: RouteConfig) -> Self {
        Self { store, idp, routes }
    }
}

impl FromRef<ExchangeState> for SessionStore {
    fn from_ref(state: &ExchangeState) -> Self {
        state.store.clone()
    }
}

impl FromRef<ExchangeState> for Key {
    fn from_ref(state: &ExchangeState) -> Self {
        state.store.key()
    }
}

/// Parameters the provider sends back to the callback.
///
/// Exists for one exchange only and is never persisted.
#[derive(Debug, Default, Deserialize)]
pub struct AuthorizationState {
    /// The authorization code.
    #[serde(default)]
    pub code: Option<String>,

    /// The `state` issued by [`login`].
    #[serde(default)]
    pub state: Option<String>,

    /// OAuth error code, when the provider refused the login.
    #[serde(default)]
    pub error: Option<String>,

    /// Human-readable error description.
    #[serde(default)]
    pub error_description: Option<String>,
}

/// `GET /login`: starts a login and redirects to the provider.
///
/// A cookie that no longer decodes (e.g. after a secret rotation) is
/// replaced by a fresh session here, so the user can always sign in again.
pub async fn login(
    State(state): State<ExchangeState>,
    headers: HeaderMap,
    jar: SignedCookieJar,
) -> Result<Response, AuthError> {
    let mut session = match state.store.load(&headers).await {
        Ok(session) => session,
        Err(SessionError::Decode) => {
            tracing::info!("Replacing undecodable session cookie at login");
            Session::new()
        }
        Err(e) => return Err(e.into()),
    };

    let (pending, authorization_url) = state.idp.begin_login();
    session.begin_login(pending);
    let jar = state.store.save(jar, &mut session).await?;

    tracing::debug!(session_id = %session.id().log_prefix(), "Login started");
    Ok((jar, Redirect::to(authorization_url.as_str())).into_response())
}

/// `GET /callback?code&state`.
pub async fn callback_get(
    State(state): State<ExchangeState>,
    headers: HeaderMap,
    jar: SignedCookieJar,
    Query(params): Query<AuthorizationState>,
) -> Response {
    handle_callback(&state, &headers, jar, params).await
}

/// `POST /callback` (`response_mode=form_post`).
pub async fn callback_post(
    State(state): State<ExchangeState>,
    headers: HeaderMap,
    jar: SignedCookieJar,
    Form(params): Form<AuthorizationState>,
) -> Response {
    handle_callback(&state, &headers, jar, params).await
}

async fn handle_callback(
    state: &ExchangeState,
    headers: &HeaderMap,
    jar: SignedCookieJar,
    params: AuthorizationState,
) -> Response {
    match exchange(state, headers, jar, params).await {
        Ok(response) => response,
        Err(AuthError::StateMismatch { reason }) => {
            tracing::warn!(reason = %reason, "Callback rejected, restarting login");
            Redirect::to(&state.routes.login).into_response()
        }
        Err(AuthError::Exchange(e)) => {
            tracing::warn!(error = %e, "Identity exchange failed");
            let html = render_error_page(
                "Sign-in failed",
                "The identity provider did not complete the sign-in.",
                Some(&state.routes.login),
            );
            (StatusCode::BAD_GATEWAY, Html(html)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn exchange(
    state: &ExchangeState,
    headers: &HeaderMap,
    jar: SignedCookieJar,
    params: AuthorizationState,
) -> Result<Response, AuthError> {
    let mut session = state.store.load(headers).await?;

    if let Some(error) = params.error {
        return Err(IdpError::provider_rejected(error, params.error_description.unwrap_or_default()).into());
    }

    let pending = session
        .pending_login()
        .cloned()
        .ok_or_else(|| AuthError::state_mismatch("no login in progress"))?;
    let returned = params
        .state
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AuthError::state_mismatch("state parameter missing"))?;

    if pending.is_expired(state.store.config().login_ttl, OffsetDateTime::now_utc()) {
        return Err(AuthError::state_mismatch("login expired"));
    }
    if !constant_time_eq(returned, &pending.state) {
        return Err(AuthError::state_mismatch("state does not match"));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or(IdpError::MissingCode)?;

    let identity = state.idp.complete(&code, &pending).await?;
    session.authenticate(identity).map_err(IdpError::from)?;
    let jar = state.store.save(jar, &mut session).await?;

    tracing::info!(session_id = %session.id().log_prefix(), "User signed in");
    Ok((jar, Redirect::to(&state.routes.landing)).into_response())
}
