//! Process-wide session store.

use std::sync::Arc;

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, Key, SameSite, SignedCookieJar};
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::SessionError;
use super::backend::{MemorySessionBackend, SessionBackend};
use super::types::{Session, SessionId};
use crate::config::SessionConfig;
use crate::error::AuthError;

/// Session store shared by every request handler.
///
/// Cloning is cheap; all clones share the same signing key, backend and sweeper.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

struct Inner {
    key: Key,
    backend: Arc<dyn SessionBackend>,
    config: SessionConfig,
    same_site: SameSite,
    shutdown: CancellationToken,
}

impl SessionStore {
    /// Initializes the store with the in-memory backend.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the signing secret is missing,
    /// too short, or any cookie attribute is invalid.
    pub fn init(config: &SessionConfig) -> Result<Self, AuthError> {
        Self::with_backend(config, Arc::new(MemorySessionBackend::new()))
    }

    /// Initializes the store with a custom backend.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the configuration is invalid.
    pub fn with_backend(
        config: &SessionConfig,
        backend: Arc<dyn SessionBackend>,
    ) -> Result<Self, AuthError> {
        config
            .validate()
            .map_err(|e| AuthError::configuration(e.to_string()))?;
        let same_site = config
            .parsed_same_site()
            .map_err(|e| AuthError::configuration(e.to_string()))?;
        let secret = config
            .secret
            .as_deref()
            .ok_or_else(|| AuthError::configuration("auth.session.secret is required"))?;

        Ok(Self {
            inner: Arc::new(Inner {
                key: Key::derive_from(secret.as_bytes()),
                backend,
                config: config.clone(),
                same_site,
                shutdown: CancellationToken::new(),
            }),
        })
    }

    /// The session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Key that signs the session cookie.
    #[must_use]
    pub fn key(&self) -> Key {
        self.inner.key.clone()
    }

    /// Loads the session for the cookies of a request.
    ///
    /// Without a session cookie, or when the record has expired, a new
    /// empty session is returned.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Decode` if the cookie is present but does not
    /// verify, and `SessionError::Backend` if the backend fails.
    pub async fn load(&self, headers: &HeaderMap) -> Result<Session, SessionError> {
        // A signed jar silently drops cookies that fail verification, so the
        // raw cookie is looked up first and verified on its own.
        let Some(raw) = CookieJar::from_headers(headers)
            .get(&self.inner.config.cookie_name)
            .cloned()
        else {
            return Ok(Session::new());
        };

        let cookie = SignedCookieJar::new(self.key())
            .verify(raw)
            .ok_or(SessionError::Decode)?;
        let id: SessionId = cookie.value().parse().map_err(|_| SessionError::Decode)?;

        match self.inner.backend.load(&id).await? {
            Some(data) => {
                tracing::trace!(session_id = %id.log_prefix(), "Session loaded");
                Ok(Session::from_stored(id, data))
            }
            None => {
                tracing::debug!(session_id = %id.log_prefix(), "Session record missing or expired");
                Ok(Session::new())
            }
        }
    }

    /// Persists a session and sets its cookie.
    ///
    /// A session without changes is not written and the jar is returned
    /// untouched. Otherwise exactly one cookie is added to the jar.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Backend` if the backend fails. The jar is
    /// dropped in that case, so no cookie is set.
    pub async fn save(
        &self,
        jar: SignedCookieJar,
        session: &mut Session,
    ) -> Result<SignedCookieJar, SessionError> {
        if !session.is_dirty() {
            return Ok(jar);
        }

        let id = session.id();
        let expires_at = OffsetDateTime::now_utc() + self.inner.config.max_age;
        self.inner
            .backend
            .store(&id, session.data(), expires_at)
            .await?;

        if let Some(old) = session.take_rotated_from() {
            self.inner.backend.remove(&old).await?;
            tracing::debug!(
                old_session = %old.log_prefix(),
                session_id = %id.log_prefix(),
                "Session id rotated"
            );
        }
        session.mark_saved();

        Ok(jar.add(self.build_cookie(id.to_string())))
    }

    fn build_cookie(&self, value: String) -> Cookie<'static> {
        let config = &self.inner.config;
        let max_age = time::Duration::try_from(config.max_age).unwrap_or(time::Duration::DAY);

        Cookie::build((config.cookie_name.clone(), value))
            .http_only(config.http_only)
            .secure(config.secure)
            .same_site(self.inner.same_site)
            .path(config.path.clone())
            .max_age(max_age)
            .build()
    }

    /// Removes expired records once.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Backend` if the backend fails.
    pub async fn purge_expired(&self) -> Result<usize, SessionError> {
        self.inner.backend.purge_expired().await
    }

    /// Starts the background purge of expired records.
    ///
    /// The task runs every `sweep_interval` until [`SessionStore::shutdown`]
    /// is called.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let store = self.clone();
        let period = self.inner.config.sweep_interval;
        let shutdown = self.inner.shutdown.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            tracing::debug!(interval = ?period, "Session sweeper started");

            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = ticker.tick() => match store.purge_expired().await {
                        Ok(0) => {}
                        Ok(purged) => tracing::debug!(purged, "Purged expired sessions"),
                        Err(e) => tracing::warn!(error = %e, "Session purge failed"),
                    },
                }
            }

            tracing::debug!("Session sweeper stopped");
        })
    }

    /// Stops the background sweeper.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("cookie_name", &self.inner.config.cookie_name)
            .finish_non_exhaustive()
    }
}

/// `Cookie` request header a browser would send back after receiving `jar`.
#[cfg(test)]
pub(crate) fn cookie_header(jar: SignedCookieJar) -> String {
    use axum::response::IntoResponse;

    let response = jar.into_response();
    response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}
