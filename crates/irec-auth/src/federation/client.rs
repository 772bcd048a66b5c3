//! Identity provider client.
//!
//! # Overview
//!
//! 1. **Begin login** - generate `state`, `nonce` and a PKCE verifier and
//!    build the authorization URL
//! 2. **Exchange code** - trade the authorization code for tokens
//! 3. **Validate claims** - check issuer, audience, expiry and nonce of the
//!    ID token
//! 4. **Build profile** - map claims (optionally merged with userinfo) to a
//!    typed [`Profile`](crate::session::Profile)

use std::time::Duration;

use serde::Deserialize;
use time::OffsetDateTime;
use url::Url;

use super::claims::IdTokenClaims;
use super::error::IdpError;
use crate::config::{HttpClientConfig, ProviderConfig};
use crate::error::AuthError;
use crate::oauth::{CHALLENGE_METHOD, PkceVerifier, random_token};
use crate::session::{AuthenticatedIdentity, PendingLogin};
use crate::upstream::{RetryPolicy, build_http_client};

/// Client for one OIDC identity provider.
#[derive(Debug, Clone)]
pub struct IdpClient {
    http: reqwest::Client,
    retry: RetryPolicy,
    issuer: String,
    client_id: String,
    client_secret: Option<String>,
    scopes: String,
    audience: Option<String>,
    fetch_userinfo: bool,
    clock_skew: Duration,
    callback_url: Url,
    authorization_url: Url,
    token_url: Url,
    userinfo_url: Url,
}

impl IdpClient {
    /// Creates a client from the provider settings.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if a provider URL is invalid or
    /// the HTTP client cannot be built.
    pub fn new(provider: &ProviderConfig, http: &HttpClientConfig) -> Result<Self, AuthError> {
        provider
            .validate()
            .map_err(|e| AuthError::configuration(e.to_string()))?;
        let url_error = |e: crate::config::ConfigError| AuthError::configuration(e.to_string());

        Ok(Self {
            http: build_http_client(http)
                .map_err(|e| AuthError::configuration(format!("HTTP client: {e}")))?,
            retry: RetryPolicy::from_config(&http.retry),
            issuer: provider.issuer.clone(),
            client_id: provider.client_id.clone(),
            client_secret: provider.client_secret.clone(),
            scopes: provider.scopes.join(" "),
            audience: provider.audience.clone(),
            fetch_userinfo: provider.fetch_userinfo,
            clock_skew: provider.clock_skew,
            callback_url: provider.callback_url().map_err(url_error)?,
            authorization_url: provider.authorization_url().map_err(url_error)?,
            token_url: provider.token_url().map_err(url_error)?,
            userinfo_url: provider.userinfo_url().map_err(url_error)?,
        })
    }

    /// Starts a login: returns the pending login to store in the session and
    /// the provider URL to redirect the browser to.
    #[must_use]
    pub fn begin_login(&self) -> (PendingLogin, Url) {
        let login = PendingLogin {
            state: random_token(),
            nonce: random_token(),
            pkce_verifier: PkceVerifier::generate().into_inner(),
            issued_at: OffsetDateTime::now_utc(),
        };
        let url = self.authorization_request(&login);
        (login, url)
    }

    /// Builds the authorization URL for a pending login.
    #[must_use]
    pub fn authorization_request(&self, login: &PendingLogin) -> Url {
        let challenge = PkceVerifier::from_stored(login.pkce_verifier.as_str()).challenge();

        let mut url = self.authorization_url.clone();
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("response_type", "code");
            params.append_pair("client_id", &self.client_id);
            params.append_pair("redirect_uri", self.callback_url.as_str());
            params.append_pair("scope", &self.scopes);
            params.append_pair("state", &login.state);
            params.append_pair("nonce", &login.nonce);
            params.append_pair("code_challenge", challenge.as_str());
            params.append_pair("code_challenge_method", CHALLENGE_METHOD);
            if let Some(audience) = &self.audience {
                params.append_pair("audience", audience);
            }
        }
        url
    }

    /// Completes a login: exchanges the code, validates the ID token
    /// against the pending login and builds the identity to store.
    ///
    /// # Errors
    ///
    /// Returns `IdpError` if the exchange fails or the ID token is invalid.
    pub async fn complete(
        &self,
        code: &str,
        login: &PendingLogin,
    ) -> Result<AuthenticatedIdentity, IdpError> {
        let verifier = PkceVerifier::from_stored(login.pkce_verifier.as_str());
        let tokens = self.exchange_code(code, &verifier).await?;

        let id_token = tokens
            .id_token
            .filter(|t| !t.is_empty())
            .ok_or(IdpError::MissingIdToken)?;
        let mut claims =
            IdTokenClaims::decode(&id_token, &self.issuer, &self.client_id, self.clock_skew)?;
        claims.verify_nonce(&login.nonce)?;
        if claims.sub.trim().is_empty() {
            return Err(IdpError::InvalidIdToken("empty subject".into()));
        }

        if self.fetch_userinfo {
            if let Some(access_token) = tokens.access_token.as_deref() {
                claims.merge_userinfo(self.fetch_userinfo(access_token).await?);
            }
        }

        let expires_at = tokens
            .expires_in
            .and_then(|secs| i64::try_from(secs).ok())
            .map(|secs| OffsetDateTime::now_utc() + time::Duration::seconds(secs))
            .or_else(|| claims.expires_at());

        tracing::info!(subject = %claims.sub, "Identity exchange completed");

        Ok(AuthenticatedIdentity {
            id_token,
            access_token: tokens.access_token,
            profile: claims.into_profile(),
            expires_at,
        })
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// Codes are single-use, so the request is only retried when it never
    /// reached the provider.
    ///
    /// # Errors
    ///
    /// Returns `IdpError` on network failure, non-2xx response or an
    /// unparseable body.
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: &PkceVerifier,
    ) -> Result<TokenResponse, IdpError> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.callback_url.as_str()),
            ("client_id", self.client_id.as_str()),
            ("code_verifier", verifier.as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        tracing::debug!(token_endpoint = %self.token_url, "Exchanging authorization code");

        let mut attempt = 0;
        let response = loop {
            match self.http.post(self.token_url.clone()).form(&params).send().await {
                Ok(response) => break response,
                Err(e) if e.is_connect() && self.retry.allows_retry(attempt) => {
                    tracing::warn!(error = %e, "Token endpoint unreachable, retrying");
                    self.retry.wait(attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if let Ok(oauth_error) = serde_json::from_str::<OAuthErrorResponse>(&body) {
                return Err(IdpError::oauth_error(
                    oauth_error.error,
                    oauth_error.error_description.unwrap_or_default(),
                ));
            }

            return Err(IdpError::TokenExchangeFailed(format!("HTTP {status} - {body}")));
        }

        response.json().await.map_err(|e| {
            IdpError::TokenExchangeFailed(format!("Failed to parse token response: {e}"))
        })
    }

    /// Fetches claims from the userinfo endpoint.
    ///
    /// # Errors
    ///
    /// Returns `IdpError::UserinfoFailed` on a non-2xx response or a
    /// non-JSON body.
    pub async fn fetch_userinfo(&self, access_token: &str) -> Result<serde_json::Value, IdpError> {
        let response = self
            .http
            .get(self.userinfo_url.clone())
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IdpError::UserinfoFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| IdpError::UserinfoFailed(format!("Failed to parse userinfo response: {e}")))
    }
}

/// OAuth token response from the provider.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// The access token.
    #[serde(default)]
    pub access_token: Option<String>,

    /// The token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,

    /// Token expiration in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,

    /// The ID token (JWT).
    #[serde(default)]
    pub id_token: Option<String>,

    /// Granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
}

/// OAuth error response from the provider.
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    error_description: Option<String>,
}
