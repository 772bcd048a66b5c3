//! Authentication configuration.
//!
//! Settings for the identity provider, the session cookie and store, the
//! outbound HTTP clients, and the routes the auth flow redirects between.
//!
//! # Example (TOML)
//!
//! ```toml
//! [auth.provider]
//! issuer = "https://irec.eu.auth0.com"
//! client_id = "irec-front"
//! client_secret = "..."
//! callback_url = "http://localhost:3000/callback"
//!
//! [auth.session]
//! secret = "at-least-thirty-two-bytes-of-secret-material"
//! max_age = "24h"
//!
//! [auth.http]
//! timeout = "10s"
//! ```

use std::time::Duration;

use cookie::SameSite;
use serde::{Deserialize, Serialize};
use url::Url;

/// Minimum length of the session signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Root authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Identity provider settings.
    pub provider: ProviderConfig,

    /// Session cookie and store settings.
    pub session: SessionConfig,

    /// Outbound HTTP client settings.
    pub http: HttpClientConfig,

    /// Routes used by the login flow and the auth gate.
    pub routes: RouteConfig,
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` naming the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.provider.validate()?;
        self.session.validate()?;
        self.http.validate()?;
        self.routes.validate()?;
        Ok(())
    }
}

/// Identity provider (authorization server) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Issuer base URL. Endpoints default to paths under it.
    pub issuer: String,

    /// OAuth client identifier.
    pub client_id: String,

    /// OAuth client secret (confidential client).
    pub client_secret: Option<String>,

    /// Absolute URL of this application's `/callback` route.
    pub callback_url: String,

    /// Authorization endpoint override (default `{issuer}/authorize`).
    pub authorization_endpoint: Option<String>,

    /// Token endpoint override (default `{issuer}/oauth/token`).
    pub token_endpoint: Option<String>,

    /// Userinfo endpoint override (default `{issuer}/userinfo`).
    pub userinfo_endpoint: Option<String>,

    /// Requested scopes.
    pub scopes: Vec<String>,

    /// Optional API audience sent with the authorization request.
    pub audience: Option<String>,

    /// Whether to merge the userinfo response into the profile after the
    /// code exchange.
    pub fetch_userinfo: bool,

    /// Clock skew allowed when checking the ID token `exp`.
    #[serde(with = "humantime_serde")]
    pub clock_skew: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            issuer: String::new(),
            client_id: String::new(),
            client_secret: None,
            callback_url: "http://localhost:3000/callback".to_string(),
            authorization_endpoint: None,
            token_endpoint: None,
            userinfo_endpoint: None,
            scopes: vec!["openid".into(), "profile".into()],
            audience: None,
            fetch_userinfo: false,
            clock_skew: Duration::from_secs(60),
        }
    }
}

impl ProviderConfig {
    /// Validates the provider configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required value is missing or a URL is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::missing("auth.provider.issuer"));
        }
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::missing("auth.provider.client_id"));
        }
        if self.scopes.is_empty() {
            return Err(ConfigError::invalid(
                "auth.provider.scopes",
                "at least one scope is required",
            ));
        }
        self.issuer_url()?;
        self.callback_url()?;
        self.authorization_url()?;
        self.token_url()?;
        self.userinfo_url()?;
        Ok(())
    }

    /// Parsed issuer URL.
    pub fn issuer_url(&self) -> Result<Url, ConfigError> {
        parse_url("auth.provider.issuer", &self.issuer)
    }

    /// Parsed callback URL.
    pub fn callback_url(&self) -> Result<Url, ConfigError> {
        parse_url("auth.provider.callback_url", &self.callback_url)
    }

    /// Authorization endpoint, explicit or derived from the issuer.
    pub fn authorization_url(&self) -> Result<Url, ConfigError> {
        self.endpoint(
            "auth.provider.authorization_endpoint",
            self.authorization_endpoint.as_deref(),
            "authorize",
        )
    }

    /// Token endpoint, explicit or derived from the issuer.
    pub fn token_url(&self) -> Result<Url, ConfigError> {
        self.endpoint(
            "auth.provider.token_endpoint",
            self.token_endpoint.as_deref(),
            "oauth/token",
        )
    }

    /// Userinfo endpoint, explicit or derived from the issuer.
    pub fn userinfo_url(&self) -> Result<Url, ConfigError> {
        self.endpoint(
            "auth.provider.userinfo_endpoint",
            self.userinfo_endpoint.as_deref(),
            "userinfo",
        )
    }

    fn endpoint(
        &self,
        key: &'static str,
        explicit: Option<&str>,
        default_path: &str,
    ) -> Result<Url, ConfigError> {
        match explicit {
            Some(url) => parse_url(key, url),
            None => parse_url(
                key,
                &format!("{}/{}", self.issuer.trim_end_matches('/'), default_path),
            ),
        }
    }
}

/// Session cookie and store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the session cookie.
    pub cookie_name: String,

    /// Secret used to sign session cookies. Required.
    pub secret: Option<String>,

    /// Set the `Secure` cookie attribute.
    pub secure: bool,

    /// Set the `HttpOnly` cookie attribute.
    pub http_only: bool,

    /// `SameSite` attribute: "strict", "lax" or "none".
    pub same_site: String,

    /// Cookie path.
    pub path: String,

    /// Lifetime of a stored session and its cookie.
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,

    /// How long a started login may wait for its callback.
    #[serde(with = "humantime_serde")]
    pub login_ttl: Duration,

    /// Treat sessions whose token has expired as logged out.
    pub enforce_token_expiry: bool,

    /// Interval of the background purge of expired sessions.
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "auth-session".to_string(),
            secret: None,
            secure: false,
            http_only: true,
            same_site: "lax".to_string(),
            path: "/".to_string(),
            max_age: Duration::from_secs(24 * 3600),
            login_ttl: Duration::from_secs(600),
            enforce_token_expiry: false,
            sweep_interval: Duration::from_secs(300),
        }
    }
}

impl SessionConfig {
    /// Validates the session configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the secret is missing or too short, or if a
    /// cookie attribute is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.secret.as_deref() {
            None | Some("") => return Err(ConfigError::missing("auth.session.secret")),
            Some(secret) if secret.len() < MIN_SECRET_LEN => {
                return Err(ConfigError::invalid(
                    "auth.session.secret",
                    format!("must be at least {MIN_SECRET_LEN} bytes"),
                ));
            }
            Some(_) => {}
        }
        if self.cookie_name.trim().is_empty() {
            return Err(ConfigError::missing("auth.session.cookie_name"));
        }
        self.parsed_same_site()?;
        if self.max_age.is_zero() {
            return Err(ConfigError::invalid("auth.session.max_age", "must be > 0"));
        }
        if self.login_ttl.is_zero() {
            return Err(ConfigError::invalid("auth.session.login_ttl", "must be > 0"));
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::invalid(
                "auth.session.sweep_interval",
                "must be > 0",
            ));
        }
        Ok(())
    }

    /// Parsed `SameSite` attribute.
    pub fn parsed_same_site(&self) -> Result<SameSite, ConfigError> {
        match self.same_site.to_ascii_lowercase().as_str() {
            "strict" => Ok(SameSite::Strict),
            "lax" => Ok(SameSite::Lax),
            "none" => Ok(SameSite::None),
            other => Err(ConfigError::invalid(
                "auth.session.same_site",
                format!("unknown value '{other}'"),
            )),
        }
    }
}

/// Outbound HTTP client configuration, shared by the provider and backend clients.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Total timeout of one outbound request.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Connect timeout of one outbound request.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Retry policy for outbound requests.
    pub retry: RetryConfig,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }
}

impl HttpClientConfig {
    /// Validates the client configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::invalid("auth.http.timeout", "must be > 0"));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::invalid(
                "auth.http.connect_timeout",
                "must be > 0",
            ));
        }
        Ok(())
    }
}

/// Retry policy for outbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Number of retries after the first attempt.
    pub max_retries: u32,

    /// Delay before the first retry; doubles for each further retry.
    #[serde(with = "humantime_serde")]
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Routes the auth flow redirects between.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Page that starts a login (target after a rejected callback).
    pub login: String,

    /// Authenticated landing route (target after a successful callback).
    pub landing: String,

    /// Unauthenticated landing route (target of the auth gate).
    pub unauthenticated: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            login: "/start".to_string(),
            landing: "/usercontrol".to_string(),
            unauthenticated: "/unauth".to_string(),
        }
    }
}

impl RouteConfig {
    /// Validates the routes.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a route is not an absolute path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, route) in [
            ("auth.routes.login", &self.login),
            ("auth.routes.landing", &self.landing),
            ("auth.routes.unauthenticated", &self.unauthenticated),
        ] {
            if !route.starts_with('/') {
                return Err(ConfigError::invalid(key, "must start with '/'"));
            }
        }
        Ok(())
    }
}

fn parse_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::invalid(key, e.to_string()))
}

/// Errors produced by configuration validation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is absent.
    #[error("{0} is required")]
    Missing(&'static str),

    /// A setting has an invalid value.
    #[error("{key}: {message}")]
    Invalid {
        /// The offending key.
        key: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

impl ConfigError {
    /// Creates a new `Missing` error.
    #[must_use]
    pub fn missing(key: &'static str) -> Self {
        Self::Missing(key)
    }

    /// Creates a new `Invalid` error.
    #[must_use]
    pub fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}
