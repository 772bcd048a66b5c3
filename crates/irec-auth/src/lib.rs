//! # irec-auth
//!
//! Authentication session lifecycle for the irec web front end.
//!
//! This crate provides:
//! - A server-side session store with signed session cookies
//! - The OAuth 2.0 / OIDC authorization-code exchange (with PKCE and nonce)
//! - An auth gate protecting routes behind an explicit interceptor chain
//! - Bearer token propagation to the backend REST API
//!
//! ## Overview
//!
//! ```text
//! browser -> login/callback -> SessionStore (write)
//!         -> protected route -> AuthGate (read) -> handler -> BackendClient -> API
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Provider, session, HTTP client and route settings
//! - [`session`] - Session types, signed cookie handling, backends and the store
//! - [`oauth`] - PKCE, `state` and `nonce` generation
//! - [`federation`] - Identity provider client and ID token claims
//! - [`middleware`] - Interceptor chain, auth gate and `Authenticated` extractor
//! - [`upstream`] - Backend API client with bearer propagation and retry
//! - [`http`] - Login and callback handlers, HTML error pages

pub mod config;
pub mod error;
pub mod federation;
pub mod http;
pub mod middleware;
pub mod oauth;
pub mod session;
pub mod upstream;

pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, ErrorCategory};
pub use federation::{IdpClient, IdpError};
pub use http::{AuthorizationState, ExchangeState};
pub use middleware::{AuthGate, Authenticated, Flow, Interceptor, InterceptorChain};
pub use session::{BearerToken, Profile, Session, SessionError, SessionStore};
pub use upstream::{BackendClient, UpstreamError};

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;
