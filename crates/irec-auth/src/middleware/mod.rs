//! Request interception: the auth gate and the extractor handlers use
//! behind it.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get, middleware::from_fn_with_state};
//! use irec_auth::middleware::{AuthGate, InterceptorChain, intercept};
//!
//! let chain = InterceptorChain::new().with(AuthGate::new(store.clone(), "/unauth"));
//!
//! let protected = Router::new()
//!     .route("/user", get(user))
//!     .route_layer(from_fn_with_state(chain, intercept));
//! ```

pub mod extractor;
pub mod gate;
pub mod interceptor;

pub use extractor::Authenticated;
pub use gate::AuthGate;
pub use interceptor::{Flow, Interceptor, InterceptorChain, intercept};
