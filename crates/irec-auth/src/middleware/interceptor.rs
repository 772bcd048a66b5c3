//! Ordered request interceptors run before a terminal handler.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

/// Outcome of one interceptor.
#[derive(Debug)]
pub enum Flow {
    /// Hand the request to the next interceptor (or the handler).
    Continue,
    /// Stop here and send this response.
    Respond(Response),
}

/// A component that inspects a request and either lets it continue or
/// short-circuits it with a response.
///
/// Interceptors only see the request head; they never consume the body.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Inspects the request.
    async fn intercept(&self, parts: &Parts) -> Flow;
}

/// An explicit, ordered list of interceptors.
///
/// The first interceptor that responds wins; later ones and the handler
/// never run.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interceptor.
    #[must_use]
    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Number of interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Returns `true` if the chain has no interceptors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Runs the interceptors in order.
    pub async fn run(&self, parts: &Parts) -> Flow {
        for interceptor in &self.interceptors {
            if let Flow::Respond(response) = interceptor.intercept(parts).await {
                tracing::debug!(
                    interceptor = interceptor.name(),
                    path = %parts.uri.path(),
                    status = %response.status(),
                    "Request short-circuited"
                );
                return Flow::Respond(response);
            }
        }
        Flow::Continue
    }
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.interceptors.iter().map(|i| i.name()))
            .finish()
    }
}

/// Axum middleware running an [`InterceptorChain`].
///
/// # Example
///
/// ```ignore
/// let chain = InterceptorChain::new().with(AuthGate::new(store, "/unauth"));
/// let protected = Router::new()
///     .route("/positions", get(positions))
///     .route_layer(axum::middleware::from_fn_with_state(chain, intercept));
/// ```
pub async fn intercept(
    State(chain): State<InterceptorChain>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    match chain.run(&parts).await {
        Flow::Continue => next.run(Request::from_parts(parts, body)).await,
        Flow::Respond(response) => response,
    }
}
