use std::net::SocketAddr;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    middleware,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use irec_auth::config::RouteConfig;
use irec_auth::http::{callback_get, callback_post, login};
use irec_auth::middleware::intercept;
use irec_auth::{
    AuthError, AuthGate, BackendClient, ExchangeState, IdpClient, InterceptorChain, SessionStore,
    UpstreamError,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{config::AppConfig, config::ServerConfig, handlers};

/// Errors that stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("backend API client: {0}")]
    Upstream(#[from] UpstreamError),
}

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: SessionStore,
    pub exchange: ExchangeState,
    pub api: BackendClient,
    pub routes: RouteConfig,
}

impl AppState {
    /// Establishes the session store and the outbound clients.
    pub fn from_config(cfg: &AppConfig) -> Result<Self, BuildError> {
        let store = SessionStore::init(&cfg.auth.session)?;
        let idp = IdpClient::new(&cfg.auth.provider, &cfg.auth.http)?;
        let api = BackendClient::new(&cfg.api.base_url, &cfg.auth.http)?;
        let routes = cfg.auth.routes.clone();

        Ok(Self {
            exchange: ExchangeState::new(store.clone(), idp, routes.clone()),
            store,
            api,
            routes,
        })
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for ExchangeState {
    fn from_ref(state: &AppState) -> Self {
        state.exchange.clone()
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.store.key()
    }
}

impl FromRef<AppState> for BackendClient {
    fn from_ref(state: &AppState) -> Self {
        state.api.clone()
    }
}

pub fn build_app(state: AppState, cfg: &ServerConfig) -> Router {
    let gate = InterceptorChain::new().with(AuthGate::new(
        state.store.clone(),
        state.routes.unauthenticated.clone(),
    ));

    let protected = Router::new()
        .route("/user", get(handlers::user))
        .route("/usercontrol", get(handlers::user_control))
        .route("/user/single/{id}", post(handlers::user_update))
        .route("/positions", get(handlers::positions))
        .route("/positions/single/{id}", get(handlers::position))
        .route("/recommendation/{id}", post(handlers::recommend))
        .route("/recommendations/positions/{id}", get(handlers::recommendations))
        // Gate runs before the handler; unmatched paths never reach it
        .route_layer(middleware::from_fn_with_state(gate, intercept));

    Router::new()
        .route("/", get(handlers::start))
        .route("/start", get(handlers::start))
        .route("/login", get(login))
        .route("/callback", get(callback_get).post(callback_post))
        .route("/unauth", get(handlers::unauth))
        .route("/healthz", get(handlers::healthz))
        .merge(protected)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri().path(),
                        http.status_code = Empty,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        span.record("http.status_code", tracing::field::display(res.status().as_u16()));
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(TimeoutLayer::new(cfg.request_timeout))
        .layer(DefaultBodyLimit::max(cfg.body_limit_bytes))
}

pub struct IrecServer {
    addr: SocketAddr,
    app: Router,
    store: SessionStore,
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> Result<IrecServer, BuildError> {
        let state = AppState::from_config(&self.config)?;
        let store = state.store.clone();
        let app = build_app(state, &self.config.server);

        Ok(IrecServer {
            addr: self.addr,
            app,
            store,
        })
    }
}

impl IrecServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        let sweeper = self.store.spawn_sweeper();
        tracing::info!("listening on {}", self.addr);

        let served = axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        self.store.shutdown();
        if let Err(e) = sweeper.await {
            tracing::warn!(error = %e, "Session sweeper did not stop cleanly");
        }
        served?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
