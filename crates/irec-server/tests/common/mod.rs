#![allow(dead_code)]

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use irec_server::{AppConfig, AppState, build_app};
use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use serde_json::json;
use tokio::task::JoinHandle;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CLIENT_ID: &str = "irec-front";
pub const COOKIE_NAME: &str = "auth-session";
pub const SUBJECT: &str = "linkedin-alice";

/// The front end running on an ephemeral port, with the identity provider
/// and backend API mocked.
pub struct TestApp {
    pub base: String,
    pub idp: MockServer,
    pub api: MockServer,
    pub client: reqwest::Client,
    pub state: AppState,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

pub fn test_config(idp: &str, api: &str) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.api.base_url = api.to_string();
    cfg.auth.provider.issuer = idp.to_string();
    cfg.auth.provider.client_id = CLIENT_ID.to_string();
    cfg.auth.provider.client_secret = Some("client-secret".to_string());
    cfg.auth.session.secret = Some("integration-secret-0123456789-abcdefghij".to_string());
    cfg.auth.http.retry.backoff = Duration::from_millis(1);
    cfg
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(customize: impl FnOnce(&mut AppConfig)) -> TestApp {
    let idp = MockServer::start().await;
    let api = MockServer::start().await;
    let mut cfg = test_config(&idp.uri(), &api.uri());
    customize(&mut cfg);
    cfg.validate().expect("valid test config");

    let state = AppState::from_config(&cfg).expect("app state");
    let app = build_app(state.clone(), &cfg.server);

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        base: format!("http://{addr}"),
        idp,
        api,
        client,
        state,
        shutdown: Some(tx),
        handle: Some(handle),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(self.url(path));
        if let Some(cookie) = cookie {
            req = req.header(COOKIE, cookie);
        }
        req.send().await.unwrap()
    }

    pub async fn post_form(
        &self,
        path: &str,
        cookie: Option<&str>,
        form: &[(&str, &str)],
    ) -> reqwest::Response {
        let mut req = self.client.post(self.url(path)).form(form);
        if let Some(cookie) = cookie {
            req = req.header(COOKIE, cookie);
        }
        req.send().await.unwrap()
    }

    /// Starts a login; returns the session cookie and the authorization URL.
    pub async fn begin_login(&self) -> (String, Url) {
        let resp = self.get("/login", None).await;
        assert_eq!(resp.status(), 303);
        let cookie = session_cookie(&resp).expect("login sets the session cookie");
        let authorize = Url::parse(&location(&resp)).unwrap();
        (cookie, authorize)
    }

    /// Mocks one successful token exchange returning `id_token`.
    pub async fn mount_token_response(&self, id_token: &str) {
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-1",
                "token_type": "Bearer",
                "expires_in": 3600,
                "id_token": id_token,
            })))
            .up_to_n_times(1)
            .mount(&self.idp)
            .await;
    }

    /// Runs the whole login; returns the session cookie and the ID token.
    pub async fn login(&self) -> (String, String) {
        let (cookie, authorize) = self.begin_login().await;
        let state = query_param(&authorize, "state");
        let nonce = query_param(&authorize, "nonce");
        let id_token = id_token(&self.idp.uri(), &nonce, "Alice");
        self.mount_token_response(&id_token).await;

        let resp = self
            .get(&format!("/callback?code=abc&state={state}"), Some(&cookie))
            .await;
        assert_eq!(resp.status(), 303);
        assert_eq!(location(&resp), "/usercontrol");
        let cookie = session_cookie(&resp).expect("callback sets the session cookie");
        (cookie, id_token)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.state.store.shutdown();
    }
}

/// An unsigned ID token for `SUBJECT`.
pub fn id_token(issuer: &str, nonce: &str, name: &str) -> String {
    unsigned_token(&json!({
        "iss": issuer,
        "sub": SUBJECT,
        "aud": CLIENT_ID,
        "nonce": nonce,
        "name": name,
        "picture": "https://img.example.com/alice.png",
        "exp": 4_102_444_800_i64,
    }))
}

/// An ID token carrying `claims` with a placeholder signature.
pub fn unsigned_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// `name=value` of the session cookie set by `resp`, if any.
pub fn session_cookie(resp: &reqwest::Response) -> Option<String> {
    resp.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{COOKIE_NAME}=")))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(resp: &reqwest::Response) -> String {
    resp.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn query_param(url: &Url, name: &str) -> String {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}
