mod common;

use common::{location, query_param, session_cookie, spawn_app};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn login_redirects_to_provider_with_pkce_and_nonce() {
    let app = spawn_app().await;
    let (_cookie, authorize) = app.begin_login().await;

    assert_eq!(authorize.path(), "/authorize");
    assert_eq!(query_param(&authorize, "response_type"), "code");
    assert_eq!(query_param(&authorize, "client_id"), common::CLIENT_ID);
    assert_eq!(query_param(&authorize, "code_challenge_method"), "S256");
    assert!(!query_param(&authorize, "state").is_empty());
    assert!(!query_param(&authorize, "nonce").is_empty());
    assert!(!query_param(&authorize, "code_challenge").is_empty());
}

#[tokio::test]
async fn successful_callback_writes_session_and_redirects_to_landing() {
    let app = spawn_app().await;
    let (cookie, authorize) = app.begin_login().await;
    let state = query_param(&authorize, "state");
    let nonce = query_param(&authorize, "nonce");
    let id_token = common::id_token(&app.idp.uri(), &nonce, "Alice");

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "access-1",
            "id_token": id_token,
            "expires_in": 3600,
        })))
        .expect(1)
        .mount(&app.idp)
        .await;

    let resp = app
        .get(&format!("/callback?code=abc&state={state}"), Some(&cookie))
        .await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/usercontrol");

    // The session id is rotated on sign-in
    let signed_in = session_cookie(&resp).expect("session cookie");
    assert_ne!(signed_in, cookie);

    // The stored token is what protected routes send to the backend
    Mock::given(method("GET"))
        .and(path("/positions"))
        .and(header("authorization", format!("Bearer {id_token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&app.api)
        .await;

    let resp = app.get("/positions", Some(&signed_in)).await;
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Alice"));

    // The pre-login cookie no longer names a session
    let resp = app.get("/user", Some(&cookie)).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/unauth");
}

#[tokio::test]
async fn callback_accepts_form_post() {
    let app = spawn_app().await;
    let (cookie, authorize) = app.begin_login().await;
    let state = query_param(&authorize, "state");
    let nonce = query_param(&authorize, "nonce");
    app.mount_token_response(&common::id_token(&app.idp.uri(), &nonce, "Alice"))
        .await;

    let resp = app
        .post_form("/callback", Some(&cookie), &[("code", "abc"), ("state", &state)])
        .await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/usercontrol");
}

#[tokio::test]
async fn state_mismatch_rejects_without_writing_session() {
    let app = spawn_app().await;
    let (cookie, _authorize) = app.begin_login().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.idp)
        .await;

    let resp = app
        .get("/callback?code=abc&state=WRONG", Some(&cookie))
        .await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/start");
    assert!(session_cookie(&resp).is_none());

    let resp = app.get("/user", Some(&cookie)).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/unauth");
}

#[tokio::test]
async fn callback_without_login_in_progress_restarts_login() {
    let app = spawn_app().await;

    let resp = app.get("/callback?code=abc&state=S1", None).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/start");
    assert!(session_cookie(&resp).is_none());
}

#[tokio::test]
async fn callback_with_empty_state_is_rejected() {
    let app = spawn_app().await;
    let (cookie, _authorize) = app.begin_login().await;

    let resp = app.get("/callback?code=abc&state=", Some(&cookie)).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/start");
}

#[tokio::test]
async fn failed_exchange_renders_error_and_leaves_session_unauthenticated() {
    let app = spawn_app().await;
    let (cookie, authorize) = app.begin_login().await;
    let state = query_param(&authorize, "state");

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&app.idp)
        .await;

    let resp = app
        .get(&format!("/callback?code=abc&state={state}"), Some(&cookie))
        .await;
    assert_eq!(resp.status(), 502);
    assert!(session_cookie(&resp).is_none());
    let body = resp.text().await.unwrap();
    assert!(body.contains("Sign-in failed"));
    assert!(body.contains("href=\"/start\""));

    let resp = app.get("/user", Some(&cookie)).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/unauth");
}

#[tokio::test]
async fn nonce_mismatch_is_an_exchange_failure() {
    let app = spawn_app().await;
    let (cookie, authorize) = app.begin_login().await;
    let state = query_param(&authorize, "state");
    app.mount_token_response(&common::id_token(&app.idp.uri(), "other-nonce", "Alice"))
        .await;

    let resp = app
        .get(&format!("/callback?code=abc&state={state}"), Some(&cookie))
        .await;
    assert_eq!(resp.status(), 502);
    assert!(session_cookie(&resp).is_none());
}

#[tokio::test]
async fn id_token_without_subject_is_an_exchange_failure() {
    let app = spawn_app().await;
    let (cookie, authorize) = app.begin_login().await;
    let state = query_param(&authorize, "state");
    let nonce = query_param(&authorize, "nonce");
    app.mount_token_response(&common::unsigned_token(&serde_json::json!({
        "iss": app.idp.uri(),
        "sub": "",
        "aud": common::CLIENT_ID,
        "nonce": nonce,
        "exp": 4_102_444_800_i64,
    })))
    .await;

    let resp = app
        .get(&format!("/callback?code=abc&state={state}"), Some(&cookie))
        .await;
    assert_eq!(resp.status(), 502);
    assert!(session_cookie(&resp).is_none());
    let body = resp.text().await.unwrap();
    assert!(body.contains("href=\"/start\""));
}

#[tokio::test]
async fn expired_id_token_is_an_exchange_failure() {
    let app = spawn_app().await;
    let (cookie, authorize) = app.begin_login().await;
    let state = query_param(&authorize, "state");
    let nonce = query_param(&authorize, "nonce");
    app.mount_token_response(&common::unsigned_token(&serde_json::json!({
        "iss": app.idp.uri(),
        "sub": common::SUBJECT,
        "aud": common::CLIENT_ID,
        "nonce": nonce,
        "exp": 1_000_000_000_i64,
    })))
    .await;

    let resp = app
        .get(&format!("/callback?code=abc&state={state}"), Some(&cookie))
        .await;
    assert_eq!(resp.status(), 502);
    assert!(session_cookie(&resp).is_none());
}

#[tokio::test]
async fn provider_error_is_rendered() {
    let app = spawn_app().await;
    let (cookie, authorize) = app.begin_login().await;
    let state = query_param(&authorize, "state");

    let resp = app
        .get(
            &format!("/callback?error=access_denied&error_description=denied&state={state}"),
            Some(&cookie),
        )
        .await;
    assert_eq!(resp.status(), 502);
    assert!(session_cookie(&resp).is_none());
}

#[tokio::test]
async fn undecodable_cookie_is_replaced_at_login() {
    let app = spawn_app().await;
    let tampered = format!("{}=not-a-session", common::COOKIE_NAME);

    let resp = app.get("/login", Some(&tampered)).await;
    assert_eq!(resp.status(), 303);
    let fresh = session_cookie(&resp).expect("fresh session cookie");
    assert_ne!(fresh, tampered);
}
