mod common;

use common::{SUBJECT, location, session_cookie, spawn_app};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn backend_unavailable_is_server_error_and_session_survives() {
    let app = spawn_app().await;
    let (cookie, id_token) = app.login().await;

    // One attempt plus one retry
    Mock::given(method("GET"))
        .and(path("/positions"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&app.api)
        .await;

    let resp = app.get("/positions", Some(&cookie)).await;
    assert_eq!(resp.status(), 500);
    assert!(session_cookie(&resp).is_none());

    // Same session, same token afterwards
    Mock::given(method("GET"))
        .and(path("/positions/single/p1"))
        .and(header("authorization", format!("Bearer {id_token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"title": "T"})))
        .expect(1)
        .mount(&app.api)
        .await;

    let resp = app.get("/positions/single/p1", Some(&cookie)).await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn null_backend_lists_render_as_empty() {
    let app = spawn_app().await;
    let (cookie, _id_token) = app.login().await;

    Mock::given(method("GET"))
        .and(path("/positions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .expect(1)
        .mount(&app.api)
        .await;
    Mock::given(method("GET"))
        .and(path("/recommendations/all/position/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .expect(1)
        .mount(&app.api)
        .await;

    let resp = app.get("/positions", Some(&cookie)).await;
    assert_eq!(resp.status(), 200);

    let resp = app.get("/recommendations/positions/p1", Some(&cookie)).await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn backend_client_error_is_not_retried() {
    let app = spawn_app().await;
    let (cookie, _id_token) = app.login().await;

    Mock::given(method("GET"))
        .and(path("/recommendations/all/position/p1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&app.api)
        .await;

    let resp = app.get("/recommendations/positions/p1", Some(&cookie)).await;
    assert_eq!(resp.status(), 500);
}

#[tokio::test]
async fn undecodable_backend_body_is_server_error() {
    let app = spawn_app().await;
    let (cookie, _id_token) = app.login().await;

    Mock::given(method("GET"))
        .and(path("/positions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&app.api)
        .await;

    let resp = app.get("/positions", Some(&cookie)).await;
    assert_eq!(resp.status(), 500);
}

#[tokio::test]
async fn usercontrol_shows_registration_for_unknown_user() {
    let app = spawn_app().await;
    let (cookie, _id_token) = app.login().await;

    Mock::given(method("GET"))
        .and(path(format!("/users/single/{SUBJECT}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"iduser": ""})))
        .expect(1)
        .mount(&app.api)
        .await;

    let resp = app.get("/usercontrol", Some(&cookie)).await;
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Complete your registration"));
    assert!(body.contains("value=\"Alice\""));
}

#[tokio::test]
async fn usercontrol_redirects_registered_user() {
    let app = spawn_app().await;
    let (cookie, _id_token) = app.login().await;

    Mock::given(method("GET"))
        .and(path(format!("/users/single/{SUBJECT}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "iduser": SUBJECT,
            "name": "Alice",
        })))
        .mount(&app.api)
        .await;

    let resp = app.get("/usercontrol", Some(&cookie)).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/positions");
}

#[tokio::test]
async fn registration_posts_user_form() {
    let app = spawn_app().await;
    let (cookie, id_token) = app.login().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("authorization", format!("Bearer {id_token}").as_str()))
        .and(body_string_contains("UserType=1"))
        .and(body_string_contains("Name=Alice"))
        .and(body_string_contains("Telephone=555"))
        .and(body_string_contains("Picture=https%3A%2F%2Fimg.example.com%2Falice.png"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&app.api)
        .await;

    let resp = app
        .post_form(
            "/user/single/me",
            Some(&cookie),
            &[("Name", "Alice"), ("Telephone", "555"), ("Mail", "alice@example.com")],
        )
        .await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/positions");

    let requests = app.api.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body).to_string();
    assert!(body.contains("IdUser=linkedin-alice"), "{body}");
}

#[tokio::test]
async fn recommendation_posts_referral_form() {
    let app = spawn_app().await;
    let (cookie, _id_token) = app.login().await;

    Mock::given(method("POST"))
        .and(path("/recommendations/position/p1"))
        .and(body_string_contains("Name=Bob"))
        .and(body_string_contains("Mail=bob%40example.com"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.api)
        .await;

    let resp = app
        .post_form(
            "/recommendation/p1",
            Some(&cookie),
            &[("name", "Bob"), ("telephone", "1"), ("mail", "bob@example.com")],
        )
        .await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/positions");
}

#[tokio::test]
async fn failed_post_is_not_retried() {
    let app = spawn_app().await;
    let (cookie, _id_token) = app.login().await;

    Mock::given(method("POST"))
        .and(path("/recommendations/position/p1"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&app.api)
        .await;

    let resp = app
        .post_form("/recommendation/p1", Some(&cookie), &[("Name", "Bob")])
        .await;
    assert_eq!(resp.status(), 500);
}
