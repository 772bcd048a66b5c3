use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use irec_auth::{AuthError, Authenticated, BackendClient};
use serde::Serialize;

use crate::api::{Position, Recommendation, RecommendationForm, RegistrationInput, User, UserForm};
use crate::views;

/// Route that sends the browser to the identity provider.
pub const LOGIN_ROUTE: &str = "/login";

/// Where every successful form post lands.
const POSITIONS_ROUTE: &str = "/positions";

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

pub async fn start() -> Html<String> {
    Html(views::start_page(LOGIN_ROUTE))
}

pub async fn unauth() -> Html<String> {
    Html(views::unauth_page(LOGIN_ROUTE))
}

// ---- Protected pages ----
//
// Every handler below sits behind the auth gate and gets its credential
// from the `Authenticated` extractor.

pub async fn user(auth: Authenticated) -> Html<String> {
    Html(views::user_page(auth.profile()))
}

/// Registered users go straight to the positions; new ones get the
/// registration form.
pub async fn user_control(
    auth: Authenticated,
    State(api): State<BackendClient>,
) -> Result<Response, AuthError> {
    let user_id = auth.profile().user_id.as_str();
    let user: User = api
        .get_json(auth.token(), &["users", "single", user_id])
        .await?;

    if user.is_registered() {
        return Ok(Redirect::to(POSITIONS_ROUTE).into_response());
    }
    tracing::info!("Backend has no user record, showing registration");
    Ok(Html(views::registration_page(auth.profile())).into_response())
}

pub async fn user_update(
    auth: Authenticated,
    State(api): State<BackendClient>,
    Path(id): Path<String>,
    Form(input): Form<RegistrationInput>,
) -> Result<Redirect, AuthError> {
    if id != auth.profile().user_id {
        // Only the signed-in user can be registered from this session.
        tracing::warn!(path_id = %id, "Registration path does not name the signed-in user");
    }
    let form = UserForm::new(input, auth.profile());
    api.post_form(auth.token(), &["users"], &form).await?;
    Ok(Redirect::to(POSITIONS_ROUTE))
}

pub async fn positions(
    auth: Authenticated,
    State(api): State<BackendClient>,
) -> Result<Html<String>, AuthError> {
    // The backend answers `null` when there are no positions.
    let positions: Vec<Position> = api
        .get_json::<Option<Vec<Position>>>(auth.token(), &["positions"])
        .await?
        .unwrap_or_default();
    tracing::debug!(count = positions.len(), "Loaded positions");
    Ok(Html(views::positions_page(auth.profile(), &positions)))
}

pub async fn position(
    auth: Authenticated,
    State(api): State<BackendClient>,
    Path(id): Path<String>,
) -> Result<Html<String>, AuthError> {
    let position: Position = api
        .get_json(auth.token(), &["positions", "single", &id])
        .await?;
    Ok(Html(views::position_page(auth.profile(), &position)))
}

pub async fn recommend(
    auth: Authenticated,
    State(api): State<BackendClient>,
    Path(id): Path<String>,
    Form(form): Form<RecommendationForm>,
) -> Result<Redirect, AuthError> {
    api.post_form(auth.token(), &["recommendations", "position", &id], &form)
        .await?;
    tracing::info!(position = %id, "Recommendation submitted");
    Ok(Redirect::to(POSITIONS_ROUTE))
}

pub async fn recommendations(
    auth: Authenticated,
    State(api): State<BackendClient>,
    Path(id): Path<String>,
) -> Result<Html<String>, AuthError> {
    let recommendations: Vec<Recommendation> = api
        .get_json::<Option<Vec<Recommendation>>>(
            auth.token(),
            &["recommendations", "all", "position", &id],
        )
        .await?
        .unwrap_or_default();
    Ok(Html(views::recommendations_page(auth.profile(), &recommendations)))
}
