//! HTML error responses for [`AuthError`].

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};

use super::templates::render_error_page;
use crate::config::RouteConfig;
use crate::error::AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            tracing::error!(category = %self.category(), error = %self, "Request failed");
        } else {
            tracing::info!(category = %self.category(), error = %self, "Request rejected");
        }

        // Without the configured routes at hand, a rejected login restarts
        // from the default login page.
        if matches!(self, AuthError::StateMismatch { .. }) {
            return Redirect::to(&RouteConfig::default().login).into_response();
        }

        let (status, title, description) = error_details(&self);
        (status, Html(render_error_page(title, description, None))).into_response()
    }
}

/// Extracts (HTTP status, title, user-facing description) from an `AuthError`.
///
/// Descriptions are fixed strings; provider and backend messages are logged,
/// never rendered.
fn error_details(error: &AuthError) -> (StatusCode, &'static str, &'static str) {
    match error {
        AuthError::Session(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Session unavailable",
            "Your session could not be read. Clear your cookies and sign in again.",
        ),
        AuthError::StateMismatch { .. } => (
            StatusCode::SEE_OTHER,
            "Login could not be verified",
            "This login attempt is stale or was not started here. Please sign in again.",
        ),
        AuthError::Exchange(_) => (
            StatusCode::BAD_GATEWAY,
            "Sign-in failed",
            "The identity provider did not complete the sign-in.",
        ),
        AuthError::Upstream(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Service unavailable",
            "The request could not be completed. Please try again later.",
        ),
        AuthError::MissingCredential | AuthError::Configuration { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal error",
            "The request could not be completed.",
        ),
    }
}
