//! Backend API client.

use reqwest::{Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::error::UpstreamError;
use super::retry::RetryPolicy;
use crate::config::HttpClientConfig;
use crate::session::BearerToken;

/// Builds a `reqwest` client with the configured timeouts.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn build_http_client(config: &HttpClientConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(concat!("irec/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Client for the backend REST API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl BackendClient {
    /// Creates a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamError::InvalidUrl` if `base_url` cannot be a base,
    /// and `UpstreamError::Network` if the HTTP client cannot be built.
    pub fn new(base_url: &str, config: &HttpClientConfig) -> Result<Self, UpstreamError> {
        let base_url =
            Url::parse(base_url).map_err(|e| UpstreamError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::InvalidUrl(format!(
                "{base_url}: cannot be a base URL"
            )));
        }

        Ok(Self {
            http: build_http_client(config)?,
            base_url,
            retry: RetryPolicy::from_config(&config.retry),
        })
    }

    /// Base URL of the API.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the URL of `segments` under the base URL.
    ///
    /// Each segment is percent-encoded, so ids taken from the request path
    /// cannot escape their segment.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamError::InvalidUrl` if the base URL cannot take path segments.
    pub fn url(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| UpstreamError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET`s a JSON document.
    ///
    /// Transport failures and 5xx responses are retried per the retry policy.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamError` on network failure, non-2xx status, or an
    /// undecodable body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        token: &BearerToken,
        segments: &[&str],
    ) -> Result<T, UpstreamError> {
        let url = self.url(segments)?;
        let response = self.send(Method::GET, &url, token, None::<&()>, true).await?;

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Backend response is not the expected JSON");
            UpstreamError::Decode(e.to_string())
        })
    }

    /// `POST`s a URL-encoded form; the response body is discarded.
    ///
    /// Only transport failures are retried.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamError` on network failure or non-2xx status.
    pub async fn post_form<F: Serialize + ?Sized>(
        &self,
        token: &BearerToken,
        segments: &[&str],
        form: &F,
    ) -> Result<(), UpstreamError> {
        let url = self.url(segments)?;
        self.send(Method::POST, &url, token, Some(form), false)
            .await
            .map(drop)
    }

    async fn send<F: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &Url,
        token: &BearerToken,
        form: Option<&F>,
        idempotent: bool,
    ) -> Result<Response, UpstreamError> {
        let mut attempt = 0;
        loop {
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .bearer_auth(token.as_str());
            if let Some(form) = form {
                request = request.form(form);
            }

            tracing::debug!(method = %method, url = %url, attempt, "Calling backend");

            let failure = match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let retryable = idempotent && status.is_server_error();
                    let body = response.text().await.unwrap_or_default();
                    (UpstreamError::status(status.as_u16(), body), retryable)
                }
                Err(e) => {
                    let retryable = RetryPolicy::is_transport_failure(&e);
                    (UpstreamError::Network(e), retryable)
                }
            };

            match failure {
                (err, true) if self.retry.allows_retry(attempt) => {
                    tracing::warn!(method = %method, url = %url, error = %err, "Backend call failed, retrying");
                    self.retry.wait(attempt).await;
                    attempt += 1;
                }
                (err, _) => {
                    tracing::warn!(
                        method = %method,
                        url = %url,
                        status = ?err.status_code(),
                        error = %err,
                        "Backend call failed"
                    );
                    return Err(err);
                }
            }
        }
    }
}
