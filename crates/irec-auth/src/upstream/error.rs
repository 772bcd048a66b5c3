//! Backend call errors.

/// Errors from a backend API call.
///
/// None of these mutate the session; all surface as a 500 to the browser.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The backend could not be reached or the request timed out.
    #[error("Backend unreachable: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("Backend returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("Backend response could not be decoded: {0}")]
    Decode(String),

    /// The request URL could not be built.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

/// Longest response body kept in a `Status` error.
const MAX_BODY_IN_ERROR: usize = 512;

impl UpstreamError {
    /// Creates a new `Status` error.
    #[must_use]
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        let mut body = body.into();
        if body.len() > MAX_BODY_IN_ERROR {
            let mut cut = MAX_BODY_IN_ERROR;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Self::Status { status, body }
    }

    /// HTTP status returned by the backend, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error() {
        let err = UpstreamError::status(503, "unavailable");
        assert_eq!(err.to_string(), "Backend returned HTTP 503: unavailable");
        assert_eq!(err.status_code(), Some(503));
        assert_eq!(UpstreamError::Decode("x".into()).status_code(), None);
    }

    #[test]
    fn test_status_body_truncated() {
        let err = UpstreamError::status(500, "é".repeat(400));
        let UpstreamError::Status { body, .. } = err else {
            panic!("expected status error");
        };
        assert!(body.len() <= MAX_BODY_IN_ERROR);
    }
}
