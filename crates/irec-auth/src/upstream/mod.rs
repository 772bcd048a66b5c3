//! Token propagation: calls to the backend API on behalf of the user.
//!
//! Every call carries exactly one `Authorization: Bearer <id_token>` header,
//! taken from a [`BearerToken`](crate::session::BearerToken) that can only
//! be obtained from an authenticated session.

mod client;
mod error;
mod retry;

pub use client::{BackendClient, build_http_client};
pub use error::UpstreamError;
pub use retry::RetryPolicy;
