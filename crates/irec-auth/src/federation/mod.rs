//! Identity exchange with the external OIDC provider.

pub mod claims;
pub mod client;
pub mod error;

pub use claims::IdTokenClaims;
pub use client::{IdpClient, TokenResponse};
pub use error::IdpError;
