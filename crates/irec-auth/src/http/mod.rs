//! HTTP surface of the auth flow: login and callback handlers, error
//! responses and shared HTML templates.

pub mod callback;
pub mod error;
pub mod templates;

pub use callback::{AuthorizationState, ExchangeState, callback_get, callback_post, login};
