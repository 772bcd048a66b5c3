pub mod api;
pub mod config;
pub mod handlers;
pub mod observability;
pub mod server;
pub mod views;

pub use config::AppConfig;
pub use observability::init_tracing;
pub use server::{AppState, BuildError, IrecServer, ServerBuilder, build_app};
