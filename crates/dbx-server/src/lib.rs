//! HTTP server for the dbx database explorer

pub mod auth;
pub mod error;
pub mod rest;
pub mod types;

pub use auth::{AuthGate, BearerTokenGate, require_auth};
pub use error::AppError;
pub use rest::{AppState, create_router, serve};
pub use types::*;
