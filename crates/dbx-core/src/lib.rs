//! Core types for dbx
//!
//! Shared error type and configuration for the database explorer crates.

pub mod config;
pub mod error;

// Re-exports
pub use config::{
    AuthConfig, CatalogConfig, DatabaseConfig, DbxConfig, ObservabilityConfig, ServerConfig,
};
pub use error::{Error, QueryRejection, Result};
