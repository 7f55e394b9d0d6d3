//! Read-only relational database explorer
//!
//! Introspects the live catalog of a SQLite or PostgreSQL store and answers
//! questions about it: table structure, row pages, value distributions,
//! free-text search and validated ad-hoc SELECT queries.
//!
//! # Example
//!
//! ```rust,no_run
//! use dbx_catalog::DatabaseExplorer;
//! use dbx_core::DbxConfig;
//!
//! # async fn example() -> dbx_core::Result<()> {
//! let config = DbxConfig::test_defaults("sqlite://admin.db");
//! let explorer = DatabaseExplorer::from_config(&config)?;
//!
//! for table in explorer.list_tables().await? {
//!     let described = explorer.describe_table(&table).await?;
//!     println!("{}: {} rows", described.name, described.row_count);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod catalog;
pub mod connection;
pub mod dialect;
pub mod executor;
pub mod explorer;
pub mod pager;
pub mod postgres;
pub mod registry;
pub mod search;
pub mod sqlite;
pub mod types;
pub mod validator;

mod value;

#[cfg(test)]
mod test_support;

pub use analyzer::ColumnAnalyzer;
pub use catalog::{Catalog, CatalogReader, ColumnName, TableName};
pub use connection::{ConnectionProvider, DatabasePool};
pub use dialect::{Backend, Dialect, SqlParam, Statement};
pub use executor::QueryExecutor;
pub use explorer::DatabaseExplorer;
pub use pager::TablePager;
pub use postgres::PostgresDialect;
pub use registry::{DatabaseRegistry, OTHER_TABLES};
pub use search::SearchEngine;
pub use sqlite::SqliteDialect;
pub use types::*;
