//! Lazily initialised connection to the relational store

use crate::dialect::{Backend, Dialect, SqlParam, Statement};
use crate::postgres::{self, PostgresDialect};
use crate::sqlite::{self, SqliteDialect};
use crate::types::Row;
use dbx_core::{DatabaseConfig, Error, Result};
use sqlx::{PgPool, SqlitePool};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::OnceCell;

/// Engine-specific pool behind the provider
#[derive(Debug, Clone)]
pub enum DatabasePool {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

impl DatabasePool {
    async fn fetch_all(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Row>> {
        let rows = match self {
            DatabasePool::Sqlite(pool) => sqlite::fetch_rows(pool, sql, params).await,
            DatabasePool::Postgres(pool) => postgres::fetch_rows(pool, sql, params).await,
        };
        rows.map_err(Error::execution)
    }
}

/// Hands out the single shared pool for the process.
///
/// The pool is created on first use. A failed attempt is remembered and
/// reported to every later caller; the provider never reconnects.
pub struct ConnectionProvider {
    config: DatabaseConfig,
    dialect: Arc<dyn Dialect>,
    pool: OnceCell<std::result::Result<DatabasePool, String>>,
    statements: AtomicU64,
}

impl ConnectionProvider {
    /// Create a provider for the configured URL without connecting
    pub fn new(config: DatabaseConfig) -> Result<Self> {
        let dialect: Arc<dyn Dialect> = match Backend::from_url(&config.url) {
            Some(Backend::Sqlite) => Arc::new(SqliteDialect),
            Some(Backend::Postgres) => Arc::new(PostgresDialect::new(config.schema.clone())),
            None => {
                return Err(Error::Connection(format!(
                    "unsupported database url scheme: {}",
                    redact(&config.url)
                )));
            }
        };

        Ok(Self {
            config,
            dialect,
            pool: OnceCell::new(),
            statements: AtomicU64::new(0),
        })
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn backend(&self) -> Backend {
        self.dialect.backend()
    }

    /// Get the shared pool, connecting on the first call
    pub async fn get_connection(&self) -> Result<&DatabasePool> {
        let outcome = self
            .pool
            .get_or_init(|| async {
                tracing::info!(
                    backend = self.backend().name(),
                    url = %redact(&self.config.url),
                    "Connecting to database"
                );

                let pool = match self.backend() {
                    Backend::Sqlite => sqlite::connect(&self.config)
                        .await
                        .map(DatabasePool::Sqlite),
                    Backend::Postgres => postgres::connect(&self.config)
                        .await
                        .map(DatabasePool::Postgres),
                };

                pool.map_err(|e| {
                    tracing::error!(error = %e, "Database connection failed");
                    format!("Failed to connect to {}: {}", self.backend().name(), e)
                })
            })
            .await;

        outcome.as_ref().map_err(|msg| Error::Connection(msg.clone()))
    }

    /// Run one statement with positional parameters
    pub async fn run(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Row>> {
        let pool = self.get_connection().await?;
        self.statements.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(sql = %sql.trim(), params = params.len(), "Running statement");

        pool.fetch_all(sql, params).await
    }

    pub async fn run_statement(&self, statement: &Statement) -> Result<Vec<Row>> {
        self.run(&statement.sql, &statement.params).await
    }

    /// True once a connection attempt has succeeded
    pub fn is_connected(&self) -> bool {
        matches!(self.pool.get(), Some(Ok(_)))
    }

    /// Number of statements sent to the engine so far
    pub fn statements_issued(&self) -> u64 {
        self.statements.load(Ordering::Relaxed)
    }
}

/// Strip credentials from a URL before logging it
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
