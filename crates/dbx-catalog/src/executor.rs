//! Ad-hoc read query execution
//!
//! No row limit is added to the submitted text. Callers that need a bounded
//! result must include their own `LIMIT`; a silently truncated result would
//! look complete when it is not.

use crate::connection::ConnectionProvider;
use crate::types::QueryResult;
use crate::validator;
use dbx_core::{Error, Result};
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct QueryExecutor {
    provider: Arc<ConnectionProvider>,
}

impl QueryExecutor {
    pub fn new(provider: Arc<ConnectionProvider>) -> Self {
        Self { provider }
    }

    /// Validate and run caller-supplied SELECT text
    pub async fn execute(&self, sql: &str) -> Result<QueryResult> {
        if let Err(rejection) = validator::validate(sql) {
            tracing::warn!(reason = %rejection, "Rejected ad-hoc query");
            return Err(Error::ForbiddenQuery(rejection));
        }

        let started = Instant::now();
        let rows = self.provider.run(sql, &[]).await?;
        let execution_time_millis =
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::info!(
            rows = rows.len(),
            elapsed_ms = execution_time_millis,
            "Executed ad-hoc query"
        );

        Ok(QueryResult {
            row_count: rows.len(),
            rows,
            execution_time_millis,
        })
    }
}
