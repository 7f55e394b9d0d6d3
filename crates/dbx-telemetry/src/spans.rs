//! Span creation helpers for catalog reads and ad-hoc queries

use crate::attributes::*;

/// Attributes for tracing a catalog read (overview, describe, search...)
#[derive(Debug, Clone)]
pub struct CatalogSpanAttributes {
    pub backend: String,
    pub operation: String,
    /// Table the operation targeted, empty for catalog-wide reads
    pub table: String,
    pub elapsed_ms: u64,
    pub outcome: String,
}

/// Attributes for tracing an ad-hoc query
#[derive(Debug, Clone)]
pub struct QuerySpanAttributes {
    pub backend: String,
    pub sql: String,
    pub row_count: Option<usize>,
    pub elapsed_ms: u64,
    pub outcome: String,
}

/// Record a span for one catalog operation.
pub fn trace_catalog_operation(attrs: CatalogSpanAttributes) {
    let span = tracing::info_span!(
        "catalog_operation",
        { DB_SYSTEM } = %attrs.backend,
        { DB_OPERATION_NAME } = %attrs.operation,
        { DB_COLLECTION_NAME } = %attrs.table,
        { DBX_ELAPSED_MS } = attrs.elapsed_ms,
        { DBX_OUTCOME } = %attrs.outcome,
    );

    let _guard = span.enter();
}

/// Record a span for an ad-hoc query, with the submitted text as
/// `db.query.text`. Rejected queries are recorded too, without a row count.
pub fn trace_query_execution(attrs: QuerySpanAttributes) {
    let span = tracing::info_span!(
        "execute_query",
        { DB_SYSTEM } = %attrs.backend,
        { DB_OPERATION_NAME } = "SELECT",
        { DB_QUERY_TEXT } = %attrs.sql,
        { DB_RESPONSE_ROWS } = tracing::field::Empty,
        { DBX_ELAPSED_MS } = attrs.elapsed_ms,
        { DBX_OUTCOME } = %attrs.outcome,
    );

    if let Some(rows) = attrs.row_count {
        span.record(DB_RESPONSE_ROWS, rows as u64);
    }

    let _guard = span.enter();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_span_attributes() {
        trace_catalog_operation(CatalogSpanAttributes {
            backend: "sqlite".to_string(),
            operation: "describe_table".to_string(),
            table: "faq".to_string(),
            elapsed_ms: 3,
            outcome: "ok".to_string(),
        });
    }

    #[test]
    fn test_query_span_attributes() {
        trace_query_execution(QuerySpanAttributes {
            backend: "postgres".to_string(),
            sql: "SELECT 1".to_string(),
            row_count: Some(1),
            elapsed_ms: 0,
            outcome: "ok".to_string(),
        });

        trace_query_execution(QuerySpanAttributes {
            backend: "postgres".to_string(),
            sql: "DROP TABLE faq".to_string(),
            row_count: None,
            elapsed_ms: 0,
            outcome: "forbidden".to_string(),
        });
    }
}
