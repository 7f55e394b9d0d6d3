//! # dbx Telemetry
//!
//! Structured logging and OpenTelemetry tracing for the database explorer.
//!
//! Catalog reads and ad-hoc queries are recorded as spans carrying the
//! `db.*` attributes from the OpenTelemetry database semantic conventions.

mod spans;
mod tracer;

pub use spans::{
    CatalogSpanAttributes, QuerySpanAttributes, trace_catalog_operation, trace_query_execution,
};
pub use tracer::{init_telemetry, register_span_processor, tracer_provider};

/// OpenTelemetry span attribute constants for database observability.
pub mod attributes {
    // Database semantic conventions
    pub const DB_SYSTEM: &str = "db.system";
    pub const DB_OPERATION_NAME: &str = "db.operation.name";
    pub const DB_COLLECTION_NAME: &str = "db.collection.name";
    pub const DB_QUERY_TEXT: &str = "db.query.text";
    pub const DB_RESPONSE_ROWS: &str = "db.response.returned_rows";

    // Explorer-specific attributes
    pub const DBX_ELAPSED_MS: &str = "dbx.elapsed_ms";
    pub const DBX_OUTCOME: &str = "dbx.outcome";

    pub const SYSTEM_NAME: &str = "dbx";
}
