use dbx_catalog::{ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor, Row, TableDescriptor};
use serde::{Deserialize, Serialize};

/// Page size used when the request does not give one
pub const DEFAULT_PAGE_LIMIT: u64 = 50;

/// Largest page the HTTP layer hands out
pub const MAX_PAGE_LIMIT: u64 = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowsQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub term: String,
    #[serde(rename = "includeData", default)]
    pub include_data: bool,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunQueryRequest {
    pub sql: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunQueryResponse {
    pub data: Vec<Row>,
    #[serde(rename = "executionTime")]
    pub execution_time: u64,
    #[serde(rename = "rowCount")]
    pub row_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRowsResponse {
    pub data: Vec<Row>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStats {
    #[serde(rename = "rowCount")]
    pub row_count: u64,
    #[serde(rename = "columnCount")]
    pub column_count: usize,
    #[serde(rename = "indexCount")]
    pub index_count: usize,
    #[serde(rename = "foreignKeyCount")]
    pub foreign_key_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDetailsResponse {
    #[serde(rename = "tableName")]
    pub table_name: String,
    pub columns: Vec<ColumnDescriptor>,
    #[serde(rename = "foreignKeys")]
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
    pub indexes: Vec<IndexDescriptor>,
    pub stats: TableStats,
}

impl From<TableDescriptor> for TableDetailsResponse {
    fn from(table: TableDescriptor) -> Self {
        Self {
            stats: TableStats {
                row_count: table.row_count,
                column_count: table.columns.len(),
                index_count: table.indexes.len(),
                foreign_key_count: table.foreign_keys.len(),
            },
            table_name: table.name,
            columns: table.columns,
            foreign_keys: table.foreign_keys,
            indexes: table.indexes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
