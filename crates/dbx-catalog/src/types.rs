//! Read-only projections of the live catalog

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One result row, keyed by column name
pub type Row = serde_json::Map<String, Value>;

/// Information about a table column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub name: String,
    /// Engine-native type string, as declared
    pub data_type: String,
    pub nullable: bool,
    pub default_value: Option<String>,
    /// As reported by the engine. Not cross-checked against `nullable`.
    pub is_primary_key: bool,
    pub extra: String,
}

impl ColumnDescriptor {
    /// Whether the declared type looks like it stores text
    pub fn is_textual(&self) -> bool {
        let data_type = self.data_type.to_lowercase();
        data_type.contains("text") || data_type.contains("varchar") || data_type.contains("char")
    }
}

/// Information about a foreign key column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyDescriptor {
    pub column_name: String,
    pub referenced_table: String,
    pub referenced_column: String,
    /// Synthesized when the engine does not name constraints
    pub constraint_name: String,
}

/// Information about a table index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDescriptor {
    pub name: String,
    pub is_unique: bool,
    /// Best-effort access method or origin, "unknown" when the engine does not say
    pub kind: String,
}

/// Full structure of one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
    pub indexes: Vec<IndexDescriptor>,
    pub row_count: u64,
}

/// Condensed view of a table used by the overview and registry groupings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub name: String,
    pub column_count: usize,
    pub row_count: u64,
    pub foreign_key_count: usize,
    pub index_count: usize,
    /// Diagnostic left when part of the introspection failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A foreign key together with the table that owns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub table_name: String,
    #[serde(flatten)]
    pub foreign_key: ForeignKeyDescriptor,
}

/// Whole-database report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub tables: Vec<TableSummary>,
    pub total_tables: usize,
    /// Bytes on disk, 0 when the engine would not say
    pub total_size: u64,
    pub relationships: Vec<Relationship>,
    pub database_name: String,
}

/// Result of an ad-hoc query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub rows: Vec<Row>,
    pub row_count: usize,
    pub execution_time_millis: u64,
}

/// One page of rows from a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePage {
    pub rows: Vec<Row>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Options for a cross-catalog search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    pub include_data: bool,
    /// Cap on data rows per table; the configured default when `None`
    pub limit: Option<u32>,
}

/// Matches found in one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub table_name: String,
    pub row_count: u64,
    pub matching_columns: Vec<ColumnDescriptor>,
    pub data_matches: Vec<Row>,
}

/// One bucket of a value distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionEntry {
    pub value: Value,
    pub count: u64,
    /// Share of the non-null rows, rounded to 2 decimals
    pub percentage: f64,
}

/// Aggregate statistics over the raw column values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStats {
    pub total_rows: u64,
    pub non_null_count: u64,
    pub distinct_count: u64,
    pub min_value: Value,
    pub max_value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnAnalysis {
    pub column_info: ColumnDescriptor,
    pub distribution: Vec<DistributionEntry>,
    pub stats: ColumnStats,
}

/// A row of the registry metadata table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub name: String,
    pub prefix: String,
    pub description: Option<String>,
    pub import_date: Option<String>,
}

/// Tables assigned to one logical database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseGroup {
    /// `None` for the synthetic bucket of unclaimed tables
    pub info: Option<RegistryEntry>,
    pub tables: Vec<TableSummary>,
}
