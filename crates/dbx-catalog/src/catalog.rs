//! Catalog reader: enumerate tables and describe their structure
//!
//! Every operation that takes a table or column name resolves it against a
//! freshly fetched [`Catalog`] first. Only resolved names ([`TableName`],
//! [`ColumnName`]) are ever interpolated into SQL text.

use crate::connection::ConnectionProvider;
use crate::dialect::Dialect;
use crate::types::{
    ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor, Overview, Relationship,
    TableDescriptor, TableSummary,
};
use crate::value;
use dbx_core::{CatalogConfig, Error, Result};
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;

/// Live inventory of table names, fetched per call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    tables: Vec<String>,
}

impl Catalog {
    pub fn new(tables: Vec<String>) -> Self {
        Self { tables }
    }

    /// Table names in catalog order
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t == name)
    }

    /// Resolve a caller-supplied name to a table known to exist
    pub fn resolve(&self, name: &str) -> Result<TableName> {
        if self.contains(name) {
            Ok(TableName(name.to_string()))
        } else {
            Err(Error::UnknownTable(name.to_string()))
        }
    }

    /// Every table, already resolved
    pub fn resolved(&self) -> Vec<TableName> {
        self.tables.iter().cloned().map(TableName).collect()
    }
}

/// A table name that was found in the live catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A column name that was found on a resolved table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnName(String);

impl ColumnName {
    /// Resolve a caller-supplied column against the table's descriptors
    pub fn resolve(
        table: &TableName,
        columns: &[ColumnDescriptor],
        name: &str,
    ) -> Result<(ColumnName, ColumnDescriptor)> {
        columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| (ColumnName(c.name.clone()), c.clone()))
            .ok_or_else(|| Error::UnknownColumn {
                table: table.to_string(),
                column: name.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Everything learned about one table during an overview pass
struct TableIntrospection {
    summary: TableSummary,
    foreign_keys: Vec<ForeignKeyDescriptor>,
}

/// Reads table structure from the engine's system catalog
#[derive(Clone)]
pub struct CatalogReader {
    provider: Arc<ConnectionProvider>,
    config: CatalogConfig,
}

impl CatalogReader {
    pub fn new(provider: Arc<ConnectionProvider>, config: CatalogConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &Arc<ConnectionProvider> {
        &self.provider
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub(crate) fn dialect(&self) -> &dyn Dialect {
        self.provider.dialect()
    }

    /// Names of all user tables, engine-internal tables excluded
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let rows = self
            .provider
            .run_statement(&self.dialect().list_tables())
            .await?;

        Ok(rows.iter().filter_map(|row| value::text(row, "name")).collect())
    }

    /// Fetch the current inventory
    pub async fn catalog(&self) -> Result<Catalog> {
        Ok(Catalog::new(self.list_tables().await?))
    }

    /// Resolve a name against a fresh inventory
    pub async fn resolve_table(&self, name: &str) -> Result<TableName> {
        self.catalog().await?.resolve(name)
    }

    /// Columns, keys, indexes and row count of one table
    pub async fn describe_table(&self, name: &str) -> Result<TableDescriptor> {
        let table = self.resolve_table(name).await?;

        tracing::debug!(table = %table, "Describing table");

        Ok(TableDescriptor {
            columns: self.columns(&table).await?,
            foreign_keys: self.foreign_keys(&table).await?,
            indexes: self.indexes(&table).await?,
            row_count: self.row_count(&table).await?,
            name: table.0,
        })
    }

    pub async fn columns(&self, table: &TableName) -> Result<Vec<ColumnDescriptor>> {
        let dialect = self.dialect();
        let rows = self
            .provider
            .run_statement(&dialect.columns(table.as_str()))
            .await?;

        Ok(rows.iter().filter_map(|row| dialect.parse_column(row)).collect())
    }

    pub async fn foreign_keys(&self, table: &TableName) -> Result<Vec<ForeignKeyDescriptor>> {
        let dialect = self.dialect();
        let rows = self
            .provider
            .run_statement(&dialect.foreign_keys(table.as_str()))
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| dialect.parse_foreign_key(table.as_str(), row))
            .collect())
    }

    pub async fn indexes(&self, table: &TableName) -> Result<Vec<IndexDescriptor>> {
        let dialect = self.dialect();
        let rows = self
            .provider
            .run_statement(&dialect.indexes(table.as_str()))
            .await?;

        Ok(rows.iter().filter_map(|row| dialect.parse_index(row)).collect())
    }

    /// Exact `COUNT(*)` over the table
    pub async fn row_count(&self, table: &TableName) -> Result<u64> {
        let sql = format!(
            "SELECT COUNT(*) AS count FROM {}",
            self.dialect().table_ref(table.as_str())
        );
        let rows = self.provider.run(&sql, &[]).await?;

        Ok(rows.first().map(|row| value::count(row, "count")).unwrap_or(0))
    }

    /// Row count that degrades to 0 instead of failing
    pub(crate) async fn row_count_or_zero(&self, table: &TableName) -> (u64, Option<String>) {
        match self.row_count(table).await {
            Ok(count) => (count, None),
            Err(e) => {
                tracing::warn!(table = %table, error = %e, "Row count unavailable");
                (0, Some(format!("row count unavailable: {}", e)))
            }
        }
    }

    /// Whole-database report, resilient to any single table failing
    pub async fn describe_overview(&self) -> Result<Overview> {
        let catalog = self.catalog().await?;
        let introspected = self.introspect_all(&catalog.resolved()).await;

        let mut tables = Vec::with_capacity(introspected.len());
        let mut relationships = Vec::new();
        for (table, outcome) in introspected {
            match outcome {
                Ok(found) => {
                    relationships.extend(found.foreign_keys.into_iter().map(|foreign_key| {
                        Relationship {
                            table_name: table.to_string(),
                            foreign_key,
                        }
                    }));
                    tables.push(found.summary);
                }
                Err(e) => tables.push(degraded_summary(&table, &e)),
            }
        }

        let database_name = self.database_name().await;
        let total_size = self.database_size().await;

        tracing::info!(
            tables = tables.len(),
            relationships = relationships.len(),
            "Built database overview"
        );

        Ok(Overview {
            total_tables: tables.len(),
            tables,
            total_size,
            relationships,
            database_name,
        })
    }

    /// Summaries for the given tables in input order; failures become degraded entries
    pub async fn summarize_tables(&self, tables: &[TableName]) -> Vec<TableSummary> {
        self.introspect_all(tables)
            .await
            .into_iter()
            .map(|(table, outcome)| match outcome {
                Ok(found) => found.summary,
                Err(e) => degraded_summary(&table, &e),
            })
            .collect()
    }

    /// Fan out one introspection per table, bounded by the configured
    /// concurrency. `buffered` yields in input order whatever the completion order.
    async fn introspect_all(
        &self,
        tables: &[TableName],
    ) -> Vec<(TableName, Result<TableIntrospection>)> {
        stream::iter(tables.iter().cloned())
            .map(|table| async move {
                let outcome = self.introspect(&table).await;
                (table, outcome)
            })
            .buffered(self.config.fanout_concurrency.max(1))
            .collect()
            .await
    }

    async fn introspect(&self, table: &TableName) -> Result<TableIntrospection> {
        let columns = self.columns(table).await?;
        let foreign_keys = self.foreign_keys(table).await?;
        let indexes = self.indexes(table).await?;
        let (row_count, comment) = self.row_count_or_zero(table).await;

        Ok(TableIntrospection {
            summary: TableSummary {
                name: table.to_string(),
                column_count: columns.len(),
                row_count,
                foreign_key_count: foreign_keys.len(),
                index_count: indexes.len(),
                comment,
            },
            foreign_keys,
        })
    }

    async fn database_name(&self) -> String {
        let name = self
            .provider
            .run_statement(&self.dialect().database_name())
            .await
            .ok()
            .and_then(|rows| rows.first().and_then(|row| value::text(row, "name")))
            .unwrap_or_default();

        // SQLite reports a file path, or nothing for in-memory databases
        let name = std::path::Path::new(&name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or(name);

        if name.is_empty() {
            "main".to_string()
        } else {
            name
        }
    }

    async fn database_size(&self) -> u64 {
        match self
            .provider
            .run_statement(&self.dialect().database_size())
            .await
        {
            Ok(rows) => rows.first().map(|row| value::count(row, "size")).unwrap_or(0),
            Err(e) => {
                tracing::warn!(error = %e, "Database size unavailable");
                0
            }
        }
    }
}

fn degraded_summary(table: &TableName, error: &Error) -> TableSummary {
    tracing::warn!(table = %table, error = %error, "Table introspection failed");
    TableSummary {
        name: table.to_string(),
        column_count: 0,
        row_count: 0,
        foreign_key_count: 0,
        index_count: 0,
        comment: Some(format!("introspection failed: {}", error)),
    }
}
