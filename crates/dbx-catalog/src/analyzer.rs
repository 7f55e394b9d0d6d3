//! Value statistics and distribution for a single column

use crate::catalog::{CatalogReader, ColumnName, TableName};
use crate::dialect::{SqlParam, quote_identifier};
use crate::types::{ColumnAnalysis, ColumnStats, DistributionEntry};
use crate::value;
use dbx_core::Result;
use serde_json::Value;

#[derive(Clone)]
pub struct ColumnAnalyzer {
    reader: CatalogReader,
}

impl ColumnAnalyzer {
    pub fn new(reader: CatalogReader) -> Self {
        Self { reader }
    }

    /// Describe one column and summarise the values it holds.
    ///
    /// Both names are resolved against the live catalog before any SQL that
    /// mentions them is built. The distribution covers non-null values only,
    /// most frequent first, capped at the configured bucket count.
    pub async fn analyze(&self, table: &str, column: &str) -> Result<ColumnAnalysis> {
        let table = self.reader.resolve_table(table).await?;
        let columns = self.reader.columns(&table).await?;
        let (column, column_info) = ColumnName::resolve(&table, &columns, column)?;

        let stats = self.stats(&table, &column).await?;
        let distribution = self.distribution(&table, &column, stats.non_null_count).await?;

        tracing::debug!(
            table = %table,
            column = column.as_str(),
            buckets = distribution.len(),
            "Analyzed column"
        );

        Ok(ColumnAnalysis {
            column_info,
            distribution,
            stats,
        })
    }

    async fn stats(&self, table: &TableName, column: &ColumnName) -> Result<ColumnStats> {
        let quoted = quote_identifier(column.as_str());
        let sql = format!(
            "SELECT COUNT(*) AS total_rows, COUNT({c}) AS non_null_count, \
             COUNT(DISTINCT {c}) AS distinct_count, MIN({c}) AS min_value, \
             MAX({c}) AS max_value FROM {t}",
            c = quoted,
            t = self.reader.dialect().table_ref(table.as_str())
        );

        let rows = self.reader.provider().run(&sql, &[]).await?;
        let row = rows.first();

        Ok(ColumnStats {
            total_rows: row.map(|r| value::count(r, "total_rows")).unwrap_or(0),
            non_null_count: row.map(|r| value::count(r, "non_null_count")).unwrap_or(0),
            distinct_count: row.map(|r| value::count(r, "distinct_count")).unwrap_or(0),
            min_value: row
                .and_then(|r| r.get("min_value").cloned())
                .unwrap_or(Value::Null),
            max_value: row
                .and_then(|r| r.get("max_value").cloned())
                .unwrap_or(Value::Null),
        })
    }

    async fn distribution(
        &self,
        table: &TableName,
        column: &ColumnName,
        non_null_count: u64,
    ) -> Result<Vec<DistributionEntry>> {
        let limit = self.reader.config().distribution_limit;
        if non_null_count == 0 || limit == 0 {
            return Ok(Vec::new());
        }

        let dialect = self.reader.dialect();
        let quoted = quote_identifier(column.as_str());
        // Positional ORDER BY: the column itself may be called "count" or "value"
        let sql = format!(
            "SELECT {c} AS value, COUNT(*) AS count FROM {t} \
             WHERE {c} IS NOT NULL GROUP BY {c} ORDER BY 2 DESC, 1 LIMIT {p}",
            c = quoted,
            t = dialect.table_ref(table.as_str()),
            p = dialect.placeholder(1)
        );

        let rows = self
            .reader
            .provider()
            .run(&sql, &[SqlParam::Int(i64::from(limit))])
            .await?;

        Ok(rows
            .into_iter()
            .map(|mut row| {
                let count = value::count(&row, "count");
                DistributionEntry {
                    value: row.remove("value").unwrap_or(Value::Null),
                    count,
                    percentage: percentage(count, non_null_count),
                }
            })
            .collect())
    }
}

/// Share of `total` as a percentage, truncated to 2 decimals.
///
/// Truncating keeps the sum over all buckets at or below 100.
fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let hundredths = u128::from(count) * 10_000 / u128::from(total);
    hundredths as f64 / 100.0
}
