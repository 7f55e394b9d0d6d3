//! Grouping of tables into logical databases by name prefix
//!
//! A metadata table (by default `database_registry`) lists logical databases
//! with the table-name prefix each one owns. Tables that no prefix claims land
//! in a synthetic "Other Tables" group.

use crate::catalog::{CatalogReader, TableName};
use crate::types::{DatabaseGroup, RegistryEntry, TableSummary};
use crate::value;
use dbx_core::Result;
use std::collections::BTreeMap;

/// Key of the group holding tables no registry prefix claims
pub const OTHER_TABLES: &str = "Other Tables";

#[derive(Clone)]
pub struct DatabaseRegistry {
    reader: CatalogReader,
}

impl DatabaseRegistry {
    pub fn new(reader: CatalogReader) -> Self {
        Self { reader }
    }

    /// Registry rows in the order the engine returns them.
    ///
    /// A missing or unreadable registry table yields no entries rather than
    /// an error; rows without a name or prefix are skipped.
    pub async fn entries(&self) -> Result<Vec<RegistryEntry>> {
        let catalog = self.reader.catalog().await?;
        let Ok(table) = catalog.resolve(&self.reader.config().registry_table) else {
            tracing::debug!(
                table = %self.reader.config().registry_table,
                "No registry table, every table is unclaimed"
            );
            return Ok(Vec::new());
        };

        Ok(self.read_entries(&table).await)
    }

    async fn read_entries(&self, table: &TableName) -> Vec<RegistryEntry> {
        let sql = format!(
            "SELECT name, prefix, description, import_date FROM {}",
            self.reader.dialect().table_ref(table.as_str())
        );

        match self.reader.provider().run(&sql, &[]).await {
            Ok(rows) => rows
                .iter()
                .filter_map(|row| {
                    Some(RegistryEntry {
                        name: value::text(row, "name")?,
                        prefix: value::text(row, "prefix")?,
                        description: value::text(row, "description"),
                        import_date: value::text(row, "import_date"),
                    })
                })
                .collect(),
            Err(e) => {
                tracing::warn!(table = %table, error = %e, "Registry table unreadable");
                Vec::new()
            }
        }
    }

    /// Assign every table to the first registry entry whose prefix it starts
    /// with. Every entry gets a group, even an empty one; the "Other Tables"
    /// group only appears when some table went unclaimed.
    pub async fn group_tables_by_prefix(&self) -> Result<BTreeMap<String, DatabaseGroup>> {
        let entries = self.entries().await?;
        let catalog = self.reader.catalog().await?;
        let summaries = self.reader.summarize_tables(&catalog.resolved()).await;

        let assignments = assign(&entries, summaries);

        let mut groups: BTreeMap<String, DatabaseGroup> = entries
            .iter()
            .map(|entry| {
                (
                    entry.name.clone(),
                    DatabaseGroup {
                        info: Some(entry.clone()),
                        tables: Vec::new(),
                    },
                )
            })
            .collect();

        for (owner, summary) in assignments {
            let key = owner.map(|i| entries[i].name.clone());
            groups
                .entry(key.unwrap_or_else(|| OTHER_TABLES.to_string()))
                .or_insert_with(|| DatabaseGroup {
                    info: None,
                    tables: Vec::new(),
                })
                .tables
                .push(summary);
        }

        tracing::info!(groups = groups.len(), "Grouped tables by registry prefix");

        Ok(groups)
    }
}

/// Pair each summary with the index of the first entry claiming it
fn assign(
    entries: &[RegistryEntry],
    summaries: Vec<TableSummary>,
) -> Vec<(Option<usize>, TableSummary)> {
    summaries
        .into_iter()
        .map(|summary| {
            let owner = entries.iter().position(|entry| {
                !entry.prefix.is_empty() && summary.name.starts_with(&entry.prefix)
            });
            (owner, summary)
        })
        .collect()
}
