//! Single entry point over every catalog operation

use crate::analyzer::ColumnAnalyzer;
use crate::catalog::CatalogReader;
use crate::connection::ConnectionProvider;
use crate::executor::QueryExecutor;
use crate::pager::TablePager;
use crate::registry::DatabaseRegistry;
use crate::search::SearchEngine;
use crate::types::{
    ColumnAnalysis, DatabaseGroup, Overview, QueryResult, SearchOptions, SearchResult,
    TableDescriptor, TablePage,
};
use dbx_core::{CatalogConfig, DbxConfig, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Read-only explorer over one relational store.
///
/// Cheap to clone; every component shares the same connection provider.
#[derive(Clone)]
pub struct DatabaseExplorer {
    provider: Arc<ConnectionProvider>,
    reader: CatalogReader,
    executor: QueryExecutor,
    pager: TablePager,
    search: SearchEngine,
    analyzer: ColumnAnalyzer,
    registry: DatabaseRegistry,
}

impl DatabaseExplorer {
    pub fn new(provider: Arc<ConnectionProvider>, config: CatalogConfig) -> Self {
        let reader = CatalogReader::new(provider.clone(), config);
        Self {
            executor: QueryExecutor::new(provider.clone()),
            pager: TablePager::new(reader.clone()),
            search: SearchEngine::new(reader.clone()),
            analyzer: ColumnAnalyzer::new(reader.clone()),
            registry: DatabaseRegistry::new(reader.clone()),
            reader,
            provider,
        }
    }

    /// Build from loaded configuration. Does not connect yet.
    pub fn from_config(config: &DbxConfig) -> Result<Self> {
        let provider = ConnectionProvider::new(config.database.clone())?;
        Ok(Self::new(Arc::new(provider), config.catalog.clone()))
    }

    pub fn provider(&self) -> &Arc<ConnectionProvider> {
        &self.provider
    }

    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.reader.list_tables().await
    }

    pub async fn describe_overview(&self) -> Result<Overview> {
        self.reader.describe_overview().await
    }

    pub async fn describe_table(&self, table: &str) -> Result<TableDescriptor> {
        self.reader.describe_table(table).await
    }

    pub async fn execute(&self, sql: &str) -> Result<QueryResult> {
        self.executor.execute(sql).await
    }

    pub async fn page(&self, table: &str, limit: u64, offset: u64) -> Result<TablePage> {
        self.pager.page(table, limit, offset).await
    }

    pub async fn search(&self, term: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        self.search.search(term, options).await
    }

    pub async fn analyze(&self, table: &str, column: &str) -> Result<ColumnAnalysis> {
        self.analyzer.analyze(table, column).await
    }

    pub async fn group_tables_by_prefix(&self) -> Result<BTreeMap<String, DatabaseGroup>> {
        self.registry.group_tables_by_prefix().await
    }
}
