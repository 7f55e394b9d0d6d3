//! Cross-catalog search over table names, column names and row contents
//!
//! Each table is queried directly once per search rather than through an
//! index. That is fine for admin-sized catalogs of a few dozen tables and
//! does not scale beyond that.

use crate::catalog::{CatalogReader, TableName};
use crate::dialect::{SqlParam, like_pattern, quote_identifier};
use crate::types::{ColumnDescriptor, Row, SearchOptions, SearchResult};
use dbx_core::{Error, Result};

#[derive(Clone)]
pub struct SearchEngine {
    reader: CatalogReader,
}

impl SearchEngine {
    pub fn new(reader: CatalogReader) -> Self {
        Self { reader }
    }

    /// Search table names for `term`, case-insensitively.
    ///
    /// Only tables whose name contains the term are reported. With
    /// `include_data`, each one also carries the columns whose name contains
    /// the term and up to `limit` rows with a textual value containing it.
    /// Tables come back in catalog order, columns in declaration order and
    /// rows in the engine's natural order (no `ORDER BY` is imposed).
    pub async fn search(&self, term: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let term = term.trim();
        if term.is_empty() {
            return Err(Error::InvalidArgument("search term is empty".to_string()));
        }

        let needle = term.to_lowercase();
        let limit = options
            .limit
            .unwrap_or(self.reader.config().search_limit);
        let catalog = self.reader.catalog().await?;

        let mut results = Vec::new();
        for table in catalog.resolved() {
            if !table.as_str().to_lowercase().contains(&needle) {
                continue;
            }

            let (row_count, _) = self.reader.row_count_or_zero(&table).await;

            let (matching_columns, data_matches) = if options.include_data {
                let columns = self.reader.columns(&table).await?;
                let data_matches = self.matching_rows(&table, &columns, term, limit).await?;
                let matching_columns = columns
                    .into_iter()
                    .filter(|c| c.name.to_lowercase().contains(&needle))
                    .collect::<Vec<_>>();
                (matching_columns, data_matches)
            } else {
                (Vec::new(), Vec::new())
            };

            results.push(SearchResult {
                table_name: table.to_string(),
                row_count,
                matching_columns,
                data_matches,
            });
        }

        tracing::info!(term = %term, tables = results.len(), "Search completed");

        Ok(results)
    }

    /// Rows where any textual column contains the term, capped at `limit`
    async fn matching_rows(
        &self,
        table: &TableName,
        columns: &[ColumnDescriptor],
        term: &str,
        limit: u32,
    ) -> Result<Vec<Row>> {
        let textual: Vec<&ColumnDescriptor> = columns.iter().filter(|c| c.is_textual()).collect();
        if textual.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let dialect = self.reader.dialect();
        let pattern = like_pattern(term);

        let mut params = Vec::with_capacity(textual.len() + 1);
        let predicates = textual
            .iter()
            .enumerate()
            .map(|(i, column)| {
                params.push(SqlParam::Text(pattern.clone()));
                format!(
                    "{} {} {} ESCAPE '\\'",
                    quote_identifier(&column.name),
                    dialect.like_operator(),
                    dialect.placeholder(i + 1)
                )
            })
            .collect::<Vec<_>>()
            .join(" OR ");
        params.push(SqlParam::Int(i64::from(limit)));

        let sql = format!(
            "SELECT * FROM {} WHERE {} LIMIT {}",
            dialect.table_ref(table.as_str()),
            predicates,
            dialect.placeholder(textual.len() + 1)
        );

        self.reader.provider().run(&sql, &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::seeded_reader;

    fn names(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.table_name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_name_only_search() {
        let (_dir, reader) = seeded_reader().await;
        let engine = SearchEngine::new(reader);

        let results = engine
            .search("STUDIO", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(names(&results), vec!["studios"]);
        assert_eq!(results[0].row_count, 3);
        assert!(results[0].matching_columns.is_empty());
        assert!(results[0].data_matches.is_empty());
    }

    #[tokio::test]
    async fn test_search_with_data() {
        let (_dir, reader) = seeded_reader().await;
        let engine = SearchEngine::new(reader);

        let options = SearchOptions {
            include_data: true,
            limit: None,
        };

        let results = engine.search("studio", &options).await.unwrap();
        // contacts.studio_id and the faq text do not pull in other tables
        assert_eq!(names(&results), vec!["studios"]);
        let studios = &results[0];
        assert!(studios.matching_columns.is_empty());
        let matched: Vec<_> = studios.data_matches.iter().map(|r| r["name"].clone()).collect();
        assert_eq!(matched, vec!["Lumen Studio", "Studio Red Door"]);

        let results = engine.search("venue", &options).await.unwrap();
        assert_eq!(names(&results), vec!["venues"]);
        let columns: Vec<_> = results[0]
            .matching_columns
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(columns, vec!["venue_type"]);
        assert!(results[0].data_matches.is_empty());
    }

    #[tokio::test]
    async fn test_every_result_contains_term_somewhere() {
        let (_dir, reader) = seeded_reader().await;
        let engine = SearchEngine::new(reader);

        for include_data in [false, true] {
            let options = SearchOptions {
                include_data,
                limit: Some(100),
            };
            for term in ["s", "studio", "venue", "zzz-nothing"] {
                for result in engine.search(term, &options).await.unwrap() {
                    let in_name = result.table_name.to_lowercase().contains(term);
                    let in_columns = !result.matching_columns.is_empty();
                    let in_rows = result.data_matches.iter().any(|row| {
                        row.values().any(|v| {
                            v.as_str()
                                .is_some_and(|s| s.to_lowercase().contains(term))
                        })
                    });
                    assert!(in_name || in_columns || in_rows, "{} / {}", term, result.table_name);
                    if !include_data {
                        assert!(result.data_matches.is_empty());
                    }
                }
            }
        }
    }

    #[tokio::test]
    async fn test_data_matches_are_capped() {
        let (_dir, reader) = seeded_reader().await;
        let engine = SearchEngine::new(reader);

        let options = SearchOptions {
            include_data: true,
            limit: Some(1),
        };
        let results = engine.search("studio", &options).await.unwrap();
        assert_eq!(results[0].data_matches.len(), 1);
    }

    #[tokio::test]
    async fn test_term_is_bound_not_interpolated() {
        let (_dir, reader) = seeded_reader().await;
        let engine = SearchEngine::new(reader);

        let options = SearchOptions {
            include_data: true,
            limit: None,
        };
        let results = engine.search("' OR 1=1 --", &options).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_wildcards_match_literally() {
        let (_dir, reader) = seeded_reader().await;
        let provider = reader.provider().clone();
        provider
            .run("CREATE TABLE promo_codes (code TEXT, note TEXT)", &[])
            .await
            .unwrap();
        provider
            .run(
                "INSERT INTO promo_codes (code, note) VALUES
                    ('SPRING_50', 'half off'),
                    ('SPRING50', '50% off'),
                    ('WINTER', 'none')",
                &[],
            )
            .await
            .unwrap();
        let engine = SearchEngine::new(reader);

        let options = SearchOptions {
            include_data: true,
            limit: None,
        };
        let results = engine.search("_", &options).await.unwrap();
        for result in &results {
            for row in &result.data_matches {
                assert!(
                    row.values().any(|v| v.as_str().is_some_and(|s| s.contains('_'))),
                    "{} returned {:?}",
                    result.table_name,
                    row
                );
            }
        }

        let promo = results
            .iter()
            .find(|r| r.table_name == "promo_codes")
            .unwrap();
        assert_eq!(promo.data_matches.len(), 1);
        assert_eq!(promo.data_matches[0]["code"], "SPRING_50");

        let gallery = results
            .iter()
            .find(|r| r.table_name == "gallery_images")
            .unwrap();
        assert!(gallery.data_matches.is_empty());

        // No table name holds a percent sign
        assert!(engine.search("%", &options).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_term_rejected() {
        let (_dir, reader) = seeded_reader().await;
        let engine = SearchEngine::new(reader);

        let result = engine.search("   ", &SearchOptions::default()).await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
}
