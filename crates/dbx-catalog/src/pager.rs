//! Paged reads of a whole table

use crate::catalog::CatalogReader;
use crate::dialect::SqlParam;
use crate::types::TablePage;
use dbx_core::{Error, Result};

/// Returns one page of rows plus the table's total row count.
///
/// No maximum page size is enforced here; that policy belongs to the caller.
#[derive(Clone)]
pub struct TablePager {
    reader: CatalogReader,
}

impl TablePager {
    pub fn new(reader: CatalogReader) -> Self {
        Self { reader }
    }

    pub async fn page(&self, table: &str, limit: u64, offset: u64) -> Result<TablePage> {
        let bound_limit = i64::try_from(limit)
            .map_err(|_| Error::InvalidArgument(format!("limit out of range: {}", limit)))?;
        let bound_offset = i64::try_from(offset)
            .map_err(|_| Error::InvalidArgument(format!("offset out of range: {}", offset)))?;

        let table = self.reader.resolve_table(table).await?;
        let total = self.reader.row_count(&table).await?;

        // Only the resolved table name is interpolated; paging values are bound
        let dialect = self.reader.dialect();
        let sql = format!(
            "SELECT * FROM {} LIMIT {} OFFSET {}",
            dialect.table_ref(table.as_str()),
            dialect.placeholder(1),
            dialect.placeholder(2)
        );
        let rows = self
            .reader
            .provider()
            .run(&sql, &[SqlParam::Int(bound_limit), SqlParam::Int(bound_offset)])
            .await?;

        tracing::debug!(table = %table, limit, offset, rows = rows.len(), "Read table page");

        Ok(TablePage {
            rows,
            total,
            limit,
            offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::seeded_reader;
    use serde_json::Value;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_pages_are_disjoint_and_cover_table() {
        let (_dir, reader) = seeded_reader().await;
        let pager = TablePager::new(reader);

        let mut seen = HashSet::new();
        let mut offset = 0;
        let mut totals = HashSet::new();
        loop {
            let page = pager.page("studios", 2, offset).await.unwrap();
            totals.insert(page.total);
            if page.rows.is_empty() {
                break;
            }
            for row in &page.rows {
                let id = row["id"].as_i64().unwrap();
                assert!(seen.insert(id), "row {} returned twice", id);
            }
            offset += 2;
        }

        assert_eq!(seen.len(), 3);
        assert_eq!(totals, HashSet::from([3]));
    }

    #[tokio::test]
    async fn test_page_shape() {
        let (_dir, reader) = seeded_reader().await;
        let pager = TablePager::new(reader);

        let page = pager.page("faq", 1, 1).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.limit, 1);
        assert_eq!(page.offset, 1);
        assert_eq!(page.rows.len(), 1);
        assert!(page.rows[0].contains_key("question"));

        let empty = pager.page("faq", 0, 0).await.unwrap();
        assert!(empty.rows.is_empty());
        assert_eq!(empty.total, 3);
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let (_dir, reader) = seeded_reader().await;
        let before = reader.provider().statements_issued();
        let pager = TablePager::new(reader.clone());

        let result = pager.page("faq\" --", 10, 0).await;
        assert!(matches!(result, Err(Error::UnknownTable(_))));
        assert_eq!(reader.provider().statements_issued(), before + 1);
    }

    #[tokio::test]
    async fn test_limit_out_of_range() {
        let (_dir, reader) = seeded_reader().await;
        let pager = TablePager::new(reader);

        let result = pager.page("faq", u64::MAX, 0).await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_blob_values_are_base64() {
        let (_dir, reader) = seeded_reader().await;
        let pager = TablePager::new(reader);

        let page = pager.page("gallery_images", 10, 0).await.unwrap();
        assert_eq!(page.rows[0]["thumbnail"], Value::String("iVBORw==".to_string()));
    }
}
