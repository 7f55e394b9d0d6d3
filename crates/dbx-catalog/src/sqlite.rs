//! SQLite dialect and row decoding

use crate::dialect::{Backend, Dialect, SqlParam, Statement};
use crate::types::{ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor, Row};
use crate::value;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use dbx_core::DatabaseConfig;
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use std::time::Duration;

/// Catalog SQL for SQLite, read through PRAGMA table-valued functions
#[derive(Debug, Clone, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn like_operator(&self) -> &'static str {
        // LIKE is already case-insensitive for ASCII
        "LIKE"
    }

    fn list_tables(&self) -> Statement {
        Statement::new(
            r#"
            SELECT name
            FROM sqlite_master
            WHERE type = 'table'
            AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
            ORDER BY name
            "#,
        )
    }

    fn columns(&self, table: &str) -> Statement {
        Statement::new(format!("PRAGMA table_info({})", self.table_ref(table)))
    }

    fn parse_column(&self, row: &Row) -> Option<ColumnDescriptor> {
        let is_primary_key = value::int(row, "pk").unwrap_or(0) > 0;
        Some(ColumnDescriptor {
            name: value::text(row, "name")?,
            data_type: value::text(row, "type").unwrap_or_default(),
            nullable: !value::flag(row, "notnull"),
            default_value: value::text(row, "dflt_value"),
            is_primary_key,
            extra: if is_primary_key {
                "PRIMARY KEY".to_string()
            } else {
                String::new()
            },
        })
    }

    fn foreign_keys(&self, table: &str) -> Statement {
        Statement::new(format!("PRAGMA foreign_key_list({})", self.table_ref(table)))
    }

    fn parse_foreign_key(&self, table: &str, row: &Row) -> Option<ForeignKeyDescriptor> {
        let column_name = value::text(row, "from")?;
        let referenced_table = value::text(row, "table")?;
        // `to` is NULL when the key targets the parent's primary key implicitly
        let referenced_column = value::text(row, "to").unwrap_or_default();
        let id = value::int(row, "id").unwrap_or(0);

        Some(ForeignKeyDescriptor {
            constraint_name: format!("fk_{}_{}_{}", table, id, column_name),
            column_name,
            referenced_table,
            referenced_column,
        })
    }

    fn indexes(&self, table: &str) -> Statement {
        Statement::new(format!("PRAGMA index_list({})", self.table_ref(table)))
    }

    fn parse_index(&self, row: &Row) -> Option<IndexDescriptor> {
        let kind = match value::text(row, "origin").as_deref() {
            Some("c") => "index",
            Some("u") => "unique constraint",
            Some("pk") => "primary key",
            _ => "unknown",
        };

        Some(IndexDescriptor {
            name: value::text(row, "name")?,
            is_unique: value::flag(row, "unique"),
            kind: kind.to_string(),
        })
    }

    fn database_name(&self) -> Statement {
        Statement::new("SELECT file AS name FROM pragma_database_list WHERE name = 'main'")
    }

    fn database_size(&self) -> Statement {
        Statement::new(
            "SELECT page_count * page_size AS size FROM pragma_page_count(), pragma_page_size()",
        )
    }
}

/// Open a pool for a `sqlite:` URL
pub(crate) async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await
}

/// Run a statement and decode every row into a JSON object
pub(crate) async fn fetch_rows(
    pool: &SqlitePool,
    sql: &str,
    params: &[SqlParam],
) -> Result<Vec<Row>, sqlx::Error> {
    let mut query = sqlx::query(sql);
    for param in params {
        query = match param {
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::Float(v) => query.bind(*v),
            SqlParam::Text(v) => query.bind(v.clone()),
            SqlParam::Null => query.bind(Option::<String>::None),
        };
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(decode_row).collect()
}

/// Decode by the storage class of each value, not the declared column type
fn decode_row(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    let mut map = Row::new();
    for (i, column) in row.columns().iter().enumerate() {
        let storage = {
            let raw = row.try_get_raw(i)?;
            if raw.is_null() {
                None
            } else {
                Some(raw.type_info().name().to_string())
            }
        };

        let value = match storage.as_deref() {
            None | Some("NULL") => Value::Null,
            Some("INTEGER") => Value::from(row.try_get_unchecked::<i64, _>(i)?),
            Some("REAL") => serde_json::Number::from_f64(row.try_get_unchecked::<f64, _>(i)?)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Some("BLOB") => Value::String(BASE64.encode(row.try_get_unchecked::<Vec<u8>, _>(i)?)),
            Some(_) => Value::String(row.try_get_unchecked::<String, _>(i)?),
        };

        map.insert(column.name().to_string(), value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_pragma_table_info() {
        let dialect = SqliteDialect;
        let column = dialect
            .parse_column(&row(json!({
                "cid": 0, "name": "id", "type": "INTEGER",
                "notnull": 0, "dflt_value": null, "pk": 1
            })))
            .unwrap();

        assert_eq!(column.name, "id");
        assert!(column.is_primary_key);
        assert_eq!(column.extra, "PRIMARY KEY");
        // SQLite reports INTEGER PRIMARY KEY as nullable; that is passed through
        assert!(column.nullable);
    }

    #[test]
    fn test_parse_foreign_key_synthesizes_name() {
        let dialect = SqliteDialect;
        let fk = dialect
            .parse_foreign_key(
                "contacts",
                &row(json!({
                    "id": 0, "seq": 0, "table": "studios",
                    "from": "studio_id", "to": null
                })),
            )
            .unwrap();

        assert_eq!(fk.referenced_table, "studios");
        assert_eq!(fk.referenced_column, "");
        assert_eq!(fk.constraint_name, "fk_contacts_0_studio_id");
    }

    #[test]
    fn test_parse_index_origin() {
        let dialect = SqliteDialect;
        let index = dialect
            .parse_index(&row(json!({
                "seq": 0, "name": "sqlite_autoindex_contacts_1",
                "unique": 1, "origin": "u", "partial": 0
            })))
            .unwrap();

        assert!(index.is_unique);
        assert_eq!(index.kind, "unique constraint");
    }

    #[test]
    fn test_columns_statement_quotes_table() {
        let statement = SqliteDialect.columns("gallery images");
        assert_eq!(statement.sql, "PRAGMA table_info(\"gallery images\")");
        assert!(statement.params.is_empty());
    }
}
