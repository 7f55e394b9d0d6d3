//! PostgreSQL dialect and row decoding

use crate::dialect::{Backend, Dialect, SqlParam, Statement, quote_identifier};
use crate::types::{ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor, Row};
use crate::value;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use dbx_core::DatabaseConfig;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;
use sqlx::postgres::types::{Oid, PgInterval, PgMoney, PgTimeTz};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use std::net::IpAddr;
use std::time::Duration;
use uuid::Uuid;

/// Catalog SQL for PostgreSQL, scoped to one schema
#[derive(Debug, Clone)]
pub struct PostgresDialect {
    schema: String,
}

impl PostgresDialect {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }
}

impl Dialect for PostgresDialect {
    fn backend(&self) -> Backend {
        Backend::Postgres
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn like_operator(&self) -> &'static str {
        "ILIKE"
    }

    fn table_ref(&self, table: &str) -> String {
        format!("{}.{}", quote_identifier(&self.schema), quote_identifier(table))
    }

    fn list_tables(&self) -> Statement {
        Statement::new(
            r#"
            SELECT table_name::text AS name
            FROM information_schema.tables
            WHERE table_schema::text = $1
            AND table_type = 'BASE TABLE'
            AND table_name::text NOT LIKE 'pg\_%'
            ORDER BY table_name
            "#,
        )
        .bind(self.schema.as_str())
    }

    fn columns(&self, table: &str) -> Statement {
        Statement::new(
            r#"
            SELECT
                c.column_name::text AS name,
                c.data_type::text AS data_type,
                (c.is_nullable = 'YES') AS nullable,
                c.column_default::text AS default_value,
                EXISTS (
                    SELECT 1
                    FROM information_schema.table_constraints tc
                    JOIN information_schema.key_column_usage kcu
                        ON tc.constraint_name = kcu.constraint_name
                        AND tc.table_schema = kcu.table_schema
                        AND tc.table_name = kcu.table_name
                    WHERE tc.constraint_type = 'PRIMARY KEY'
                    AND tc.table_schema = c.table_schema
                    AND tc.table_name = c.table_name
                    AND kcu.column_name = c.column_name
                ) AS is_primary_key
            FROM information_schema.columns c
            WHERE c.table_schema::text = $1 AND c.table_name::text = $2
            ORDER BY c.ordinal_position
            "#,
        )
        .bind(self.schema.as_str())
        .bind(table)
    }

    fn parse_column(&self, row: &Row) -> Option<ColumnDescriptor> {
        let is_primary_key = value::flag(row, "is_primary_key");
        Some(ColumnDescriptor {
            name: value::text(row, "name")?,
            data_type: value::text(row, "data_type").unwrap_or_default(),
            nullable: value::flag(row, "nullable"),
            default_value: value::text(row, "default_value"),
            is_primary_key,
            extra: if is_primary_key {
                "PRIMARY KEY".to_string()
            } else {
                String::new()
            },
        })
    }

    fn foreign_keys(&self, table: &str) -> Statement {
        Statement::new(
            r#"
            SELECT
                kcu.column_name::text AS column_name,
                ccu.table_name::text AS referenced_table,
                ccu.column_name::text AS referenced_column,
                tc.constraint_name::text AS constraint_name
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            JOIN information_schema.constraint_column_usage ccu
                ON ccu.constraint_name = tc.constraint_name
                AND ccu.table_schema = tc.table_schema
            WHERE tc.constraint_type = 'FOREIGN KEY'
            AND tc.table_schema::text = $1
            AND tc.table_name::text = $2
            ORDER BY tc.constraint_name, kcu.ordinal_position
            "#,
        )
        .bind(self.schema.as_str())
        .bind(table)
    }

    fn parse_foreign_key(&self, table: &str, row: &Row) -> Option<ForeignKeyDescriptor> {
        let column_name = value::text(row, "column_name")?;
        let constraint_name = value::text(row, "constraint_name")
            .unwrap_or_else(|| format!("fk_{}_{}", table, column_name));

        Some(ForeignKeyDescriptor {
            column_name,
            referenced_table: value::text(row, "referenced_table")?,
            referenced_column: value::text(row, "referenced_column").unwrap_or_default(),
            constraint_name,
        })
    }

    fn indexes(&self, table: &str) -> Statement {
        Statement::new(
            r#"
            SELECT indexname::text AS name, indexdef AS definition
            FROM pg_indexes
            WHERE schemaname::text = $1 AND tablename::text = $2
            ORDER BY indexname
            "#,
        )
        .bind(self.schema.as_str())
        .bind(table)
    }

    fn parse_index(&self, row: &Row) -> Option<IndexDescriptor> {
        let definition = value::text(row, "definition").unwrap_or_default();
        Some(IndexDescriptor {
            name: value::text(row, "name")?,
            is_unique: definition.contains("UNIQUE INDEX"),
            kind: index_method(&definition).unwrap_or("unknown").to_string(),
        })
    }

    fn database_name(&self) -> Statement {
        Statement::new("SELECT current_database()::text AS name")
    }

    fn database_size(&self) -> Statement {
        Statement::new("SELECT pg_database_size(current_database()) AS size")
    }
}

/// Access method from an index definition, e.g. `btree` in `... USING btree (id)`
fn index_method(definition: &str) -> Option<&str> {
    let (_, rest) = definition.split_once(" USING ")?;
    rest.split_whitespace().next()
}

/// Open a pool for a `postgres://` URL
pub(crate) async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await
}

/// Run a statement and decode every row into a JSON object
pub(crate) async fn fetch_rows(
    pool: &PgPool,
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

fn decode_row(row: &PgRow) -> Result<Row, sqlx::Error> {
    let mut map = Row::new();
    for (i, column) in row.columns().iter().enumerate() {
        if row.try_get_raw(i)?.is_null() {
            map.insert(column.name().to_string(), Value::Null);
            continue;
        }

        let type_name = column.type_info().name().to_string();
        let value = match type_name.as_str() {
            "BOOL" => Value::Bool(row.try_get::<bool, _>(i)?),
            "INT2" => Value::from(row.try_get::<i16, _>(i)?),
            "INT4" => Value::from(row.try_get::<i32, _>(i)?),
            "INT8" => Value::from(row.try_get::<i64, _>(i)?),
            "OID" => Value::from(row.try_get::<Oid, _>(i)?.0),
            "FLOAT4" => float(f64::from(row.try_get::<f32, _>(i)?)),
            "FLOAT8" => float(row.try_get::<f64, _>(i)?),
            "NUMERIC" => numeric(row, i)?,
            "MONEY" => numeric_value(row.try_get::<PgMoney, _>(i)?.to_decimal(2)),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" | "UNKNOWN" => {
                Value::String(row.try_get::<String, _>(i)?)
            }
            "JSON" | "JSONB" => row.try_get::<Value, _>(i)?,
            "UUID" => Value::String(row.try_get::<Uuid, _>(i)?.to_string()),
            "DATE" => Value::String(row.try_get::<NaiveDate, _>(i)?.to_string()),
            "TIME" => Value::String(row.try_get::<NaiveTime, _>(i)?.to_string()),
            "TIMETZ" => {
                let t = row.try_get::<PgTimeTz<NaiveTime, FixedOffset>, _>(i)?;
                Value::String(format!("{}{}", t.time, t.offset))
            }
            "TIMESTAMP" => Value::String(row.try_get::<NaiveDateTime, _>(i)?.to_string()),
            "TIMESTAMPTZ" => Value::String(row.try_get::<DateTime<Utc>, _>(i)?.to_rfc3339()),
            "INTERVAL" => Value::String(format_interval(&row.try_get::<PgInterval, _>(i)?)),
            "INET" | "CIDR" => {
                let raw = row.try_get_raw(i)?;
                let bytes = raw.as_bytes().map_err(sqlx::Error::Decode)?;
                match format_inet(bytes) {
                    Some(text) => Value::String(text),
                    None => raw_value(bytes),
                }
            }
            "BYTEA" => Value::String(BASE64.encode(row.try_get::<Vec<u8>, _>(i)?)),
            "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => {
                array(row.try_get::<Vec<Option<String>>, _>(i)?, Value::String)
            }
            "BOOL[]" => array(row.try_get::<Vec<Option<bool>>, _>(i)?, Value::Bool),
            "INT2[]" => array(row.try_get::<Vec<Option<i16>>, _>(i)?, Value::from),
            "INT4[]" => array(row.try_get::<Vec<Option<i32>>, _>(i)?, Value::from),
            "INT8[]" => array(row.try_get::<Vec<Option<i64>>, _>(i)?, Value::from),
            "FLOAT8[]" => array(row.try_get::<Vec<Option<f64>>, _>(i)?, float),
            "NUMERIC[]" => array(row.try_get::<Vec<Option<Decimal>>, _>(i)?, numeric_value),
            "UUID[]" => {
                let ids = row.try_get::<Vec<Option<Uuid>>, _>(i)?;
                array(ids, |id| Value::String(id.to_string()))
            }
            other => {
                tracing::debug!(
                    column = %column.name(),
                    type_name = %other,
                    "Passing raw column value"
                );
                let raw = row.try_get_raw(i)?;
                raw_value(raw.as_bytes().map_err(sqlx::Error::Decode)?)
            }
        };

        map.insert(column.name().to_string(), value);
    }
    Ok(map)
}

fn float(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// NUMERIC as a JSON number when that is exact, otherwise its decimal text
fn numeric(row: &PgRow, i: usize) -> Result<Value, sqlx::Error> {
    match row.try_get::<Decimal, _>(i) {
        Ok(decimal) => Ok(numeric_value(decimal)),
        Err(err) => {
            let raw = row.try_get_raw(i)?;
            match numeric_special(raw.as_bytes().map_err(sqlx::Error::Decode)?) {
                Some(text) => Ok(Value::String(text.to_string())),
                None => Err(err),
            }
        }
    }
}

fn numeric_value(decimal: Decimal) -> Value {
    let decimal = decimal.normalize();
    if decimal.scale() == 0 {
        if let Some(int) = decimal.to_i64() {
            return Value::from(int);
        }
    }

    let text = decimal.to_string();
    match decimal.to_f64() {
        Some(f) if f.to_string() == text => float(f),
        _ => Value::String(text),
    }
}

/// NaN and the infinities, which have no `Decimal` form.
///
/// Binary NUMERIC starts with ndigits, weight, sign and dscale as 16-bit words.
fn numeric_special(bytes: &[u8]) -> Option<&'static str> {
    match bytes.get(4..6)? {
        [0xC0, 0x00] => Some("NaN"),
        [0xD0, 0x00] => Some("Infinity"),
        [0xF0, 0x00] => Some("-Infinity"),
        _ => None,
    }
}

/// ISO 8601 duration, e.g. `P1Y2M3DT4H5M6.5S`
fn format_interval(interval: &PgInterval) -> String {
    let mut out = String::from("P");
    let (years, months) = (interval.months / 12, interval.months % 12);
    if years != 0 {
        out.push_str(&format!("{}Y", years));
    }
    if months != 0 {
        out.push_str(&format!("{}M", months));
    }
    if interval.days != 0 {
        out.push_str(&format!("{}D", interval.days));
    }

    let micros = interval.microseconds;
    if micros != 0 {
        let sign = if micros < 0 { "-" } else { "" };
        let abs = micros.unsigned_abs();
        let hours = abs / 3_600_000_000;
        let minutes = abs / 60_000_000 % 60;
        let seconds = abs / 1_000_000 % 60;
        let fraction = abs % 1_000_000;

        out.push('T');
        if hours != 0 {
            out.push_str(&format!("{}{}H", sign, hours));
        }
        if minutes != 0 {
            out.push_str(&format!("{}{}M", sign, minutes));
        }
        if fraction != 0 {
            let fraction = format!("{:06}", fraction);
            out.push_str(&format!("{}{}.{}S", sign, seconds, fraction.trim_end_matches('0')));
        } else if seconds != 0 {
            out.push_str(&format!("{}{}S", sign, seconds));
        }
    }

    if out == "P" {
        out.push_str("T0S");
    }
    out
}

/// Binary INET/CIDR: family, prefix bits, cidr flag, address length, address
fn format_inet(bytes: &[u8]) -> Option<String> {
    let [family, bits, is_cidr, len, address @ ..] = bytes else {
        return None;
    };
    let (address, full) = match (*family, *len) {
        (2, 4) => (IpAddr::from(<[u8; 4]>::try_from(address).ok()?), 32),
        (3, 16) => (IpAddr::from(<[u8; 16]>::try_from(address).ok()?), 128),
        _ => return None,
    };

    if *is_cidr != 0 || *bits != full {
        Some(format!("{}/{}", address, bits))
    } else {
        Some(address.to_string())
    }
}

fn array<T>(items: Vec<Option<T>>, to_value: impl Fn(T) -> Value) -> Value {
    Value::Array(
        items
            .into_iter()
            .map(|item| item.map(&to_value).unwrap_or(Value::Null))
            .collect(),
    )
}

/// Text when the wire bytes are UTF-8, base64 otherwise
fn raw_value(bytes: &[u8]) -> Value {
    match std::str::from_utf8(bytes) {
        Ok(text) => Value::String(text.to_string()),
        Err(_) => Value::String(BASE64.encode(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_table_ref_is_schema_qualified() {
        let dialect = PostgresDialect::new("public");
        assert_eq!(dialect.table_ref("faq"), "\"public\".\"faq\"");
        assert_eq!(dialect.placeholder(3), "$3");
    }

    #[test]
    fn test_catalog_statements_bind_names() {
        let dialect = PostgresDialect::new("site");
        let statement = dialect.columns("studios");
        assert_eq!(
            statement.params,
            vec![SqlParam::from("site"), SqlParam::from("studios")]
        );
        assert!(!statement.sql.contains("studios"));
    }

    #[test]
    fn test_parse_index_definition() {
        let dialect = PostgresDialect::new("public");
        let index = dialect
            .parse_index(&row(json!({
                "name": "contacts_email_key",
                "definition": "CREATE UNIQUE INDEX contacts_email_key ON public.contacts USING btree (email)"
            })))
            .unwrap();

        assert!(index.is_unique);
        assert_eq!(index.kind, "btree");

        let index = dialect
            .parse_index(&row(json!({"name": "odd", "definition": null})))
            .unwrap();
        assert!(!index.is_unique);
        assert_eq!(index.kind, "unknown");
    }

    #[test]
    fn test_parse_column() {
        let dialect = PostgresDialect::new("public");
        let column = dialect
            .parse_column(&row(json!({
                "name": "id",
                "data_type": "integer",
                "nullable": false,
                "default_value": "nextval('faq_id_seq'::regclass)",
                "is_primary_key": true
            })))
            .unwrap();

        assert!(!column.nullable);
        assert!(column.is_primary_key);
        assert_eq!(
            column.default_value.as_deref(),
            Some("nextval('faq_id_seq'::regclass)")
        );
    }

    #[test]
    fn test_numeric_value() {
        assert_eq!(numeric_value(Decimal::new(1999, 2)), json!(19.99));
        assert_eq!(numeric_value(Decimal::new(2500, 2)), json!(25));
        assert_eq!(numeric_value(Decimal::new(250, 2)), json!(2.5));
        assert_eq!(numeric_value(Decimal::new(-7, 0)), json!(-7));

        // AVG output carries more digits than an f64 holds
        let avg: Decimal = "33.3333333333333333".parse().unwrap();
        assert_eq!(numeric_value(avg), json!("33.3333333333333333"));
    }

    #[test]
    fn test_numeric_special() {
        assert_eq!(numeric_special(&[0, 0, 0, 0, 0xC0, 0, 0, 0]), Some("NaN"));
        assert_eq!(numeric_special(&[0, 0, 0, 0, 0xD0, 0, 0, 0]), Some("Infinity"));
        assert_eq!(numeric_special(&[0, 0, 0, 0, 0xF0, 0, 0, 0]), Some("-Infinity"));
        assert_eq!(numeric_special(&[0, 1, 0, 0, 0, 0, 0, 2, 0, 7]), None);
        assert_eq!(numeric_special(&[0, 0]), None);
    }

    #[test]
    fn test_format_interval() {
        let interval = |months, days, microseconds| PgInterval {
            months,
            days,
            microseconds,
        };
        assert_eq!(format_interval(&interval(0, 0, 0)), "PT0S");
        assert_eq!(format_interval(&interval(14, 3, 0)), "P1Y2M3D");
        assert_eq!(format_interval(&interval(0, 0, 3_723_500_000)), "PT1H2M3.5S");
        assert_eq!(format_interval(&interval(0, 1, -90_000_000)), "P1DT-1M-30S");
    }

    #[test]
    fn test_format_inet() {
        assert_eq!(
            format_inet(&[2, 32, 0, 4, 192, 168, 0, 1]).as_deref(),
            Some("192.168.0.1")
        );
        assert_eq!(
            format_inet(&[2, 24, 1, 4, 10, 0, 0, 0]).as_deref(),
            Some("10.0.0.0/24")
        );
        let mut v6 = vec![3, 128, 0, 16];
        v6.extend_from_slice(&[0; 15]);
        v6.push(1);
        assert_eq!(format_inet(&v6).as_deref(), Some("::1"));
        assert_eq!(format_inet(&[2, 32, 0, 4, 1]), None);
    }

    #[test]
    fn test_raw_value() {
        assert_eq!(raw_value(b"happy"), json!("happy"));
        assert_eq!(raw_value(&[0xFF, 0xD8, 0xFF]), json!("/9j/"));
    }
}
