//! Engine-specific SQL used by the catalog reader

use crate::types::{ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor, Row};

/// Relational engines the explorer can introspect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
}

impl Backend {
    /// Pick the engine from a connection URL scheme
    pub fn from_url(url: &str) -> Option<Self> {
        let url = url.trim_start();
        if url.starts_with("sqlite:") {
            Some(Backend::Sqlite)
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Some(Backend::Postgres)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Sqlite => "sqlite",
            Backend::Postgres => "postgres",
        }
    }
}

/// A bound statement parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Int(value)
    }
}

impl From<f64> for SqlParam {
    fn from(value: f64) -> Self {
        SqlParam::Float(value)
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

/// SQL text plus the parameters it binds
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, param: impl Into<SqlParam>) -> Self {
        self.params.push(param.into());
        self
    }
}

/// Quote an identifier with double quotes, doubling any embedded quote.
///
/// Both SQLite and PostgreSQL accept this form.
pub fn quote_identifier(identifier: &str) -> String {
    let escaped = identifier.replace('"', r#""""#);
    format!("\"{escaped}\"")
}

/// Escape character used by [`like_pattern`]
pub const LIKE_ESCAPE: char = '\\';

/// Substring pattern for `LIKE ... ESCAPE '\'` that matches `term` literally
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Catalog queries and their row parsers for one engine.
///
/// Table names handed to these methods must already be resolved against the
/// live catalog: some engines only accept them interpolated.
pub trait Dialect: Send + Sync {
    fn backend(&self) -> Backend;

    /// Positional placeholder for the 1-based parameter `index`
    fn placeholder(&self, index: usize) -> String;

    /// Case-insensitive pattern match operator
    fn like_operator(&self) -> &'static str;

    /// Fully qualified, quoted table reference for data queries
    fn table_ref(&self, table: &str) -> String {
        quote_identifier(table)
    }

    fn list_tables(&self) -> Statement;

    fn columns(&self, table: &str) -> Statement;

    fn parse_column(&self, row: &Row) -> Option<ColumnDescriptor>;

    fn foreign_keys(&self, table: &str) -> Statement;

    fn parse_foreign_key(&self, table: &str, row: &Row) -> Option<ForeignKeyDescriptor>;

    fn indexes(&self, table: &str) -> Statement;

    fn parse_index(&self, row: &Row) -> Option<IndexDescriptor>;

    /// Single row with a `name` column
    fn database_name(&self) -> Statement;

    /// Single row with a `size` column holding bytes
    fn database_size(&self) -> Statement;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_url() {
        assert_eq!(Backend::from_url("sqlite::memory:"), Some(Backend::Sqlite));
        assert_eq!(
            Backend::from_url("sqlite:///var/lib/admin.db?mode=ro"),
            Some(Backend::Sqlite)
        );
        assert_eq!(
            Backend::from_url("postgresql://user@localhost/site"),
            Some(Backend::Postgres)
        );
        assert_eq!(Backend::from_url("mysql://localhost/site"), None);
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("faq"), "\"faq\"");
        assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("studio"), "%studio%");
        assert_eq!(like_pattern("50%"), r"%50\%%");
        assert_eq!(like_pattern("a_b"), r"%a\_b%");
        assert_eq!(like_pattern(r"c:\tmp"), r"%c:\\tmp%");
    }
}
