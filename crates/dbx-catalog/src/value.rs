//! Helpers for reading catalog rows that arrive as JSON objects

use crate::types::Row;
use serde_json::Value;

/// String value of a column, `None` for NULL or a missing key
pub(crate) fn text(row: &Row, key: &str) -> Option<String> {
    row.get(key).and_then(display)
}

/// Integer value of a column, accepting numeric strings
pub(crate) fn int(row: &Row, key: &str) -> Option<i64> {
    match row.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Boolean value of a column; SQLite reports flags as 0/1
pub(crate) fn flag(row: &Row, key: &str) -> bool {
    match row.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(_) => int(row, key).is_some_and(|v| v != 0),
        None => false,
    }
}

/// Non-negative count, 0 for anything unreadable
pub(crate) fn count(row: &Row, key: &str) -> u64 {
    int(row, key).and_then(|v| u64::try_from(v).ok()).unwrap_or(0)
}

/// Render a scalar as text
pub(crate) fn display(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
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
    fn test_reads_sqlite_style_flags() {
        let r = row(json!({"notnull": 1, "pk": 0, "unique": "1"}));
        assert!(flag(&r, "notnull"));
        assert!(!flag(&r, "pk"));
        assert!(flag(&r, "unique"));
        assert!(!flag(&r, "missing"));
    }

    #[test]
    fn test_text_and_count() {
        let r = row(json!({"name": "faq", "dflt": null, "n": 7, "neg": -1}));
        assert_eq!(text(&r, "name").as_deref(), Some("faq"));
        assert_eq!(text(&r, "dflt"), None);
        assert_eq!(text(&r, "n").as_deref(), Some("7"));
        assert_eq!(count(&r, "n"), 7);
        assert_eq!(count(&r, "neg"), 0);
    }
}
