//! Query safety validator for ad-hoc SQL
//!
//! A denylist, not a parser. The text must start with `select` and must not
//! contain any forbidden keyword anywhere, matched as a plain substring of
//! the lower-cased text. That rejects some harmless queries (a column named
//! `update_count`, a string literal mentioning "created") and those false
//! positives are accepted.
//!
//! Known limitation: this only guards against direct use of the forbidden
//! verbs. It does not look at statement separators, so it is not a general
//! defence against everything that can be smuggled into a SELECT.

use dbx_core::QueryRejection;

/// Keywords that reject a query wherever they appear
pub const FORBIDDEN_KEYWORDS: [&str; 7] = [
    "insert", "update", "delete", "drop", "create", "alter", "truncate",
];

/// Accept or reject raw SQL text before it reaches the connection
pub fn validate(sql: &str) -> Result<(), QueryRejection> {
    let normalized = sql.trim().to_lowercase();

    if !normalized.starts_with("select") {
        return Err(QueryRejection::NotSelect);
    }

    match FORBIDDEN_KEYWORDS
        .iter()
        .find(|keyword| normalized.contains(*keyword))
    {
        Some(keyword) => Err(QueryRejection::ForbiddenKeyword(*keyword)),
        None => Ok(()),
    }
}
