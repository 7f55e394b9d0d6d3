use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown column '{column}' on table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Forbidden query: {0}")]
    ForbiddenQuery(QueryRejection),

    #[error("Query execution failed: {0}")]
    Execution(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Why the query safety validator refused a piece of SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRejection {
    /// The trimmed text does not begin with `select`.
    NotSelect,
    /// A denylisted keyword occurs somewhere in the text.
    ForbiddenKeyword(&'static str),
}

impl fmt::Display for QueryRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryRejection::NotSelect => write!(f, "only SELECT queries are allowed"),
            QueryRejection::ForbiddenKeyword(keyword) => {
                write!(f, "query contains forbidden keyword '{}'", keyword)
            }
        }
    }
}

impl Error {
    /// Helper for creating configuration errors
    ///
    /// # Example
    /// ```
    /// use dbx_core::Error;
    /// let err = Error::config_error("missing database url");
    /// ```
    pub fn config_error(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Helper for wrapping an engine failure, keeping its message verbatim
    pub fn execution(err: impl fmt::Display) -> Self {
        Error::Execution(err.to_string())
    }

    /// True for the "name not in the live catalog" family of errors
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::UnknownTable(_) | Error::UnknownColumn { .. })
    }
}
