use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Node kind outside what the compiler understands
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("Unsupported method '{0}': only Contains, StartsWith and EndsWith are translated")]
    UnsupportedMethod(String),

    #[error("Unsupported projection for field '{field}': {reason}")]
    UnsupportedProjection { field: String, reason: String },

    /// Neither or both comparison operands resolve to a document path
    #[error("Ambiguous comparison: {0}")]
    AmbiguousComparison(String),

    #[error("Invalid array index: {0}")]
    InvalidIndex(String),

    #[error("Failed to read schema of table '{table}': {message}")]
    SchemaReadFailure { table: String, message: String },

    #[error(
        "Virtual column conflict on '{table}' for {path}: registered as {existing}, requested {requested}"
    )]
    VirtualColumnConflict {
        table: String,
        path: String,
        existing: String,
        requested: String,
    },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

impl QueryError {
    /// Only schema reads touch I/O during compilation; everything else
    /// needs the caller to change the expression.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SchemaReadFailure { .. })
    }

    /// Schema read failure; providers use it for missing tables
    pub fn schema_read(table: &str, message: impl Into<String>) -> Self {
        Self::SchemaReadFailure {
            table: table.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;

impl<T> From<std::sync::PoisonError<T>> for QueryError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
