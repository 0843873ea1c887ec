//! Database error types.

use thiserror::Error;

/// Errors from the data-access layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Could not open or connect to the database.
    #[error("failed to open database: {0}")]
    Open(#[source] sqlx::Error),

    /// Schema bootstrap failed.
    #[error("schema migration failed: {0}")]
    Migrate(#[source] sqlx::Error),

    /// Query execution failed.
    #[error(transparent)]
    Query(#[from] sqlx::Error),

    /// A timestamp column held something other than RFC 3339 text.
    #[error("malformed timestamp in column {column}: {source}")]
    Timestamp {
        column: &'static str,
        #[source]
        source: chrono::ParseError,
    },

    /// A column held a value outside its expected domain.
    #[error("malformed value in column {column}: {value:?}")]
    Column {
        column: &'static str,
        value: String,
    },
}

/// Whether an error is a UNIQUE constraint rejection.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
