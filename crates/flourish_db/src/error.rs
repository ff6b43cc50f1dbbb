//! Error types for the database layer.

use thiserror::Error;

/// Database operation result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// SQLite error (connection, statement, constraint, etc.)
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// DuckDB error (connection, statement, constraint, etc.)
    #[cfg(feature = "duckdb")]
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// Query returned an unexpected shape (e.g. no row where one was required).
    #[error("Query error: {0}")]
    Query(String),

    /// A column value could not be converted to the requested Rust type.
    #[error("Type conversion error: {0}")]
    TypeConversion(String),

    /// The connection URL does not name a supported backend.
    #[error("Unsupported database URL: {0}")]
    UnsupportedUrl(String),

    /// The requested backend was compiled out.
    #[error("Backend not available: {0}")]
    NotAvailable(String),
}
