//! Error taxonomy for an import run.
//!
//! Everything here is fatal: it aborts the run before or during the row loop
//! and rolls back the transaction. A failed insert of a single question is
//! deliberately NOT an error - the engine logs it and counts the row as
//! skipped (see `engine::QuestionOutcome`).

use flourish_db::DbError;
use thiserror::Error;

/// Import operation result type.
pub type Result<T> = std::result::Result<T, ImportError>;

/// Fatal import errors.
#[derive(Debug, Error)]
pub enum ImportError {
    /// A required base table is absent. Raised pre-flight, before any write.
    #[error("Required table '{0}' is missing from the target database")]
    MissingTable(String),

    /// The schema carries a scope column but no survey entity could be
    /// resolved. Raised pre-flight, before any row is read.
    #[error("Schema requires a survey scope but no survey entity could be resolved")]
    ScopeRequired,

    /// An explicitly requested survey id has no row in SurveyEntities.
    #[error("Survey entity {0} does not exist")]
    SurveyNotFound(i64),

    /// Connection, statement, or commit failure.
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    /// Malformed tabular input (the `csv` crate could not produce a record).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
