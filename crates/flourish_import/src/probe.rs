//! Schema probe: what does the target database actually look like?
//!
//! Runs once, before the row loop. A missing base table aborts the run here,
//! guaranteeing no partial schema-incompatible writes.

use crate::error::{ImportError, Result};
use flourish_db::{DbConnection, Dialect};

pub const SECTIONS_TABLE: &str = "Sections";
pub const QUESTIONS_TABLE: &str = "Questions";

/// Tenant-scope column, optional on either table independently.
pub const SCOPE_COLUMN: &str = "SurveyEntityId";

/// Run-scoped, read-only descriptor of the target schema's optional features.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub dialect: Dialect,
    /// `Sections` carries a `SurveyEntityId` column.
    pub sections_scoped: bool,
    /// `Questions` carries a `SurveyEntityId` column.
    pub questions_scoped: bool,
}

impl Capabilities {
    /// Whether a resolved scope value is a hard precondition for the run.
    pub fn requires_scope(&self) -> bool {
        self.sections_scoped || self.questions_scoped
    }
}

/// Inspect the target database and build the capability descriptor.
pub fn probe(conn: &DbConnection) -> Result<Capabilities> {
    for table in [SECTIONS_TABLE, QUESTIONS_TABLE] {
        if !conn.table_exists(table)? {
            return Err(ImportError::MissingTable(table.to_string()));
        }
    }

    Ok(Capabilities {
        dialect: conn.dialect(),
        sections_scoped: conn.column_exists(SECTIONS_TABLE, SCOPE_COLUMN)?,
        questions_scoped: conn.column_exists(QUESTIONS_TABLE, SCOPE_COLUMN)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_fails_on_missing_sections_table() {
        let conn = DbConnection::open_sqlite_memory().unwrap();
        conn.execute_batch("CREATE TABLE Questions (Id INTEGER PRIMARY KEY, Text TEXT)")
            .unwrap();

        let err = probe(&conn).unwrap_err();
        assert!(matches!(err, ImportError::MissingTable(t) if t == "Sections"));
    }

    #[test]
    fn probe_fails_on_missing_questions_table() {
        let conn = DbConnection::open_sqlite_memory().unwrap();
        conn.execute_batch("CREATE TABLE Sections (Id INTEGER PRIMARY KEY, Name TEXT)")
            .unwrap();

        let err = probe(&conn).unwrap_err();
        assert!(matches!(err, ImportError::MissingTable(t) if t == "Questions"));
    }

    #[test]
    fn probe_detects_scope_columns_independently() {
        let conn = DbConnection::open_sqlite_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE Sections (Id INTEGER PRIMARY KEY, Name TEXT, \
                 ParentSectionId INTEGER, SurveyEntityId INTEGER);
             CREATE TABLE Questions (Id INTEGER PRIMARY KEY, Text TEXT, SectionId INTEGER)",
        )
        .unwrap();

        let caps = probe(&conn).unwrap();
        assert!(caps.sections_scoped);
        assert!(!caps.questions_scoped);
        assert!(caps.requires_scope());
    }

    #[test]
    fn probe_unscoped_schema() {
        let conn = DbConnection::open_sqlite_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE Sections (Id INTEGER PRIMARY KEY, Name TEXT, ParentSectionId INTEGER);
             CREATE TABLE Questions (Id INTEGER PRIMARY KEY, Text TEXT, SectionId INTEGER)",
        )
        .unwrap();

        let caps = probe(&conn).unwrap();
        assert!(!caps.requires_scope());
    }
}
