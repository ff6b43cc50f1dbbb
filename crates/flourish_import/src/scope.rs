//! Survey-scope resolution.
//!
//! The importer never creates survey entities; it only picks which existing
//! one owns the imported rows. Preference order: the most recently created
//! Active survey, then the most recently created survey overall, then none.

use crate::error::{ImportError, Result};
use flourish_db::{DbConnection, DbValue};

pub const SURVEY_TABLE: &str = "SurveyEntities";

/// `SurveyEntityStatus.Active` in the owning application (Archived = 1).
pub const STATUS_ACTIVE: i64 = 2;

/// Resolve the active scope identifier, or `None` when the schema has no
/// `SurveyEntities` table.
///
/// "Most recently created" orders by `CreatedAt` (ISO-8601 text, so
/// lexicographic order is chronological) with `Id` as tie-breaker.
pub fn resolve_scope(conn: &DbConnection) -> Result<Option<i64>> {
    if !conn.table_exists(SURVEY_TABLE)? {
        return Ok(None);
    }

    let active: Option<i64> = conn.query_scalar_optional(
        "SELECT Id FROM SurveyEntities WHERE Status = ? \
             ORDER BY CreatedAt DESC, Id DESC LIMIT 1",
        &[DbValue::from(STATUS_ACTIVE)],
    )?;
    if active.is_some() {
        return Ok(active);
    }

    Ok(conn.query_scalar_optional(
        "SELECT Id FROM SurveyEntities ORDER BY CreatedAt DESC, Id DESC LIMIT 1",
        &[],
    )?)
}

/// Check that an explicitly requested survey id exists.
///
/// When the schema has no `SurveyEntities` table there is nothing to check
/// against and the id is taken at face value.
pub fn validate_survey(conn: &DbConnection, survey_id: i64) -> Result<()> {
    if !conn.table_exists(SURVEY_TABLE)? {
        return Ok(());
    }

    let found: Option<i64> = conn.query_scalar_optional(
        "SELECT Id FROM SurveyEntities WHERE Id = ?",
        &[DbValue::from(survey_id)],
    )?;
    match found {
        Some(_) => Ok(()),
        None => Err(ImportError::SurveyNotFound(survey_id)),
    }
}
