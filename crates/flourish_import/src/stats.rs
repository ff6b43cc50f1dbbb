//! Run statistics returned to the caller.

use serde::Serialize;

/// Counters accumulated over one import run.
///
/// All counters are monotonic within a run and never persisted.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    /// Top-level sections created.
    pub sections: u64,
    /// Subsections created.
    pub subsections: u64,
    /// Questions inserted.
    pub questions: u64,
    /// Question-bearing rows whose text already existed under the target section.
    pub duplicate_questions: u64,
    /// Rows discarded: headers, empty rows, question-less rows, failed inserts.
    pub skipped: u64,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Sections created: {}", self.sections)?;
        writeln!(f, "Subsections created: {}", self.subsections)?;
        writeln!(f, "Questions created: {}", self.questions)?;
        writeln!(f, "Duplicate questions skipped: {}", self.duplicate_questions)?;
        write!(f, "Rows skipped: {}", self.skipped)
    }
}
