//! Hierarchy upsert engine.
//!
//! One pass over the tabular input: each data row resolves (or creates) its
//! top-level section, then its subsection when present, then inserts the
//! question unless it already exists under the resolved leaf section. All
//! writes happen in a single transaction committed at the end of the run.

use std::io::Read;

use tracing::{debug, info, warn};

use crate::cache::SectionCache;
use crate::error::{ImportError, Result};
use crate::probe::{self, Capabilities};
use crate::row::{self, DataRow, RowKind};
use crate::scope;
use crate::stats::ImportStats;
use crate::store::SurveyStore;
use flourish_db::{DbConnection, DbError};

/// Caller-supplied knobs for one run.
#[derive(Debug, Default, Clone)]
pub struct ImportOptions {
    /// Import into this survey entity instead of resolving the active one.
    pub survey_id: Option<i64>,
}

/// Outcome of the question step for one row.
///
/// A failed insert is data, not control flow: the engine logs it and counts
/// the row as skipped without aborting the run.
enum QuestionOutcome {
    Created,
    Duplicate,
    Failed(DbError),
}

/// Import a CSV stream into the database, resolving the scope automatically.
pub fn import_csv<R: Read>(reader: R, conn: &DbConnection) -> Result<ImportStats> {
    import_csv_with_options(reader, conn, &ImportOptions::default())
}

/// Import a CSV stream into the database.
///
/// Pre-flight (schema probe, scope resolution) runs before the first row is
/// read; pre-flight failures abort with zero writes. The row loop runs in
/// one transaction, committed once at the end - a fatal mid-run error rolls
/// everything back.
pub fn import_csv_with_options<R: Read>(
    reader: R,
    conn: &DbConnection,
    options: &ImportOptions,
) -> Result<ImportStats> {
    let caps = probe::probe(conn)?;

    let scope = match options.survey_id {
        Some(survey_id) => {
            scope::validate_survey(conn, survey_id)?;
            Some(survey_id)
        }
        None => scope::resolve_scope(conn)?,
    };

    if caps.requires_scope() && scope.is_none() {
        return Err(ImportError::ScopeRequired);
    }

    info!(
        dialect = caps.dialect.name(),
        sections_scoped = caps.sections_scoped,
        questions_scoped = caps.questions_scoped,
        survey = scope,
        "Starting import"
    );

    conn.begin()?;
    match run_rows(reader, conn, &caps, scope) {
        Ok(stats) => {
            conn.commit()?;
            info!(
                sections = stats.sections,
                subsections = stats.subsections,
                questions = stats.questions,
                duplicate_questions = stats.duplicate_questions,
                skipped = stats.skipped,
                "Import committed"
            );
            Ok(stats)
        }
        Err(err) => {
            if let Err(rollback_err) = conn.rollback() {
                warn!(error = %rollback_err, "Rollback failed after import error");
            }
            Err(err)
        }
    }
}

fn run_rows<R: Read>(
    reader: R,
    conn: &DbConnection,
    caps: &Capabilities,
    scope: Option<i64>,
) -> Result<ImportStats> {
    let mut importer = Importer {
        store: SurveyStore::new(conn, caps, scope),
        cache: SectionCache::new(),
        stats: ImportStats::default(),
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    for record in csv_reader.records() {
        importer.process_record(&record?)?;
    }

    Ok(importer.stats)
}

struct Importer<'a> {
    store: SurveyStore<'a>,
    cache: SectionCache,
    stats: ImportStats,
}

impl Importer<'_> {
    fn process_record(&mut self, record: &csv::StringRecord) -> Result<()> {
        match row::classify(record) {
            RowKind::Header | RowKind::Empty => {
                self.stats.skipped += 1;
                Ok(())
            }
            RowKind::Data(data) => self.process_row(&data),
        }
    }

    fn process_row(&mut self, row: &DataRow) -> Result<()> {
        // The normalizer never emits an empty section; re-check anyway.
        if row.section.is_empty() {
            self.stats.skipped += 1;
            return Ok(());
        }

        let section_id = self.resolve_section(&row.section)?;

        let target_id = if row.subsection.is_empty() {
            section_id
        } else {
            self.resolve_subsection(&row.section, &row.subsection, section_id)?
        };

        if row.question.is_empty() {
            // Section/subsection-only rows are legitimate but carry no question.
            self.stats.skipped += 1;
            return Ok(());
        }

        match self.upsert_question(&row.question, target_id) {
            QuestionOutcome::Created => self.stats.questions += 1,
            QuestionOutcome::Duplicate => self.stats.duplicate_questions += 1,
            QuestionOutcome::Failed(err) => {
                warn!(question = %row.question, error = %err, "Question insert failed, row skipped");
                self.stats.skipped += 1;
            }
        }

        Ok(())
    }

    fn resolve_section(&mut self, name: &str) -> Result<i64> {
        let key = SectionCache::section_key(name);
        if let Some(id) = self.cache.get(&key) {
            return Ok(id);
        }

        let id = match self.store.find_section(name, None)? {
            Some(id) => id,
            None => {
                let id = self.store.insert_section(name, None)?;
                self.stats.sections += 1;
                debug!(section = name, id, "Created section");
                id
            }
        };

        self.cache.insert(key, id);
        Ok(id)
    }

    fn resolve_subsection(&mut self, section: &str, subsection: &str, parent_id: i64) -> Result<i64> {
        let key = SectionCache::subsection_key(section, subsection, self.store.scope());
        if let Some(id) = self.cache.get(&key) {
            return Ok(id);
        }

        let id = match self.store.find_section(subsection, Some(parent_id))? {
            Some(id) => id,
            None => {
                let id = self.store.insert_section(subsection, Some(parent_id))?;
                self.stats.subsections += 1;
                debug!(section, subsection, id, "Created subsection");
                id
            }
        };

        self.cache.insert(key, id);
        Ok(id)
    }

    fn upsert_question(&mut self, text: &str, section_id: i64) -> QuestionOutcome {
        match self.store.find_question(text, section_id) {
            Ok(Some(_)) => QuestionOutcome::Duplicate,
            Ok(None) => match self.store.insert_question(text, section_id) {
                Ok(_) => QuestionOutcome::Created,
                Err(err) => QuestionOutcome::Failed(err),
            },
            Err(err) => QuestionOutcome::Failed(err),
        }
    }
}
