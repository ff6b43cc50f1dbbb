//! CSV to survey-hierarchy importer for the Flourish Wellness database.
//!
//! Ingests a flat three-column file (Section, Subsection, Question) and
//! materializes it into the normalized schema: a self-referencing `Sections`
//! table and a `Questions` table referencing the owning section. Imports are
//! idempotent - sections dedup by (name, parent, scope), questions by
//! (text, section, scope) - so rerunning a file is always safe.
//!
//! ```rust,ignore
//! use flourish_db::DbConnection;
//! use flourish_import::import_csv;
//!
//! let conn = DbConnection::open_from_url("sqlite:flourish.db")?;
//! let file = std::fs::File::open("questions.csv")?;
//! let stats = import_csv(file, &conn)?;
//! println!("{stats}");
//! ```
//!
//! The schema may optionally carry a `SurveyEntityId` tenant column on
//! either table; when it does, the importer resolves the active survey from
//! `SurveyEntities` before any row is processed and stamps it onto every
//! created row.

pub mod cache;
pub mod engine;
pub mod error;
pub mod probe;
pub mod row;
pub mod scope;
pub mod stats;
pub mod store;

pub use engine::{import_csv, import_csv_with_options, ImportOptions};
pub use error::{ImportError, Result};
pub use probe::Capabilities;
pub use stats::ImportStats;
