//! Dialect-adapter store: the four logical operations the engine needs.
//!
//! SQL is assembled from the capability descriptor (scope predicates and
//! columns appear only when the table carries them); anything truly
//! backend-specific - generated-id retrieval, metadata reflection - is
//! already folded into `flourish_db::DbConnection`, so the engine never sees
//! a dialect tag.

use crate::probe::Capabilities;
use flourish_db::{DbConnection, DbError, DbValue};

pub struct SurveyStore<'a> {
    conn: &'a DbConnection,
    caps: &'a Capabilities,
    scope: Option<i64>,
}

impl<'a> SurveyStore<'a> {
    pub fn new(conn: &'a DbConnection, caps: &'a Capabilities, scope: Option<i64>) -> Self {
        Self { conn, caps, scope }
    }

    pub fn scope(&self) -> Option<i64> {
        self.scope
    }

    /// Find a section by exact name under the given parent (None = top-level),
    /// within the run's scope when `Sections` is scoped.
    pub fn find_section(&self, name: &str, parent: Option<i64>) -> Result<Option<i64>, DbError> {
        let mut sql = String::from("SELECT Id FROM Sections WHERE Name = ?");
        let mut params = vec![DbValue::from(name)];

        match parent {
            Some(parent_id) => {
                sql.push_str(" AND ParentSectionId = ?");
                params.push(DbValue::from(parent_id));
            }
            None => sql.push_str(" AND ParentSectionId IS NULL"),
        }

        if self.caps.sections_scoped {
            if let Some(scope) = self.scope {
                sql.push_str(" AND SurveyEntityId = ?");
                params.push(DbValue::from(scope));
            }
        }

        sql.push_str(" LIMIT 1");
        self.conn.query_scalar_optional(&sql, &params)
    }

    /// Insert a section and return its generated id.
    pub fn insert_section(&self, name: &str, parent: Option<i64>) -> Result<i64, DbError> {
        let mut columns = vec!["Name", "ParentSectionId"];
        let mut params = vec![DbValue::from(name), DbValue::from(parent)];

        if self.caps.sections_scoped {
            columns.push("SurveyEntityId");
            params.push(DbValue::from(self.scope));
        }

        let sql = insert_sql("Sections", &columns);
        self.conn.insert_returning_id(&sql, &params)
    }

    /// Find a question by exact text under a section. The duplicate key
    /// includes the scope when `Questions` is scoped: the same text under the
    /// same section but a different survey is a distinct question.
    pub fn find_question(&self, text: &str, section_id: i64) -> Result<Option<i64>, DbError> {
        let mut sql = String::from("SELECT Id FROM Questions WHERE Text = ? AND SectionId = ?");
        let mut params = vec![DbValue::from(text), DbValue::from(section_id)];

        if self.caps.questions_scoped {
            if let Some(scope) = self.scope {
                sql.push_str(" AND SurveyEntityId = ?");
                params.push(DbValue::from(scope));
            }
        }

        sql.push_str(" LIMIT 1");
        self.conn.query_scalar_optional(&sql, &params)
    }

    /// Insert a question and return its generated id.
    pub fn insert_question(&self, text: &str, section_id: i64) -> Result<i64, DbError> {
        let mut columns = vec!["Text", "SectionId"];
        let mut params = vec![DbValue::from(text), DbValue::from(section_id)];

        if self.caps.questions_scoped {
            columns.push("SurveyEntityId");
            params.push(DbValue::from(self.scope));
        }

        let sql = insert_sql("Questions", &columns);
        self.conn.insert_returning_id(&sql, &params)
    }
}

fn insert_sql(table: &str, columns: &[&str]) -> String {
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::probe;

    fn unscoped_db() -> DbConnection {
        let conn = DbConnection::open_sqlite_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE Sections (
                Id INTEGER PRIMARY KEY AUTOINCREMENT,
                Name TEXT NOT NULL,
                ParentSectionId INTEGER REFERENCES Sections(Id)
            );
            CREATE TABLE Questions (
                Id INTEGER PRIMARY KEY AUTOINCREMENT,
                Text TEXT NOT NULL,
                SectionId INTEGER NOT NULL REFERENCES Sections(Id)
            )",
        )
        .unwrap();
        conn
    }

    fn scoped_db() -> DbConnection {
        let conn = DbConnection::open_sqlite_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE Sections (
                Id INTEGER PRIMARY KEY AUTOINCREMENT,
                Name TEXT NOT NULL,
                ParentSectionId INTEGER REFERENCES Sections(Id),
                SurveyEntityId INTEGER NOT NULL
            );
            CREATE TABLE Questions (
                Id INTEGER PRIMARY KEY AUTOINCREMENT,
                Text TEXT NOT NULL,
                SectionId INTEGER NOT NULL REFERENCES Sections(Id),
                SurveyEntityId INTEGER NOT NULL
            )",
        )
        .unwrap();
        conn
    }

    #[test]
    fn top_level_and_child_sections_resolve_separately() {
        let conn = unscoped_db();
        let caps = probe(&conn).unwrap();
        let store = SurveyStore::new(&conn, &caps, None);

        let parent = store.insert_section("Wellness", None).unwrap();
        let child = store.insert_section("Wellness", Some(parent)).unwrap();

        assert_eq!(store.find_section("Wellness", None).unwrap(), Some(parent));
        assert_eq!(
            store.find_section("Wellness", Some(parent)).unwrap(),
            Some(child)
        );
        assert_eq!(store.find_section("Missing", None).unwrap(), None);
    }

    #[test]
    fn scoped_lookups_filter_by_survey() {
        let conn = scoped_db();
        let caps = probe(&conn).unwrap();

        let store_a = SurveyStore::new(&conn, &caps, Some(1));
        let store_b = SurveyStore::new(&conn, &caps, Some(2));

        let id_a = store_a.insert_section("Wellness", None).unwrap();
        assert_eq!(store_a.find_section("Wellness", None).unwrap(), Some(id_a));
        assert_eq!(store_b.find_section("Wellness", None).unwrap(), None);
    }

    #[test]
    fn question_duplicate_key_includes_scope() {
        let conn = scoped_db();
        let caps = probe(&conn).unwrap();

        let store_a = SurveyStore::new(&conn, &caps, Some(1));
        let store_b = SurveyStore::new(&conn, &caps, Some(2));

        let section = store_a.insert_section("Wellness", None).unwrap();
        let question = store_a.insert_question("Any gym on site?", section).unwrap();

        assert_eq!(
            store_a.find_question("Any gym on site?", section).unwrap(),
            Some(question)
        );
        assert_eq!(
            store_b.find_question("Any gym on site?", section).unwrap(),
            None
        );
    }
}
