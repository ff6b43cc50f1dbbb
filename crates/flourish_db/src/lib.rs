//! Unified database layer for the Flourish survey importer.
//!
//! One synchronous connection type over two embedded backends:
//! - SQLite (always available)
//! - DuckDB (behind the `duckdb` feature)
//!
//! The importer core talks only to [`DbConnection`]; everything
//! backend-specific (parameter marshalling, metadata reflection, generated-id
//! retrieval) is resolved here.

mod dialect;
mod error;
mod value;

pub use dialect::Dialect;
pub use error::{DbError, Result};
pub use value::{DbRow, DbValue, FromDbValue};

use std::path::Path;
use tracing::{debug, info};

/// Unified database connection.
///
/// Dispatch is by enum, not trait object: the set of backends is closed and
/// known at compile time.
pub enum DbConnection {
    Sqlite(rusqlite::Connection),
    #[cfg(feature = "duckdb")]
    DuckDb(duckdb::Connection),
}

impl std::fmt::Debug for DbConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConnection")
            .field("backend", &self.dialect().name())
            .finish()
    }
}

impl DbConnection {
    /// Open a database from a URL.
    ///
    /// Supported schemes: `sqlite:PATH`, `duckdb:PATH`.
    pub fn open_from_url(url: &str) -> Result<Self> {
        if let Some(path) = url.strip_prefix("sqlite:") {
            return Self::open_sqlite(Path::new(path));
        }

        if let Some(path) = url.strip_prefix("duckdb:") {
            #[cfg(feature = "duckdb")]
            return Self::open_duckdb(Path::new(path));

            #[cfg(not(feature = "duckdb"))]
            {
                let _ = path;
                return Err(DbError::NotAvailable(
                    "DuckDB support is not compiled in (enable the `duckdb` feature)".to_string(),
                ));
            }
        }

        Err(DbError::UnsupportedUrl(url.to_string()))
    }

    /// Open a SQLite database file.
    pub fn open_sqlite(path: &Path) -> Result<Self> {
        let conn = rusqlite::Connection::open(path)?;
        info!(path = %path.display(), "Opened SQLite database");
        Ok(DbConnection::Sqlite(conn))
    }

    /// Open an in-memory SQLite database (for testing).
    pub fn open_sqlite_memory() -> Result<Self> {
        Ok(DbConnection::Sqlite(rusqlite::Connection::open_in_memory()?))
    }

    /// Open a DuckDB database file.
    #[cfg(feature = "duckdb")]
    pub fn open_duckdb(path: &Path) -> Result<Self> {
        let conn = duckdb::Connection::open(path)?;
        info!(path = %path.display(), "Opened DuckDB database");
        Ok(DbConnection::DuckDb(conn))
    }

    /// Open an in-memory DuckDB database (for testing).
    #[cfg(feature = "duckdb")]
    pub fn open_duckdb_memory() -> Result<Self> {
        Ok(DbConnection::DuckDb(duckdb::Connection::open_in_memory()?))
    }

    /// Dialect of the connected backend.
    pub fn dialect(&self) -> Dialect {
        match self {
            DbConnection::Sqlite(_) => Dialect::Sqlite,
            #[cfg(feature = "duckdb")]
            DbConnection::DuckDb(_) => Dialect::DuckDb,
        }
    }

    /// Execute a SQL statement, returning the number of affected rows.
    pub fn execute(&self, sql: &str, params: &[DbValue]) -> Result<usize> {
        debug!(op = sql_op_name(sql), "db.execute");
        match self {
            DbConnection::Sqlite(conn) => {
                let mut stmt = conn.prepare(sql)?;
                let changed = stmt.execute(rusqlite::params_from_iter(to_sqlite_params(params)))?;
                Ok(changed)
            }
            #[cfg(feature = "duckdb")]
            DbConnection::DuckDb(conn) => {
                let mut stmt = conn.prepare(sql)?;
                let duckdb_params = to_duckdb_params(params);
                let param_refs: Vec<&dyn duckdb::ToSql> = duckdb_params
                    .iter()
                    .map(|v| v as &dyn duckdb::ToSql)
                    .collect();
                Ok(stmt.execute(param_refs.as_slice())?)
            }
        }
    }

    /// Execute a batch of SQL statements without parameters.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        match self {
            DbConnection::Sqlite(conn) => Ok(conn.execute_batch(sql)?),
            #[cfg(feature = "duckdb")]
            DbConnection::DuckDb(conn) => Ok(conn.execute_batch(sql)?),
        }
    }

    /// Query and return all rows.
    pub fn query_all(&self, sql: &str, params: &[DbValue]) -> Result<Vec<DbRow>> {
        debug!(op = sql_op_name(sql), "db.query");
        match self {
            DbConnection::Sqlite(conn) => query_sqlite(conn, sql, params),
            #[cfg(feature = "duckdb")]
            DbConnection::DuckDb(conn) => query_duckdb(conn, sql, params),
        }
    }

    /// Query and return the first row, if any.
    pub fn query_optional(&self, sql: &str, params: &[DbValue]) -> Result<Option<DbRow>> {
        let rows = self.query_all(sql, params)?;
        Ok(rows.into_iter().next())
    }

    /// Query and return a single scalar value; errors if no row came back.
    pub fn query_scalar<T: FromDbValue>(&self, sql: &str, params: &[DbValue]) -> Result<T> {
        self.query_optional(sql, params)?
            .ok_or_else(|| DbError::Query("Expected one row, got none".to_string()))?
            .get(0)
    }

    /// Query a single scalar value, `None` when the query matched no rows.
    pub fn query_scalar_optional<T: FromDbValue>(
        &self,
        sql: &str,
        params: &[DbValue],
    ) -> Result<Option<T>> {
        match self.query_optional(sql, params)? {
            Some(row) => row.get(0).map(Some),
            None => Ok(None),
        }
    }

    /// Run an INSERT and return the generated `Id`.
    ///
    /// `sql` must be a single INSERT statement without a RETURNING clause into
    /// a table whose key column is named `Id`. SQLite retrieves the id with a
    /// `last_insert_rowid` follow-up; DuckDB returns it inline via
    /// `RETURNING Id`. Either way the caller gets a valid id or an error -
    /// never a completed insert with an unknown id.
    pub fn insert_returning_id(&self, sql: &str, params: &[DbValue]) -> Result<i64> {
        match self {
            DbConnection::Sqlite(conn) => {
                let mut stmt = conn.prepare(sql)?;
                stmt.execute(rusqlite::params_from_iter(to_sqlite_params(params)))?;
                Ok(conn.last_insert_rowid())
            }
            #[cfg(feature = "duckdb")]
            DbConnection::DuckDb(_) => {
                let sql = format!("{sql} RETURNING Id");
                self.query_scalar(&sql, params)
            }
        }
    }

    /// Check whether a table exists, using the dialect's metadata facility.
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let sql = self.dialect().introspection().table_exists;
        let count: i64 = self.query_scalar(sql, &[DbValue::from(table)])?;
        Ok(count > 0)
    }

    /// Check whether a column exists on a table.
    pub fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        let sql = self.dialect().introspection().column_exists;
        let count: i64 =
            self.query_scalar(sql, &[DbValue::from(table), DbValue::from(column)])?;
        Ok(count > 0)
    }

    /// Begin a transaction.
    pub fn begin(&self) -> Result<()> {
        self.execute_batch("BEGIN")
    }

    /// Commit the current transaction.
    pub fn commit(&self) -> Result<()> {
        self.execute_batch("COMMIT")
    }

    /// Roll back the current transaction.
    pub fn rollback(&self) -> Result<()> {
        self.execute_batch("ROLLBACK")
    }
}

fn to_sqlite_params(params: &[DbValue]) -> Vec<rusqlite::types::Value> {
    params
        .iter()
        .map(|p| match p {
            DbValue::Null => rusqlite::types::Value::Null,
            DbValue::Integer(v) => rusqlite::types::Value::Integer(*v),
            DbValue::Real(v) => rusqlite::types::Value::Real(*v),
            DbValue::Text(v) => rusqlite::types::Value::Text(v.clone()),
        })
        .collect()
}

fn query_sqlite(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[DbValue],
) -> Result<Vec<DbRow>> {
    let mut stmt = conn.prepare(sql)?;
    let column_count = stmt.column_count();
    let mut rows = stmt.query(rusqlite::params_from_iter(to_sqlite_params(params)))?;

    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(column_count);
        for i in 0..column_count {
            values.push(sqlite_value(row.get_ref(i)?)?);
        }
        result.push(DbRow::new(values));
    }
    Ok(result)
}

fn sqlite_value(value: rusqlite::types::ValueRef<'_>) -> Result<DbValue> {
    use rusqlite::types::ValueRef;

    match value {
        ValueRef::Null => Ok(DbValue::Null),
        ValueRef::Integer(v) => Ok(DbValue::Integer(v)),
        ValueRef::Real(v) => Ok(DbValue::Real(v)),
        ValueRef::Text(v) => Ok(DbValue::Text(String::from_utf8_lossy(v).to_string())),
        ValueRef::Blob(_) => Err(DbError::TypeConversion(
            "BLOB columns are not supported".to_string(),
        )),
    }
}

#[cfg(feature = "duckdb")]
fn to_duckdb_params(params: &[DbValue]) -> Vec<duckdb::types::Value> {
    params
        .iter()
        .map(|p| match p {
            DbValue::Null => duckdb::types::Value::Null,
            DbValue::Integer(v) => duckdb::types::Value::BigInt(*v),
            DbValue::Real(v) => duckdb::types::Value::Double(*v),
            DbValue::Text(v) => duckdb::types::Value::Text(v.clone()),
        })
        .collect()
}

#[cfg(feature = "duckdb")]
fn query_duckdb(
    conn: &duckdb::Connection,
    sql: &str,
    params: &[DbValue],
) -> Result<Vec<DbRow>> {
    let mut stmt = conn.prepare(sql)?;
    let duckdb_params = to_duckdb_params(params);
    let param_refs: Vec<&dyn duckdb::ToSql> = duckdb_params
        .iter()
        .map(|v| v as &dyn duckdb::ToSql)
        .collect();

    let mut rows_iter = stmt.query(param_refs.as_slice())?;

    let column_count = match rows_iter.as_ref() {
        Some(stmt_ref) => stmt_ref.column_count(),
        None => return Ok(Vec::new()),
    };

    let mut result = Vec::new();
    while let Some(row) = rows_iter.next()? {
        let mut values = Vec::with_capacity(column_count);
        for i in 0..column_count {
            values.push(duckdb_value(row, i)?);
        }
        result.push(DbRow::new(values));
    }
    Ok(result)
}

#[cfg(feature = "duckdb")]
fn duckdb_value(row: &duckdb::Row, index: usize) -> Result<DbValue> {
    use duckdb::types::ValueRef;

    match row.get_ref(index).map_err(DbError::DuckDb)? {
        ValueRef::Null => Ok(DbValue::Null),
        ValueRef::Boolean(v) => Ok(DbValue::Integer(v as i64)),
        ValueRef::TinyInt(v) => Ok(DbValue::Integer(v as i64)),
        ValueRef::SmallInt(v) => Ok(DbValue::Integer(v as i64)),
        ValueRef::Int(v) => Ok(DbValue::Integer(v as i64)),
        ValueRef::BigInt(v) => Ok(DbValue::Integer(v)),
        ValueRef::UTinyInt(v) => Ok(DbValue::Integer(v as i64)),
        ValueRef::USmallInt(v) => Ok(DbValue::Integer(v as i64)),
        ValueRef::UInt(v) => Ok(DbValue::Integer(v as i64)),
        ValueRef::UBigInt(v) => Ok(DbValue::Integer(v as i64)),
        ValueRef::Float(v) => Ok(DbValue::Real(v as f64)),
        ValueRef::Double(v) => Ok(DbValue::Real(v)),
        ValueRef::Text(v) => Ok(DbValue::Text(String::from_utf8_lossy(v).to_string())),
        other => Err(DbError::TypeConversion(format!(
            "Unsupported DuckDB value at column {}: {:?}",
            index,
            std::mem::discriminant(&other)
        ))),
    }
}

fn sql_op_name(sql: &str) -> &str {
    sql.split_whitespace().next().unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_sqlite_creates_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.db");
        let _conn = DbConnection::open_sqlite(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn open_from_url_rejects_unknown_scheme() {
        let err = DbConnection::open_from_url("mysql:whatever").unwrap_err();
        assert!(matches!(err, DbError::UnsupportedUrl(_)));
    }

    #[test]
    fn sqlite_execute_and_query_roundtrip() {
        let conn = DbConnection::open_sqlite_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (Id INTEGER PRIMARY KEY AUTOINCREMENT, Name TEXT)")
            .unwrap();

        conn.execute(
            "INSERT INTO t (Name) VALUES (?)",
            &[DbValue::from("alpha")],
        )
        .unwrap();

        let count: i64 = conn.query_scalar("SELECT COUNT(*) FROM t", &[]).unwrap();
        assert_eq!(count, 1);

        let name: Option<String> = conn
            .query_scalar_optional("SELECT Name FROM t WHERE Id = ?", &[DbValue::from(1_i64)])
            .unwrap();
        assert_eq!(name.as_deref(), Some("alpha"));

        let missing: Option<i64> = conn
            .query_scalar_optional("SELECT Id FROM t WHERE Name = ?", &[DbValue::from("nope")])
            .unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn sqlite_insert_returning_id_uses_rowid() {
        let conn = DbConnection::open_sqlite_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (Id INTEGER PRIMARY KEY AUTOINCREMENT, Name TEXT)")
            .unwrap();

        let first = conn
            .insert_returning_id("INSERT INTO t (Name) VALUES (?)", &[DbValue::from("a")])
            .unwrap();
        let second = conn
            .insert_returning_id("INSERT INTO t (Name) VALUES (?)", &[DbValue::from("b")])
            .unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[test]
    fn sqlite_introspection_finds_tables_and_columns() {
        let conn = DbConnection::open_sqlite_memory().unwrap();
        conn.execute_batch("CREATE TABLE Sections (Id INTEGER PRIMARY KEY, Name TEXT)")
            .unwrap();

        assert!(conn.table_exists("Sections").unwrap());
        assert!(conn.table_exists("sections").unwrap());
        assert!(!conn.table_exists("Questions").unwrap());

        assert!(conn.column_exists("Sections", "Name").unwrap());
        assert!(conn.column_exists("Sections", "name").unwrap());
        assert!(!conn.column_exists("Sections", "SurveyEntityId").unwrap());
    }

    #[test]
    fn sqlite_transaction_rollback_discards_writes() {
        let conn = DbConnection::open_sqlite_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (Id INTEGER PRIMARY KEY, Name TEXT)")
            .unwrap();

        conn.begin().unwrap();
        conn.execute("INSERT INTO t (Name) VALUES (?)", &[DbValue::from("x")])
            .unwrap();
        conn.rollback().unwrap();

        let count: i64 = conn.query_scalar("SELECT COUNT(*) FROM t", &[]).unwrap();
        assert_eq!(count, 0);
    }

    #[cfg(feature = "duckdb")]
    #[test]
    fn duckdb_insert_returning_id_is_inline() {
        let conn = DbConnection::open_duckdb_memory().unwrap();
        conn.execute_batch(
            "CREATE SEQUENCE t_seq; \
             CREATE TABLE t (Id BIGINT PRIMARY KEY DEFAULT nextval('t_seq'), Name TEXT)",
        )
        .unwrap();

        let first = conn
            .insert_returning_id("INSERT INTO t (Name) VALUES (?)", &[DbValue::from("a")])
            .unwrap();
        let second = conn
            .insert_returning_id("INSERT INTO t (Name) VALUES (?)", &[DbValue::from("b")])
            .unwrap();
        assert!(second > first);
    }

    #[cfg(feature = "duckdb")]
    #[test]
    fn duckdb_introspection_uses_catalog_views() {
        let conn = DbConnection::open_duckdb_memory().unwrap();
        conn.execute_batch("CREATE TABLE Sections (Id BIGINT, Name TEXT)")
            .unwrap();

        assert!(conn.table_exists("Sections").unwrap());
        assert!(!conn.table_exists("Questions").unwrap());
        assert!(conn.column_exists("Sections", "Name").unwrap());
        assert!(!conn.column_exists("Sections", "SurveyEntityId").unwrap());
    }
}
