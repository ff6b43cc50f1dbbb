//! Dialect tags and per-dialect metadata introspection.
//!
//! Each backend declares its table/column existence queries in one
//! `IntrospectionSql` record. Adding a backend means adding one record here
//! and one variant to `DbConnection` - call sites never branch on dialect.

/// SQL dialect of a connected backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// SQLite: schema reflection via `sqlite_master` and `pragma_table_info`.
    Sqlite,
    /// DuckDB: schema reflection via `information_schema` catalog views.
    #[cfg(feature = "duckdb")]
    DuckDb,
}

/// Metadata queries for one dialect.
///
/// Both statements return a single COUNT(*) column. `table_exists` binds the
/// table name; `column_exists` binds the table name then the column name.
/// Name matching is case-insensitive to mirror SQL identifier semantics.
pub(crate) struct IntrospectionSql {
    pub table_exists: &'static str,
    pub column_exists: &'static str,
}

static SQLITE_INTROSPECTION: IntrospectionSql = IntrospectionSql {
    table_exists:
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ? COLLATE NOCASE",
    column_exists: "SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ? COLLATE NOCASE",
};

#[cfg(feature = "duckdb")]
static DUCKDB_INTROSPECTION: IntrospectionSql = IntrospectionSql {
    table_exists:
        "SELECT COUNT(*) FROM information_schema.tables WHERE lower(table_name) = lower(?)",
    column_exists: "SELECT COUNT(*) FROM information_schema.columns \
         WHERE lower(table_name) = lower(?) AND lower(column_name) = lower(?)",
};

impl Dialect {
    /// Human-readable backend name for logs and errors.
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Sqlite => "SQLite",
            #[cfg(feature = "duckdb")]
            Dialect::DuckDb => "DuckDB",
        }
    }

    pub(crate) fn introspection(self) -> &'static IntrospectionSql {
        match self {
            Dialect::Sqlite => &SQLITE_INTROSPECTION,
            #[cfg(feature = "duckdb")]
            Dialect::DuckDb => &DUCKDB_INTROSPECTION,
        }
    }
}
