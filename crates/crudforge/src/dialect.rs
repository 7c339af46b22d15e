//! Per-engine SQL fragments.
//!
//! A [`Dialect`] is a stateless strategy selected once per record type through the
//! table-level [`Syntax`] selector. It renders the handful of fragments that differ
//! between engines: identifier quoting, placeholders, row limits, staging tables,
//! identity retrieval and the join shapes used by the bulk pipelines.

mod mysql;
mod postgres;
mod sqlite;
mod sqlserver;

#[cfg(test)]
mod tests;

pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;
pub use sqlserver::SqlServer;

use crate::ident::Quoting;
use crate::value::ScalarKind;
use std::fmt;

/// Alias of the target table inside bulk statements.
pub const TARGET_ALIAS: &str = "t";
/// Alias of the staging table inside bulk statements.
pub const STAGING_ALIAS: &str = "s";

/// Table-level dialect selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Syntax {
    #[default]
    Postgres,
    SqlServer,
    MySql,
    Sqlite,
}

impl Syntax {
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            Self::Postgres => &Postgres,
            Self::SqlServer => &SqlServer,
            Self::MySql => &MySql,
            Self::Sqlite => &Sqlite,
        }
    }
}

/// One `SET` entry of a bulk update: the quoted target column and its new value expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub column: String,
    pub value: String,
}

/// Dialect-specific SQL rendering.
///
/// All `table`/`staging` arguments are already quoted; `columns` lists are already joined.
pub trait Dialect: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn quoting(&self) -> Quoting;

    /// Quote an identifier unless it is bare.
    fn quote(&self, name: &str) -> String {
        self.quoting().quote(name)
    }

    /// Positional parameter `n`, 1-based.
    fn placeholder(&self, n: usize) -> String;

    /// `SELECT [DISTINCT] <columns> <tail>` limited to the row count bound at `limit`.
    ///
    /// `tail` starts with `FROM`.
    fn limit_query(&self, distinct: bool, columns: &str, tail: &str, limit: &str) -> String {
        let distinct = if distinct { "DISTINCT " } else { "" };
        format!("SELECT {distinct}{columns} {tail} LIMIT {limit}")
    }

    /// Table a `SELECT` needs when it has a `WHERE` but nothing to read from.
    fn dual_table(&self) -> Option<&'static str> {
        None
    }

    /// Rendered (and quoted) name of the staging table for `table`.
    fn staging_table(&self, table: &str) -> String {
        self.quote(&format!("crudforge_stage_{}", sanitize(table)))
    }

    /// Create `staging` as an empty copy of `columns` from `source`.
    fn create_staging_table(&self, staging: &str, columns: &str, source: &str) -> String;

    fn drop_table_if_exists(&self, staging: &str) -> String {
        format!("DROP TABLE IF EXISTS {staging}")
    }

    fn truncate_table(&self, table: &str) -> String {
        format!("TRUNCATE TABLE {table}")
    }

    /// Statement returning the identity generated by the last insert, sized to `kind`.
    fn identity_select(&self, kind: ScalarKind) -> String;

    /// Whether the identity select must run in the same batch as its INSERT.
    fn identity_in_batch(&self) -> bool {
        false
    }

    /// `UPDATE` of `table` from `source`, joined on `on`.
    ///
    /// `source` is a staging table name or a parenthesized derived table over one.
    fn bulk_update(&self, table: &str, source: &str, set: &[Assignment], on: &str) -> String {
        format!(
            "UPDATE {table} AS {t} SET {set} FROM {source} AS {s} WHERE {on}",
            t = TARGET_ALIAS,
            s = STAGING_ALIAS,
            set = join_assignments(set, None),
        )
    }

    /// `DELETE` of the rows of `table` matched by `staging` on `on`.
    fn bulk_delete(&self, table: &str, staging: &str, on: &str) -> String;
}

pub(crate) fn join_assignments(set: &[Assignment], qualifier: Option<&str>) -> String {
    let mut out = String::new();
    for (i, a) in set.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        if let Some(q) = qualifier {
            out.push_str(q);
            out.push('.');
        }
        out.push_str(&a.column);
        out.push_str(" = ");
        out.push_str(&a.value);
    }
    out
}

/// Reduce a rendered table name to identifier characters.
fn sanitize(table: &str) -> String {
    table
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}
