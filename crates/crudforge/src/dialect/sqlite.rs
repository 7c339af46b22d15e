use super::{Dialect, STAGING_ALIAS, TARGET_ALIAS};
use crate::ident::Quoting;
use crate::value::ScalarKind;

/// SQLite 3.33+: `"ident"`, `?N` placeholders, `UPDATE ... FROM`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quoting(&self) -> Quoting {
        Quoting::new('"', '"')
    }

    fn placeholder(&self, n: usize) -> String {
        format!("?{n}")
    }

    fn create_staging_table(&self, staging: &str, columns: &str, source: &str) -> String {
        format!("CREATE TEMP TABLE {staging} AS SELECT {columns} FROM {source} LIMIT 0")
    }

    fn truncate_table(&self, table: &str) -> String {
        format!("DELETE FROM {table}")
    }

    fn identity_select(&self, _kind: ScalarKind) -> String {
        "SELECT last_insert_rowid()".to_string()
    }

    // No DELETE ... USING or JOIN in SQLite.
    fn bulk_delete(&self, table: &str, staging: &str, on: &str) -> String {
        format!(
            "DELETE FROM {table} AS {TARGET_ALIAS} WHERE EXISTS (SELECT 1 FROM {staging} AS {STAGING_ALIAS} WHERE {on})"
        )
    }
}
