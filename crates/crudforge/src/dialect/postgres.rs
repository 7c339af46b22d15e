use super::{Dialect, STAGING_ALIAS, TARGET_ALIAS};
use crate::ident::Quoting;
use crate::value::ScalarKind;

/// PostgreSQL: `"ident"`, `$n` placeholders, session temp tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quoting(&self) -> Quoting {
        Quoting::new('"', '"')
    }

    fn placeholder(&self, n: usize) -> String {
        format!("${n}")
    }

    fn create_staging_table(&self, staging: &str, columns: &str, source: &str) -> String {
        format!("CREATE TEMP TABLE {staging} AS SELECT {columns} FROM {source} WHERE 1 = 0")
    }

    fn identity_select(&self, kind: ScalarKind) -> String {
        match kind {
            ScalarKind::I8 | ScalarKind::U8 | ScalarKind::I16 => {
                "SELECT CAST(lastval() AS smallint)".to_string()
            }
            ScalarKind::U16 | ScalarKind::I32 => "SELECT CAST(lastval() AS integer)".to_string(),
            _ => "SELECT lastval()".to_string(),
        }
    }

    fn bulk_delete(&self, table: &str, staging: &str, on: &str) -> String {
        format!(
            "DELETE FROM {table} AS {TARGET_ALIAS} USING {staging} AS {STAGING_ALIAS} WHERE {on}"
        )
    }
}
