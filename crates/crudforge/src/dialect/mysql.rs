use super::{Assignment, Dialect, STAGING_ALIAS, TARGET_ALIAS, join_assignments};
use crate::ident::Quoting;
use crate::value::ScalarKind;

/// MySQL / MariaDB: backtick quoting, `?` placeholders, `TEMPORARY` tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quoting(&self) -> Quoting {
        Quoting::new('`', '`')
    }

    fn placeholder(&self, _n: usize) -> String {
        "?".to_string()
    }

    fn dual_table(&self) -> Option<&'static str> {
        Some("DUAL")
    }

    fn create_staging_table(&self, staging: &str, columns: &str, source: &str) -> String {
        format!("CREATE TEMPORARY TABLE {staging} AS SELECT {columns} FROM {source} LIMIT 0")
    }

    fn drop_table_if_exists(&self, staging: &str) -> String {
        format!("DROP TEMPORARY TABLE IF EXISTS {staging}")
    }

    fn identity_select(&self, _kind: ScalarKind) -> String {
        "SELECT LAST_INSERT_ID()".to_string()
    }

    fn bulk_update(&self, table: &str, source: &str, set: &[Assignment], on: &str) -> String {
        format!(
            "UPDATE {table} AS {TARGET_ALIAS} INNER JOIN {source} AS {STAGING_ALIAS} ON {on} SET {set}",
            set = join_assignments(set, Some(TARGET_ALIAS)),
        )
    }

    fn bulk_delete(&self, table: &str, staging: &str, on: &str) -> String {
        format!(
            "DELETE {TARGET_ALIAS} FROM {table} AS {TARGET_ALIAS} INNER JOIN {staging} AS {STAGING_ALIAS} ON {on}"
        )
    }
}
