use super::{Assignment, Dialect, STAGING_ALIAS, TARGET_ALIAS, join_assignments, sanitize};
use crate::ident::Quoting;
use crate::value::ScalarKind;

/// SQL Server: `[ident]`, `@pN` placeholders, `#temp` tables, batch-scoped identities.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServer;

impl Dialect for SqlServer {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn quoting(&self) -> Quoting {
        Quoting::new('[', ']')
    }

    fn placeholder(&self, n: usize) -> String {
        format!("@p{n}")
    }

    fn limit_query(&self, distinct: bool, columns: &str, tail: &str, limit: &str) -> String {
        let distinct = if distinct { "DISTINCT " } else { "" };
        format!("SELECT {distinct}TOP ({limit}) {columns} {tail}")
    }

    fn staging_table(&self, table: &str) -> String {
        format!("#crudforge_stage_{}", sanitize(table))
    }

    /// The `UNION ALL` keeps `SELECT INTO` from copying the IDENTITY property.
    fn create_staging_table(&self, staging: &str, columns: &str, source: &str) -> String {
        format!(
            "SELECT TOP (0) {columns} INTO {staging} FROM {source} \
             UNION ALL SELECT TOP (0) {columns} FROM {source}"
        )
    }

    fn drop_table_if_exists(&self, staging: &str) -> String {
        format!("IF OBJECT_ID('tempdb..{staging}') IS NOT NULL DROP TABLE {staging}")
    }

    fn identity_select(&self, kind: ScalarKind) -> String {
        let sql_type = match kind {
            ScalarKind::I8 | ScalarKind::U8 => "TINYINT",
            ScalarKind::I16 => "SMALLINT",
            ScalarKind::U16 | ScalarKind::I32 => "INT",
            _ => "BIGINT",
        };
        format!("SELECT CAST(SCOPE_IDENTITY() AS {sql_type})")
    }

    fn identity_in_batch(&self) -> bool {
        true
    }

    fn bulk_update(&self, table: &str, source: &str, set: &[Assignment], on: &str) -> String {
        format!(
            "UPDATE {TARGET_ALIAS} SET {set} FROM {table} AS {TARGET_ALIAS} INNER JOIN {source} AS {STAGING_ALIAS} ON {on}",
            set = join_assignments(set, Some(TARGET_ALIAS)),
        )
    }

    fn bulk_delete(&self, table: &str, staging: &str, on: &str) -> String {
        format!(
            "DELETE {TARGET_ALIAS} FROM {table} AS {TARGET_ALIAS} INNER JOIN {staging} AS {STAGING_ALIAS} ON {on}"
        )
    }
}
