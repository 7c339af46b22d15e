use super::sql::{CompiledSql, SqlText, column_list};
use crate::meta::{Column, TypeMetadata};

/// How the generated key comes back after an insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityFetch {
    /// Appended to the INSERT batch; the statement itself returns the identity.
    InBatch,
    /// Issued as a second statement on the same connection.
    FollowUp(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub field: usize,
    pub fetch: IdentityFetch,
}

/// Re-read of server-maintained columns by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    pub sql: CompiledSql,
    pub fields: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertPlan {
    pub sql: CompiledSql,
    pub identity: Option<Identity>,
    pub sync: Option<SyncPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan {
    pub sql: CompiledSql,
    pub sync: Option<SyncPlan>,
}

/// Shape of a single-row upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertPlan {
    NoOp,
    /// Nothing is updatable: insert guarded by `WHERE NOT EXISTS`.
    InsertIfNotExists,
    /// Nothing is insertable: update only, never reports an insert.
    UpdateOnly,
    /// Update; insert when no row was affected.
    UpdateThenInsert,
}

/// The record-level statement group, compiled on first use of any non-bulk operation.
#[derive(Debug, Clone)]
pub struct CoreStatements {
    pub(crate) select_list: String,
    pub(crate) select_fields: Vec<usize>,
    pub(crate) from: String,
    pub(crate) select_head: String,
    pub(crate) distinct_head: String,
    pub(crate) count_head: String,
    pub(crate) keys_head: String,
    pub(crate) key_fields: Vec<usize>,
    pub(crate) get: CompiledSql,
    pub(crate) insert: Option<InsertPlan>,
    pub(crate) insert_if_not_exists: Option<InsertPlan>,
    pub(crate) update: Option<UpdatePlan>,
    pub(crate) delete: Option<CompiledSql>,
    pub(crate) delete_head: Option<String>,
    pub(crate) truncate: Option<String>,
    pub(crate) upsert: UpsertPlan,
}

impl CoreStatements {
    pub fn compile(meta: &TypeMetadata) -> Self {
        let dialect = meta.dialect();
        let table = meta.table();
        let flags = meta.flags();

        let select_list = column_list(meta.select_columns(), None);
        let select_fields = meta.select_columns().map(|c| c.field).collect();
        let from = format!("FROM {table}");
        let select_head = format!("SELECT {select_list} {from}");

        let mut get = SqlText::new(dialect);
        get.push(&select_head)
            .push(" WHERE ")
            .push_matches(meta.equality_columns());

        let insertable = !flags.no_inserts && meta.insert_columns().len() > 0;
        let insert = insertable.then(|| compile_insert(meta, false));
        let insert_if_not_exists = insertable.then(|| compile_insert(meta, true));

        let updatable = !flags.no_updates && meta.update_columns().len() > 0;
        let update = updatable.then(|| UpdatePlan {
            sql: compile_update(meta),
            sync: compile_sync(meta, meta.update_sync_columns()),
        });

        let delete = (!flags.no_deletes).then(|| {
            let mut sql = SqlText::new(dialect);
            sql.push("DELETE FROM ")
                .push(table)
                .push(" WHERE ")
                .push_matches(meta.delete_key_columns());
            sql.finish()
        });

        let upsert = match (insertable, updatable) {
            (false, false) => UpsertPlan::NoOp,
            (true, false) => UpsertPlan::InsertIfNotExists,
            (false, true) => UpsertPlan::UpdateOnly,
            (true, true) => UpsertPlan::UpdateThenInsert,
        };

        let statements = Self {
            distinct_head: format!("SELECT DISTINCT {select_list} {from}"),
            count_head: format!("SELECT COUNT(*) {from}"),
            keys_head: format!(
                "SELECT {} {from}",
                column_list(meta.equality_columns(), None)
            ),
            key_fields: meta.equality_columns().map(|c| c.field).collect(),
            get: get.finish(),
            insert,
            insert_if_not_exists,
            update,
            delete,
            delete_head: (!flags.no_deletes).then(|| format!("DELETE {from}")),
            truncate: (!flags.no_deletes).then(|| dialect.truncate_table(table)),
            upsert,
            select_list,
            select_fields,
            from,
            select_head,
        };

        tracing::debug!(
            target: "crudforge.compile",
            type_name = meta.type_name(),
            insert = statements.insert.is_some(),
            update = statements.update.is_some(),
            delete = statements.delete.is_some(),
            upsert = ?statements.upsert,
            "core statements compiled"
        );
        statements
    }
}

/// `INSERT INTO t (cols) VALUES (...)`, or the `SELECT ... WHERE NOT EXISTS` form when `guarded`.
fn compile_insert(meta: &TypeMetadata, guarded: bool) -> InsertPlan {
    let dialect = meta.dialect();
    let mut sql = SqlText::new(dialect);
    push_insert_head(&mut sql, meta);
    if guarded {
        sql.push(" SELECT ");
        push_insert_values(&mut sql, meta);
        if let Some(dual) = dialect.dual_table() {
            sql.push(" FROM ").push(dual);
        }
        sql.push(" WHERE NOT EXISTS (SELECT 1 FROM ")
            .push(meta.table())
            .push(" WHERE ")
            .push_matches(meta.equality_columns())
            .push(")");
    } else {
        sql.push(" VALUES (");
        push_insert_values(&mut sql, meta);
        sql.push(")");
    }

    let identity = meta.auto_key().map(|key| {
        let select = dialect.identity_select(key.kind);
        let fetch = if dialect.identity_in_batch() {
            sql.push("; ").push(&select);
            IdentityFetch::InBatch
        } else {
            IdentityFetch::FollowUp(select)
        };
        Identity {
            field: key.field,
            fetch,
        }
    });

    InsertPlan {
        sql: sql.finish(),
        identity,
        sync: compile_sync(meta, meta.insert_sync_columns()),
    }
}

/// Plain `INSERT INTO t (cols) VALUES (...)` without identity retrieval.
pub(super) fn insert_values(meta: &TypeMetadata) -> CompiledSql {
    let mut sql = SqlText::new(meta.dialect());
    push_insert_head(&mut sql, meta);
    sql.push(" VALUES (");
    push_insert_values(&mut sql, meta);
    sql.push(")");
    sql.finish()
}

fn push_insert_head(sql: &mut SqlText, meta: &TypeMetadata) {
    sql.push("INSERT INTO ")
        .push(meta.table())
        .push(" (")
        .push(&column_list(meta.insert_columns(), None))
        .push(")");
}

fn push_insert_values(sql: &mut SqlText, meta: &TypeMetadata) {
    for (i, c) in meta.insert_columns().enumerate() {
        if i > 0 {
            sql.push(", ");
        }
        sql.push_value(c, c.insert_value);
    }
}

/// `UPDATE t SET ... WHERE <update keys>`.
fn compile_update(meta: &TypeMetadata) -> CompiledSql {
    let mut sql = SqlText::new(meta.dialect());
    sql.push("UPDATE ").push(meta.table()).push(" SET ");
    for (i, c) in meta.update_columns().enumerate() {
        if i > 0 {
            sql.push(", ");
        }
        sql.push(&c.quoted).push(" = ").push_value(c, c.update_value);
    }
    sql.push(" WHERE ").push_matches(meta.update_key_columns());
    sql.finish()
}

/// `SELECT <columns> FROM t WHERE <keys>`, or `None` when there is nothing to re-read.
fn compile_sync<'a>(
    meta: &'a TypeMetadata,
    columns: impl ExactSizeIterator<Item = &'a Column>,
) -> Option<SyncPlan> {
    if columns.len() == 0 || !meta.has_keys() {
        return None;
    }
    let columns: Vec<&Column> = columns.collect();
    let mut sql = SqlText::new(meta.dialect());
    sql.push("SELECT ")
        .push(&column_list(columns.iter().copied(), None))
        .push(" FROM ")
        .push(meta.table())
        .push(" WHERE ")
        .push_matches(meta.key_columns());
    Some(SyncPlan {
        sql: sql.finish(),
        fields: columns.iter().map(|c| c.field).collect(),
    })
}
