//! The compiled statement table of a record type.
//!
//! Obtain it through [`statements`](crate::statements()) and run operations against any
//! [`Connection`]. Every operation takes an optional timeout; `None` falls back to the
//! configured default.
//!
//! ```ignore
//! let stmts = crudforge::statements::<Employee>()?;
//! let mut e = Employee { last_name: "Hopper".into(), ..Default::default() };
//! stmts.insert(&client, &mut e, None).await?;
//! assert!(e.id > 0);
//!
//! let recent = stmts
//!     .get_list(&client, "WHERE HireDate > $1", &[cutoff.into()], None)
//!     .await?;
//! ```
//!
//! Operations disabled by table flags (or left without columns to work on) return
//! `false` / `0` / empty without issuing any SQL.

mod bulk;

use crate::client::Connection;
use crate::compile::{
    BulkStatements, CoreStatements, Identity, IdentityFetch, InsertPlan, SyncPlan, UpsertPlan,
    with_clause,
};
use crate::error::{OrmError, OrmResult};
use crate::exec::{self, apply_row, read_record, read_records};
use crate::meta::{Table, TypeMetadata};
use crate::value::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Compiled statements of `T`.
///
/// The core and bulk groups compile independently on first use.
pub struct Statements<T: Table> {
    meta: Arc<TypeMetadata>,
    core: OnceLock<CoreStatements>,
    bulk: OnceLock<BulkStatements>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Table> fmt::Debug for Statements<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statements")
            .field("type_name", &self.meta.type_name())
            .field("core_compiled", &self.core.get().is_some())
            .field("bulk_compiled", &self.bulk.get().is_some())
            .finish()
    }
}

impl<T: Table> Statements<T> {
    pub(crate) fn new(meta: Arc<TypeMetadata>) -> Self {
        Self {
            meta,
            core: OnceLock::new(),
            bulk: OnceLock::new(),
            _record: PhantomData,
        }
    }

    pub fn metadata(&self) -> &TypeMetadata {
        &self.meta
    }

    /// The core statement group, compiling it on first access.
    pub fn core(&self) -> &CoreStatements {
        self.core.get_or_init(|| CoreStatements::compile(&self.meta))
    }

    /// The bulk statement group, compiling it on first access.
    pub fn bulk(&self) -> &BulkStatements {
        self.bulk.get_or_init(|| BulkStatements::compile(&self.meta))
    }

    pub fn is_bulk_compiled(&self) -> bool {
        self.bulk.get().is_some()
    }

    /// Fetch the stored row matching `record` on its equality columns.
    pub async fn get<C: Connection>(
        &self,
        conn: &C,
        record: &T,
        timeout: Option<Duration>,
    ) -> OrmResult<Option<T>> {
        let core = self.core();
        let rows = exec::query(conn, "get", &core.get.sql, &core.get.params(record), timeout).await?;
        rows.into_iter()
            .next()
            .map(|row| read_record(row, &core.select_fields))
            .transpose()
    }

    /// `SELECT <columns> FROM <table> <clause>`.
    ///
    /// `clause` is appended verbatim (e.g. `WHERE x = $1 ORDER BY y`) and may be empty;
    /// its placeholders bind `params`.
    pub async fn get_list<C: Connection>(
        &self,
        conn: &C,
        clause: &str,
        params: &[Value],
        timeout: Option<Duration>,
    ) -> OrmResult<Vec<T>> {
        let core = self.core();
        let sql = with_clause(&core.select_head, clause);
        let rows = exec::query(conn, "get_list", &sql, params, timeout).await?;
        read_records(rows, &core.select_fields)
    }

    /// Like [`Statements::get_list`] with `SELECT DISTINCT`.
    pub async fn get_distinct<C: Connection>(
        &self,
        conn: &C,
        clause: &str,
        params: &[Value],
        timeout: Option<Duration>,
    ) -> OrmResult<Vec<T>> {
        let core = self.core();
        let sql = with_clause(&core.distinct_head, clause);
        let rows = exec::query(conn, "get_distinct", &sql, params, timeout).await?;
        read_records(rows, &core.select_fields)
    }

    /// At most `limit` rows. The limit is bound as the parameter after `params`.
    pub async fn get_limited<C: Connection>(
        &self,
        conn: &C,
        limit: u64,
        clause: &str,
        params: &[Value],
        timeout: Option<Duration>,
    ) -> OrmResult<Vec<T>> {
        self.limited(conn, false, limit, clause, params, timeout)
            .await
    }

    /// At most `limit` distinct rows.
    pub async fn get_distinct_limited<C: Connection>(
        &self,
        conn: &C,
        limit: u64,
        clause: &str,
        params: &[Value],
        timeout: Option<Duration>,
    ) -> OrmResult<Vec<T>> {
        self.limited(conn, true, limit, clause, params, timeout)
            .await
    }

    async fn limited<C: Connection>(
        &self,
        conn: &C,
        distinct: bool,
        limit: u64,
        clause: &str,
        params: &[Value],
        timeout: Option<Duration>,
    ) -> OrmResult<Vec<T>> {
        let core = self.core();
        let dialect = self.meta.dialect();
        let limit = i64::try_from(limit)
            .map_err(|_| OrmError::validation(format!("limit {limit} out of range")))?;
        let tail = with_clause(&core.from, clause);
        let sql = dialect.limit_query(
            distinct,
            &core.select_list,
            &tail,
            &dialect.placeholder(params.len() + 1),
        );
        let mut bound = params.to_vec();
        bound.push(Value::I64(limit));
        let op = if distinct { "get_distinct_limited" } else { "get_limited" };
        let rows = exec::query(conn, op, &sql, &bound, timeout).await?;
        read_records(rows, &core.select_fields)
    }

    /// Records with only their equality columns populated.
    pub async fn get_keys<C: Connection>(
        &self,
        conn: &C,
        clause: &str,
        params: &[Value],
        timeout: Option<Duration>,
    ) -> OrmResult<Vec<T>> {
        let core = self.core();
        let sql = with_clause(&core.keys_head, clause);
        let rows = exec::query(conn, "get_keys", &sql, params, timeout).await?;
        read_records(rows, &core.key_fields)
    }

    /// `SELECT COUNT(*) FROM <table> <clause>`.
    pub async fn record_count<C: Connection>(
        &self,
        conn: &C,
        clause: &str,
        params: &[Value],
        timeout: Option<Duration>,
    ) -> OrmResult<u64> {
        let sql = with_clause(&self.core().count_head, clause);
        let value = exec::query_scalar(conn, "record_count", &sql, params, timeout).await?;
        exec::count(value)
    }

    /// Insert `record`, writing back the generated key and any auto-synced columns.
    pub async fn insert<C: Connection>(
        &self,
        conn: &C,
        record: &mut T,
        timeout: Option<Duration>,
    ) -> OrmResult<bool> {
        match &self.core().insert {
            Some(plan) => self.run_insert(conn, plan, record, "insert", timeout).await,
            None => Ok(false),
        }
    }

    /// Insert `record` unless a row with the same equality columns exists.
    pub async fn insert_if_not_exists<C: Connection>(
        &self,
        conn: &C,
        record: &mut T,
        timeout: Option<Duration>,
    ) -> OrmResult<bool> {
        match &self.core().insert_if_not_exists {
            Some(plan) => {
                self.run_insert(conn, plan, record, "insert_if_not_exists", timeout)
                    .await
            }
            None => Ok(false),
        }
    }

    async fn run_insert<C: Connection>(
        &self,
        conn: &C,
        plan: &InsertPlan,
        record: &mut T,
        op: &'static str,
        timeout: Option<Duration>,
    ) -> OrmResult<bool> {
        let params = plan.sql.params(record);
        let inserted = match &plan.identity {
            None => exec::execute(conn, op, &plan.sql.sql, &params, timeout).await? > 0,
            Some(Identity {
                field,
                fetch: IdentityFetch::InBatch,
            }) => match exec::query_scalar(conn, op, &plan.sql.sql, &params, timeout).await? {
                Some(id) if !id.is_null() => {
                    record.set_value(*field, id)?;
                    true
                }
                _ => false,
            },
            Some(Identity {
                field,
                fetch: IdentityFetch::FollowUp(select),
            }) => {
                let affected = exec::execute(conn, op, &plan.sql.sql, &params, timeout).await?;
                if affected > 0 {
                    let id = exec::query_scalar(conn, "identity", select, &[], timeout).await?;
                    match id {
                        Some(id) if !id.is_null() => record.set_value(*field, id)?,
                        _ => {
                            return Err(OrmError::decode(
                                self.meta.type_name(),
                                "insert succeeded but no identity was returned",
                            ));
                        }
                    }
                }
                affected > 0
            }
        };
        if inserted {
            if let Some(sync) = &plan.sync {
                self.sync(conn, sync, record, timeout).await?;
            }
        }
        Ok(inserted)
    }

    async fn sync<C: Connection>(
        &self,
        conn: &C,
        plan: &SyncPlan,
        record: &mut T,
        timeout: Option<Duration>,
    ) -> OrmResult<()> {
        let params = plan.sql.params(record);
        let rows = exec::query(conn, "sync", &plan.sql.sql, &params, timeout).await?;
        if let Some(row) = rows.into_iter().next() {
            apply_row(record, row, &plan.fields)?;
        }
        Ok(())
    }

    /// Update the row matched by `record`'s update keys.
    ///
    /// Returns whether a row was affected; match-update and auto-synced columns are
    /// re-read afterwards.
    pub async fn update<C: Connection>(
        &self,
        conn: &C,
        record: &mut T,
        timeout: Option<Duration>,
    ) -> OrmResult<bool> {
        let Some(plan) = &self.core().update else {
            return Ok(false);
        };
        let params = plan.sql.params(record);
        let affected = exec::execute(conn, "update", &plan.sql.sql, &params, timeout).await?;
        if affected > 0 {
            if let Some(sync) = &plan.sync {
                self.sync(conn, sync, record, timeout).await?;
            }
        }
        Ok(affected > 0)
    }

    /// Delete the row matched by `record`'s delete keys.
    pub async fn delete<C: Connection>(
        &self,
        conn: &C,
        record: &T,
        timeout: Option<Duration>,
    ) -> OrmResult<bool> {
        let Some(sql) = &self.core().delete else {
            return Ok(false);
        };
        let affected = exec::execute(conn, "delete", &sql.sql, &sql.params(record), timeout).await?;
        Ok(affected > 0)
    }

    /// `DELETE FROM <table> <clause>`.
    pub async fn delete_list<C: Connection>(
        &self,
        conn: &C,
        clause: &str,
        params: &[Value],
        timeout: Option<Duration>,
    ) -> OrmResult<u64> {
        let Some(head) = &self.core().delete_head else {
            return Ok(0);
        };
        let sql = with_clause(head, clause);
        exec::execute(conn, "delete_list", &sql, params, timeout).await
    }

    /// Delete every row.
    pub async fn delete_all<C: Connection>(
        &self,
        conn: &C,
        timeout: Option<Duration>,
    ) -> OrmResult<u64> {
        let Some(head) = &self.core().delete_head else {
            return Ok(0);
        };
        exec::execute(conn, "delete_all", head, &[], timeout).await
    }

    /// Truncate the table.
    pub async fn truncate<C: Connection>(
        &self,
        conn: &C,
        timeout: Option<Duration>,
    ) -> OrmResult<()> {
        if let Some(sql) = &self.core().truncate {
            exec::execute(conn, "truncate", sql, &[], timeout).await?;
        }
        Ok(())
    }

    /// Update, or insert when nothing was updated. Returns whether a row was inserted.
    pub async fn upsert<C: Connection>(
        &self,
        conn: &C,
        record: &mut T,
        timeout: Option<Duration>,
    ) -> OrmResult<bool> {
        match self.core().upsert {
            UpsertPlan::NoOp => Ok(false),
            UpsertPlan::InsertIfNotExists => {
                self.insert_if_not_exists(conn, record, timeout).await
            }
            UpsertPlan::UpdateOnly => {
                self.update(conn, record, timeout).await?;
                Ok(false)
            }
            UpsertPlan::UpdateThenInsert => {
                if self.update(conn, record, timeout).await? {
                    Ok(false)
                } else {
                    self.insert(conn, record, timeout).await
                }
            }
        }
    }
}
