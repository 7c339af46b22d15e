//! Operations addressed by a bare key value.
//!
//! Available for record types with exactly one key column of a comparable scalar type.
//! Multi-key operations split the keys into batches of
//! [`CrudConfig::key_batch_size`](crate::CrudConfig) and issue one `IN (...)` statement
//! per batch.

use crate::client::Connection;
use crate::compile::{KeyStatementsSql, with_clause};
use crate::error::{OrmError, OrmResult};
use crate::exec::{self, read_record, read_records};
use crate::meta::{Table, TypeMetadata};
use crate::value::{KeyType, ToValue, Value};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

pub struct KeyStatements<T: Table, K: KeyType> {
    meta: Arc<TypeMetadata>,
    sql: KeyStatementsSql,
    _types: PhantomData<fn() -> (T, K)>,
}

impl<T: Table, K: KeyType> fmt::Debug for KeyStatements<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStatements")
            .field("type_name", &self.meta.type_name())
            .field("key_kind", &self.sql.key_kind)
            .field("batch_size", &self.sql.batch_size)
            .finish()
    }
}

impl<T: Table, K: KeyType> KeyStatements<T, K> {
    pub(crate) fn new(meta: Arc<TypeMetadata>, batch_size: usize) -> OrmResult<Self> {
        let sql = KeyStatementsSql::compile(&meta, K::KIND, batch_size.max(1))?;
        Ok(Self {
            meta,
            sql,
            _types: PhantomData,
        })
    }

    pub fn sql(&self) -> &KeyStatementsSql {
        &self.sql
    }

    pub fn batch_size(&self) -> usize {
        self.sql.batch_size
    }

    pub async fn get<C: Connection>(
        &self,
        conn: &C,
        key: &K,
        timeout: Option<Duration>,
    ) -> OrmResult<Option<T>> {
        let rows = exec::query(conn, "get_by_key", &self.sql.get, &[key.to_value()], timeout).await?;
        rows.into_iter()
            .next()
            .map(|row| read_record(row, &self.sql.select_fields))
            .transpose()
    }

    /// Returns `false` when nothing matched or deletes are disabled.
    pub async fn delete<C: Connection>(
        &self,
        conn: &C,
        key: &K,
        timeout: Option<Duration>,
    ) -> OrmResult<bool> {
        let Some(sql) = &self.sql.delete else {
            return Ok(false);
        };
        let affected = exec::execute(conn, "delete_by_key", sql, &[key.to_value()], timeout).await?;
        Ok(affected > 0)
    }

    /// All records whose key is in `keys`. Order follows the server, not `keys`.
    pub async fn bulk_get<C: Connection>(
        &self,
        conn: &C,
        keys: &[K],
        timeout: Option<Duration>,
    ) -> OrmResult<Vec<T>> {
        let mut records = Vec::with_capacity(keys.len());
        for batch in keys.chunks(self.sql.batch_size) {
            let sql = self.sql.select_batch(batch.len(), &self.meta);
            let params: Vec<Value> = batch.iter().map(ToValue::to_value).collect();
            let rows = exec::query(conn, "bulk_get_by_key", &sql, &params, timeout).await?;
            records.extend(read_records::<T>(rows, &self.sql.select_fields)?);
        }
        Ok(records)
    }

    /// Delete every record whose key is in `keys`; returns the rows removed.
    pub async fn bulk_delete<C: Connection>(
        &self,
        conn: &C,
        keys: &[K],
        timeout: Option<Duration>,
    ) -> OrmResult<u64> {
        let mut deleted = 0;
        for batch in keys.chunks(self.sql.batch_size) {
            let Some(sql) = self.sql.delete_batch(batch.len(), &self.meta) else {
                return Ok(0);
            };
            let params: Vec<Value> = batch.iter().map(ToValue::to_value).collect();
            deleted += exec::execute(conn, "bulk_delete_by_key", &sql, &params, timeout).await?;
        }
        Ok(deleted)
    }

    /// Key values of the rows selected by `clause`.
    pub async fn get_keys<C: Connection>(
        &self,
        conn: &C,
        clause: &str,
        params: &[Value],
        timeout: Option<Duration>,
    ) -> OrmResult<Vec<K>> {
        let sql = with_clause(&self.sql.keys_head, clause);
        let rows = exec::query(conn, "get_keys", &sql, params, timeout).await?;
        let column = self
            .meta
            .single_key()
            .map_or(self.meta.type_name(), |key| key.name);
        rows.into_iter()
            .map(|row| {
                let value = row.into_values().into_iter().next().unwrap_or(Value::Null);
                K::from_value(value)
                    .map_err(|e| OrmError::decode(column, e.to_string()))
            })
            .collect()
    }
}
