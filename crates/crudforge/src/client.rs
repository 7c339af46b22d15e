//! Connection seams used by compiled statements.
//!
//! Statements never talk to a driver directly. They hand finished SQL plus positional
//! [`Value`] parameters to a [`Connection`], and stream staging rows through a
//! [`BulkConnection`]. Transactions are connections too, so every operation can run
//! inside a caller-owned transaction by passing the transaction instead of the client.

mod copy;
mod postgres;

use crate::error::OrmResult;
use crate::row::Row;
use crate::value::Value;
use std::future::Future;
use std::time::Duration;

/// Executes SQL with positional parameters.
///
/// `timeout` has already been resolved against the configured default; `None` means
/// no limit.
pub trait Connection: Send + Sync {
    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
        timeout: Option<Duration>,
    ) -> impl Future<Output = OrmResult<u64>> + Send;

    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
        timeout: Option<Duration>,
    ) -> impl Future<Output = OrmResult<Vec<Row>>> + Send;

    /// Execute a query and return the first column of the first row, if any.
    ///
    /// The default implementation calls [`Connection::query`].
    fn query_scalar(
        &self,
        sql: &str,
        params: &[Value],
        timeout: Option<Duration>,
    ) -> impl Future<Output = OrmResult<Option<Value>>> + Send {
        async move {
            let rows = self.query(sql, params, timeout).await?;
            Ok(rows
                .into_iter()
                .next()
                .and_then(|row| row.into_values().into_iter().next()))
        }
    }
}

/// A connection that can stream rows into a table.
pub trait BulkConnection: Connection {
    /// Stream `rows` into `table`. `table` and `columns` are already quoted.
    ///
    /// Returns the number of rows written.
    fn bulk_copy(
        &self,
        table: &str,
        columns: &[String],
        rows: Vec<Vec<Value>>,
        timeout: Option<Duration>,
    ) -> impl Future<Output = OrmResult<u64>> + Send;
}

impl<C: Connection> Connection for &C {
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
        timeout: Option<Duration>,
    ) -> impl Future<Output = OrmResult<u64>> + Send {
        (**self).execute(sql, params, timeout)
    }

    fn query(
        &self,
        sql: &str,
        params: &[Value],
        timeout: Option<Duration>,
    ) -> impl Future<Output = OrmResult<Vec<Row>>> + Send {
        (**self).query(sql, params, timeout)
    }

    fn query_scalar(
        &self,
        sql: &str,
        params: &[Value],
        timeout: Option<Duration>,
    ) -> impl Future<Output = OrmResult<Option<Value>>> + Send {
        (**self).query_scalar(sql, params, timeout)
    }
}

impl<C: BulkConnection> BulkConnection for &C {
    fn bulk_copy(
        &self,
        table: &str,
        columns: &[String],
        rows: Vec<Vec<Value>>,
        timeout: Option<Duration>,
    ) -> impl Future<Output = OrmResult<u64>> + Send {
        (**self).bulk_copy(table, columns, rows, timeout)
    }
}
