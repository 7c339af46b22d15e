//! Statement dispatch with timeouts and `tracing` output.

use crate::client::{BulkConnection, Connection};
use crate::config::config;
use crate::error::{OrmError, OrmResult};
use crate::meta::Table;
use crate::row::Row;
use crate::value::Value;
use std::time::{Duration, Instant};

fn truncate_sql(sql: &str, max: Option<usize>) -> &str {
    match max {
        Some(max) if sql.len() > max => {
            let mut end = max;
            while end > 0 && !sql.is_char_boundary(end) {
                end -= 1;
            }
            &sql[..end]
        }
        _ => sql,
    }
}

fn resolve(timeout: Option<Duration>) -> Option<Duration> {
    timeout.or(config().command_timeout)
}

fn before(op: &'static str, sql: &str, params: usize) -> Instant {
    let cfg = config();
    let shown = truncate_sql(sql, cfg.max_sql_length);
    if cfg.log_sql {
        tracing::debug!(target: "crudforge.sql", op, param_count = params, sql = %shown);
    } else {
        tracing::trace!(target: "crudforge.sql", op, param_count = params, sql = %shown);
    }
    Instant::now()
}

fn after(op: &'static str, sql: &str, started: Instant) {
    let cfg = config();
    let elapsed = started.elapsed();
    if cfg.slow_threshold.is_some_and(|t| elapsed >= t) {
        tracing::warn!(
            target: "crudforge.sql",
            op,
            elapsed_ms = elapsed.as_millis() as u64,
            sql = %truncate_sql(sql, cfg.max_sql_length),
            "slow statement"
        );
    }
}

pub(crate) async fn execute<C: Connection>(
    conn: &C,
    op: &'static str,
    sql: &str,
    params: &[Value],
    timeout: Option<Duration>,
) -> OrmResult<u64> {
    let started = before(op, sql, params.len());
    let result = conn.execute(sql, params, resolve(timeout)).await;
    after(op, sql, started);
    result
}

pub(crate) async fn query<C: Connection>(
    conn: &C,
    op: &'static str,
    sql: &str,
    params: &[Value],
    timeout: Option<Duration>,
) -> OrmResult<Vec<Row>> {
    let started = before(op, sql, params.len());
    let result = conn.query(sql, params, resolve(timeout)).await;
    after(op, sql, started);
    result
}

pub(crate) async fn query_scalar<C: Connection>(
    conn: &C,
    op: &'static str,
    sql: &str,
    params: &[Value],
    timeout: Option<Duration>,
) -> OrmResult<Option<Value>> {
    let started = before(op, sql, params.len());
    let result = conn.query_scalar(sql, params, resolve(timeout)).await;
    after(op, sql, started);
    result
}

pub(crate) async fn bulk_copy<C: BulkConnection>(
    conn: &C,
    op: &'static str,
    table: &str,
    columns: &[String],
    rows: Vec<Vec<Value>>,
    timeout: Option<Duration>,
) -> OrmResult<u64> {
    tracing::debug!(
        target: "crudforge.sql",
        op,
        table,
        rows = rows.len(),
        columns = columns.len(),
        "bulk copy"
    );
    conn.bulk_copy(table, columns, rows, resolve(timeout)).await
}

/// Build a record from `Default` plus the row's values, positionally mapped to `fields`.
pub(crate) fn read_record<T: Table>(row: Row, fields: &[usize]) -> OrmResult<T> {
    let mut record = T::default();
    apply_row(&mut record, row, fields)?;
    Ok(record)
}

/// Write a row's values into an existing record.
pub(crate) fn apply_row<T: Table>(record: &mut T, row: Row, fields: &[usize]) -> OrmResult<()> {
    if row.len() < fields.len() {
        return Err(OrmError::decode(
            T::TABLE.type_name,
            format!("expected {} columns, got {}", fields.len(), row.len()),
        ));
    }
    for (&field, value) in fields.iter().zip(row.into_values()) {
        record.set_value(field, value)?;
    }
    Ok(())
}

pub(crate) fn read_records<T: Table>(rows: Vec<Row>, fields: &[usize]) -> OrmResult<Vec<T>> {
    rows.into_iter().map(|r| read_record(r, fields)).collect()
}

/// Interpret a scalar as a row count.
pub(crate) fn count(value: Option<Value>) -> OrmResult<u64> {
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(v) => v
            .as_i128()
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| OrmError::decode("count", format!("not a row count: {v:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_sql("SELECT 1", Some(3)), "SEL");
        assert_eq!(truncate_sql("héllo", Some(2)), "h");
        assert_eq!(truncate_sql("short", None), "short");
    }

    #[test]
    fn count_accepts_any_integer_width() {
        assert_eq!(count(Some(Value::I64(12))).unwrap(), 12);
        assert_eq!(count(Some(Value::I32(3))).unwrap(), 3);
        assert_eq!(count(None).unwrap(), 0);
        assert!(count(Some(Value::Text("x".into()))).is_err());
    }
}
