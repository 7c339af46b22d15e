//! `tokio-postgres` (and deadpool) implementation of the connection seams.

use super::copy::{copy_statement, encode_rows};
use super::{BulkConnection, Connection};
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use bytes::BytesMut;
use futures_util::SinkExt;
use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

type BoxError = Box<dyn Error + Sync + Send>;

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql(ty, out),
            Value::F32(v) => float_to_sql(f64::from(*v), ty, out),
            Value::F64(v) => float_to_sql(*v, ty, out),
            #[cfg(feature = "rust_decimal")]
            Value::Decimal(d) => match *ty {
                Type::FLOAT4 | Type::FLOAT8 => {
                    use rust_decimal::prelude::ToPrimitive;
                    let v = d.to_f64().ok_or("decimal out of float range")?;
                    float_to_sql(v, ty, out)
                }
                _ => d.to_sql(ty, out),
            },
            Value::Text(s) => match *ty {
                Type::JSON | Type::JSONB => serde_json::from_str::<serde_json::Value>(s)?.to_sql(ty, out),
                _ => s.as_str().to_sql(ty, out),
            },
            Value::Bytes(b) => b.as_slice().to_sql(ty, out),
            Value::Uuid(u) => u.to_sql(ty, out),
            Value::Date(d) => d.to_sql(ty, out),
            Value::Time(t) => t.to_sql(ty, out),
            Value::Timestamp(t) => t.to_sql(ty, out),
            Value::TimestampTz(t) => t.to_sql(ty, out),
            Value::Json(j) => j.to_sql(ty, out),
            other => match other.as_i128() {
                Some(v) => int_to_sql(v, ty, out),
                None => Err(format!("cannot encode {other:?} as {ty}").into()),
            },
        }
    }

    // Width and family are adapted to the parameter type the server inferred.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn int_to_sql(v: i128, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::BOOL => (v != 0).to_sql(ty, out),
        Type::CHAR => i8::try_from(v)?.to_sql(ty, out),
        Type::INT2 => i16::try_from(v)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(v)?.to_sql(ty, out),
        Type::OID => u32::try_from(v)?.to_sql(ty, out),
        Type::FLOAT4 | Type::FLOAT8 => float_to_sql(v as f64, ty, out),
        #[cfg(feature = "rust_decimal")]
        Type::NUMERIC => rust_decimal::Decimal::from_i128_with_scale(v, 0).to_sql(ty, out),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            v.to_string().as_str().to_sql(ty, out)
        }
        _ => i64::try_from(v)?.to_sql(ty, out),
    }
}

fn float_to_sql(v: f64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::FLOAT4 => (v as f32).to_sql(ty, out),
        #[cfg(feature = "rust_decimal")]
        Type::NUMERIC => rust_decimal::Decimal::try_from(v)?.to_sql(ty, out),
        _ => v.to_sql(ty, out),
    }
}

fn decode_row(row: &tokio_postgres::Row, names: &Arc<[String]>) -> OrmResult<Row> {
    let mut values = Vec::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, idx, column.type_())
            .map_err(|e| OrmError::decode(column.name(), e.to_string()))?;
        values.push(value);
    }
    Ok(Row::new(Arc::clone(names), values))
}

fn decode_column(
    row: &tokio_postgres::Row,
    idx: usize,
    ty: &Type,
) -> Result<Value, tokio_postgres::Error> {
    macro_rules! get {
        ($t:ty, $variant:ident) => {
            row.try_get::<_, Option<$t>>(idx)?
                .map_or(Value::Null, Value::$variant)
        };
    }

    Ok(match *ty {
        Type::BOOL => get!(bool, Bool),
        Type::CHAR => get!(i8, I8),
        Type::INT2 => get!(i16, I16),
        Type::INT4 => get!(i32, I32),
        Type::INT8 => get!(i64, I64),
        Type::OID => get!(u32, U32),
        Type::FLOAT4 => get!(f32, F32),
        Type::FLOAT8 => get!(f64, F64),
        #[cfg(feature = "rust_decimal")]
        Type::NUMERIC => get!(rust_decimal::Decimal, Decimal),
        Type::BYTEA => get!(Vec<u8>, Bytes),
        Type::UUID => get!(uuid::Uuid, Uuid),
        Type::DATE => get!(chrono::NaiveDate, Date),
        Type::TIME => get!(chrono::NaiveTime, Time),
        Type::TIMESTAMP => get!(chrono::NaiveDateTime, Timestamp),
        Type::TIMESTAMPTZ => get!(chrono::DateTime<chrono::Utc>, TimestampTz),
        Type::JSON | Type::JSONB => get!(serde_json::Value, Json),
        // Text-like and anything else the server can render as text (enums, citext, ...).
        _ => get!(String, Text),
    })
}

async fn with_timeout<T, F>(timeout: Option<Duration>, fut: F) -> OrmResult<T>
where
    F: Future<Output = OrmResult<T>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| OrmError::Timeout(limit))?,
        None => fut.await,
    }
}

fn param_refs(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

macro_rules! impl_pg_connection {
    ($($ty:ty),+ $(,)?) => {$(
        impl Connection for $ty {
            async fn execute(
                &self,
                sql: &str,
                params: &[Value],
                timeout: Option<Duration>,
            ) -> OrmResult<u64> {
                let refs = param_refs(params);
                with_timeout(timeout, async {
                    <$ty>::execute(self, sql, &refs)
                        .await
                        .map_err(OrmError::from_db_error)
                })
                .await
            }

            async fn query(
                &self,
                sql: &str,
                params: &[Value],
                timeout: Option<Duration>,
            ) -> OrmResult<Vec<Row>> {
                let refs = param_refs(params);
                let rows = with_timeout(timeout, async {
                    <$ty>::query(self, sql, &refs)
                        .await
                        .map_err(OrmError::from_db_error)
                })
                .await?;
                let Some(first) = rows.first() else {
                    return Ok(Vec::new());
                };
                let names: Arc<[String]> = first
                    .columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect();
                rows.iter().map(|r| decode_row(r, &names)).collect()
            }
        }

        impl BulkConnection for $ty {
            async fn bulk_copy(
                &self,
                table: &str,
                columns: &[String],
                rows: Vec<Vec<Value>>,
                timeout: Option<Duration>,
            ) -> OrmResult<u64> {
                let statement = copy_statement(table, columns);
                let data = encode_rows(&rows).freeze();
                with_timeout(timeout, async {
                    let sink = <$ty>::copy_in::<_, bytes::Bytes>(self, statement.as_str())
                        .await
                        .map_err(OrmError::from_db_error)?;
                    futures_util::pin_mut!(sink);
                    sink.send(data).await.map_err(OrmError::from_db_error)?;
                    sink.as_mut().finish().await.map_err(OrmError::from_db_error)
                })
                .await
            }
        }
    )+};
}

impl_pg_connection!(tokio_postgres::Client, tokio_postgres::Transaction<'_>);

#[cfg(feature = "pool")]
mod pool {
    use super::*;

    macro_rules! impl_deref_connection {
        ($($ty:ty),+ $(,)?) => {$(
            impl Connection for $ty {
                async fn execute(
                    &self,
                    sql: &str,
                    params: &[Value],
                    timeout: Option<Duration>,
                ) -> OrmResult<u64> {
                    Connection::execute(&**self, sql, params, timeout).await
                }

                async fn query(
                    &self,
                    sql: &str,
                    params: &[Value],
                    timeout: Option<Duration>,
                ) -> OrmResult<Vec<Row>> {
                    Connection::query(&**self, sql, params, timeout).await
                }
            }

            impl BulkConnection for $ty {
                async fn bulk_copy(
                    &self,
                    table: &str,
                    columns: &[String],
                    rows: Vec<Vec<Value>>,
                    timeout: Option<Duration>,
                ) -> OrmResult<u64> {
                    BulkConnection::bulk_copy(&**self, table, columns, rows, timeout).await
                }
            }
        )+};
    }

    impl_deref_connection!(
        deadpool_postgres::ClientWrapper,
        deadpool_postgres::Client,
        deadpool_postgres::Transaction<'_>,
    );
}
