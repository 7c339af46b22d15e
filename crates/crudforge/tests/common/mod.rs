//! A recording connection with scripted results.

#![allow(dead_code)]

use crudforge::{BulkConnection, Connection, OrmResult, Row, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Execute { sql: String, params: Vec<Value> },
    Query { sql: String, params: Vec<Value> },
    Scalar { sql: String, params: Vec<Value> },
    Copy { table: String, columns: Vec<String>, rows: Vec<Vec<Value>> },
}

impl Call {
    pub fn sql(&self) -> &str {
        match self {
            Call::Execute { sql, .. } | Call::Query { sql, .. } | Call::Scalar { sql, .. } => sql,
            Call::Copy { table, .. } => table,
        }
    }

    pub fn params(&self) -> &[Value] {
        match self {
            Call::Execute { params, .. } | Call::Query { params, .. } | Call::Scalar { params, .. } => {
                params
            }
            Call::Copy { .. } => &[],
        }
    }
}

/// Records every call. `execute` pops scripted row counts (default 0), `query` pops
/// scripted result sets (default empty), `query_scalar` pops scripted scalars (default
/// `None`).
#[derive(Default)]
pub struct SpyConnection {
    calls: Mutex<Vec<Call>>,
    affected: Mutex<VecDeque<u64>>,
    rows: Mutex<VecDeque<Vec<Row>>>,
    scalars: Mutex<VecDeque<Option<Value>>>,
}

impl SpyConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn affected(self, counts: impl IntoIterator<Item = u64>) -> Self {
        self.affected.lock().unwrap().extend(counts);
        self
    }

    pub fn rows(self, rows: Vec<Row>) -> Self {
        self.rows.lock().unwrap().push_back(rows);
        self
    }

    pub fn scalar(self, value: Option<Value>) -> Self {
        self.scalars.lock().unwrap().push_back(value);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sqls(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.sql().to_string()).collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Connection for SpyConnection {
    async fn execute(&self, sql: &str, params: &[Value], _timeout: Option<Duration>) -> OrmResult<u64> {
        self.record(Call::Execute {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        Ok(self.affected.lock().unwrap().pop_front().unwrap_or(0))
    }

    async fn query(
        &self,
        sql: &str,
        params: &[Value],
        _timeout: Option<Duration>,
    ) -> OrmResult<Vec<Row>> {
        self.record(Call::Query {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        Ok(self.rows.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn query_scalar(
        &self,
        sql: &str,
        params: &[Value],
        _timeout: Option<Duration>,
    ) -> OrmResult<Option<Value>> {
        self.record(Call::Scalar {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        Ok(self.scalars.lock().unwrap().pop_front().flatten())
    }
}

impl BulkConnection for SpyConnection {
    async fn bulk_copy(
        &self,
        table: &str,
        columns: &[String],
        rows: Vec<Vec<Value>>,
        _timeout: Option<Duration>,
    ) -> OrmResult<u64> {
        let count = rows.len() as u64;
        self.record(Call::Copy {
            table: table.to_string(),
            columns: columns.to_vec(),
            rows,
        });
        Ok(count)
    }
}

pub fn row(pairs: Vec<(&str, Value)>) -> Row {
    Row::from_pairs(pairs)
}
