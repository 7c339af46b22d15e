//! Rows returned by a [`Connection`](crate::Connection).

use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, Value};
use std::sync::Arc;

/// A positional result row.
///
/// Column names are shared between all rows of one result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Convenience constructor for hand-built rows (tests, adapters without shared names).
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let (columns, values): (Vec<String>, Vec<Value>) =
            pairs.into_iter().map(|(c, v)| (c.into(), v)).unzip();
        Self::new(columns.into(), values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Value at a column position.
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Typed value at a column position.
    pub fn try_get<T: FromValue>(&self, idx: usize) -> OrmResult<T> {
        let column = self
            .columns
            .get(idx)
            .map(String::as_str)
            .unwrap_or("<unknown>");
        let value = self
            .values
            .get(idx)
            .cloned()
            .ok_or_else(|| OrmError::decode(column, format!("no column at index {idx}")))?;
        T::from_value(value).map_err(|e| OrmError::decode(column, e.to_string()))
    }

    /// Typed value by column name.
    pub fn try_get_named<T: FromValue>(&self, name: &str) -> OrmResult<T> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| OrmError::decode(name, "column not found in row"))?;
        self.try_get(idx)
    }
}
