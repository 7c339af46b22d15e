//! Record metadata: field declarations, classification and derived column sets.
//!
//! A record type describes itself through [`Table`], normally via `#[derive(Table)]`:
//!
//! ```ignore
//! use crudforge::Table;
//!
//! #[derive(Debug, Default, Table)]
//! #[crud(table = "Employees", syntax = "sqlserver")]
//! struct Employee {
//!     #[crud(auto_key, column = "EmployeeID")]
//!     id: i32,
//!     #[crud(column = "LastName")]
//!     last_name: String,
//!     #[crud(column = "ModifiedDate", ignore_insert(auto_sync))]
//!     modified: Option<chrono::NaiveDateTime>,
//! }
//! ```
//!
//! [`TypeMetadata::build`] turns the static [`TableDef`] into the aggregated metadata the
//! statement compiler works from.

mod column;
mod table;


pub use column::{Column, ColumnDef, ColumnFlags, Override, classify};
pub use table::{TableDef, TableFlags, TypeMetadata};

use crate::error::OrmResult;
use crate::value::Value;

/// A record type mapped to one table.
///
/// Field accessors are addressed by [`ColumnDef::field`]. Records are materialized from
/// `Default::default()` followed by one `set_value` per selected column, so partial
/// selects leave the remaining fields at their defaults.
pub trait Table: Default + Send + Sync + 'static {
    const TABLE: TableDef;

    /// Read a field as a [`Value`]. Unmapped fields return `Value::Null`.
    fn get_value(&self, field: usize) -> Value;

    /// Write a field from a [`Value`]. Unmapped fields ignore the value.
    fn set_value(&mut self, field: usize, value: Value) -> OrmResult<()>;
}
