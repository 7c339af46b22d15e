//! # crudforge
//!
//! Metadata-driven CRUD statements for plain Rust records.
//!
//! A record type declares how its fields map to columns; crudforge validates that
//! declaration once, renders every statement the type supports in the table's SQL
//! dialect, and caches the result for the life of the process.
//!
//! ## Features
//!
//! - **Declarative mapping**: `#[derive(Table)]` with `#[crud(...)]` field attributes
//! - **Compiled once**: statements are rendered on first use and shared across threads
//! - **Dialect aware**: Postgres, SQL Server, MySQL and SQLite quoting, placeholders and identity retrieval
//! - **Bulk pipelines**: staging-table insert, update, delete, upsert and get
//! - **Key lookups**: batched `IN (...)` statements for single-key types
//! - **Transaction-friendly**: pass a transaction anywhere a [`Connection`] is expected
//!
//! ```ignore
//! use crudforge::prelude::*;
//!
//! #[derive(Debug, Default, Table)]
//! #[crud(table = "Employees")]
//! struct Employee {
//!     #[crud(auto_key, column = "EmployeeID")]
//!     id: i32,
//!     #[crud(column = "LastName")]
//!     last_name: String,
//!     #[crud(column = "ModifiedDate", ignore_insert(auto_sync), ignore_update(auto_sync))]
//!     modified: Option<chrono::NaiveDateTime>,
//! }
//!
//! let stmts = crudforge::statements::<Employee>()?;
//! let mut e = Employee { last_name: "Lovelace".into(), ..Default::default() };
//! stmts.insert(&client, &mut e, None).await?;
//!
//! let by_id = crudforge::key_statements::<Employee, i32>()?;
//! let found = by_id.bulk_get(&client, &[1, 2, 3], None).await?;
//! ```

extern crate self as crudforge;

pub mod client;
pub mod compile;
pub mod config;
pub mod dialect;
pub mod equality;
pub mod error;
pub mod ident;
pub mod keyed;
pub mod meta;
pub mod prelude;
pub mod registry;
pub mod row;
pub mod statements;
pub mod transaction;
pub mod value;

mod exec;

pub use client::{BulkConnection, Connection};
pub use compile::CompiledSql;
pub use config::{CrudConfig, DEFAULT_KEY_BATCH_SIZE, config, configure};
pub use dialect::{Dialect, Syntax};
pub use equality::EqualityComparer;
pub use error::{OrmError, OrmResult};
pub use keyed::KeyStatements;
pub use meta::{Column, ColumnDef, ColumnFlags, Override, Table, TableDef, TypeMetadata};
pub use registry::{CrudBuilder, builder, equality_comparer, key_statements, statements, type_info};
pub use row::Row;
pub use statements::Statements;
pub use value::{ConversionError, FromValue, KeyType, ScalarKind, ToValue, Value};

#[doc(hidden)]
pub use transaction::__next_savepoint_name;

#[cfg(feature = "derive")]
pub use crudforge_derive::Table;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{DEFAULT_POOL_SIZE, create_pool, create_pool_with_config};

#[cfg(feature = "pool")]
pub use deadpool_postgres;

pub use tokio_postgres;

#[cfg(feature = "rust_decimal")]
pub use rust_decimal;
