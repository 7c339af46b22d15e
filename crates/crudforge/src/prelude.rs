//! Convenient imports for typical `crudforge` usage.
//!
//! ```ignore
//! use crudforge::prelude::*;
//! ```

pub use crate::{
    BulkConnection, Connection, CrudConfig, KeyStatements, OrmError, OrmResult, Statements,
    Syntax, Table, ToValue, Value, equality_comparer, key_statements, statements, type_info,
};

#[cfg(feature = "pool")]
pub use crate::{create_pool, create_pool_with_config};
