//! Derive macros for crudforge
//!
//! Provides `#[derive(Table)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod sql_ident;
mod table;

/// Derive `crudforge::Table` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use crudforge::Table;
///
/// #[derive(Debug, Default, Table)]
/// #[crud(table = "Employees", syntax = "sqlserver")]
/// struct Employee {
///     #[crud(auto_key, column = "EmployeeID")]
///     id: i32,
///     #[crud(column = "LastName")]
///     last_name: String,
///     #[crud(column = "ModifiedDate", ignore_insert(value = "GETDATE()", auto_sync))]
///     modified: Option<chrono::NaiveDateTime>,
///     #[crud(skip)]
///     dirty: bool,
/// }
/// ```
///
/// # Struct attributes
///
/// - `table = "name"` - table name (defaults to the struct name)
/// - `schema = "name"` - schema qualifier
/// - `syntax = "postgres" | "sqlserver" | "mysql" | "sqlite"` - SQL dialect (default postgres)
/// - `no_inserts`, `no_updates`, `no_deletes` - disable whole operation families
///
/// # Field attributes
///
/// - `key` - part of the key
/// - `auto_key` / `auto_increment` - server-generated integer key
/// - `column = "name"` - column name (defaults to the field name)
/// - `ordinal = n` - sort position; unannotated columns sit at their declaration index
/// - `skip` / `not_mapped` - not a column at all
/// - `ignore_select` - never read
/// - `ignore_insert`, `ignore_update` - never written, or written as `(value = "<sql>")`;
///   `auto_sync` re-reads the column after the write
/// - `match_update[(value = "<sql>", auto_sync)]` - also matched in the update `WHERE`
/// - `match_delete` - also matched in the delete `WHERE`
///
/// Every mapped field type must implement `crudforge::ToValue` and `crudforge::FromValue`.
#[proc_macro_derive(Table, attributes(crud))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    table::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
