//! Table-level declarations and the aggregated type metadata.

use super::column::{Column, ColumnDef, ColumnFlags, classify};
use crate::dialect::{Dialect, Syntax};
use crate::error::{OrmError, OrmResult};
use crate::ident;
use std::collections::HashSet;
use std::fmt;

/// Declared metadata of one record type, as emitted by `#[derive(Table)]`.
#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    pub type_name: &'static str,
    pub table: &'static str,
    pub schema: Option<&'static str>,
    pub syntax: Syntax,
    pub no_inserts: bool,
    pub no_updates: bool,
    pub no_deletes: bool,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    pub const fn new(type_name: &'static str, table: &'static str) -> Self {
        Self {
            type_name,
            table,
            schema: None,
            syntax: Syntax::Postgres,
            no_inserts: false,
            no_updates: false,
            no_deletes: false,
            columns: &[],
        }
    }

    pub const fn schema(mut self, schema: &'static str) -> Self {
        self.schema = Some(schema);
        self
    }

    pub const fn syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    pub const fn no_inserts(mut self) -> Self {
        self.no_inserts = true;
        self
    }

    pub const fn no_updates(mut self) -> Self {
        self.no_updates = true;
        self
    }

    pub const fn no_deletes(mut self) -> Self {
        self.no_deletes = true;
        self
    }

    pub const fn columns(mut self, columns: &'static [ColumnDef]) -> Self {
        self.columns = columns;
        self
    }
}

/// Table-level switches turning whole operation families into no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableFlags {
    pub no_inserts: bool,
    pub no_updates: bool,
    pub no_deletes: bool,
}

/// The aggregated, immutable metadata of one record type.
///
/// Columns are in rendering order (ordinal first, then declaration order). The derived
/// subsets are positions into [`TypeMetadata::columns`].
pub struct TypeMetadata {
    type_name: &'static str,
    table: String,
    dialect: &'static dyn Dialect,
    flags: TableFlags,
    columns: Vec<Column>,
    keys: Vec<usize>,
    auto_key: Option<usize>,
    select: Vec<usize>,
    insert: Vec<usize>,
    update: Vec<usize>,
    equality: Vec<usize>,
    update_keys: Vec<usize>,
    delete_keys: Vec<usize>,
    insert_sync: Vec<usize>,
    update_sync: Vec<usize>,
}

impl fmt::Debug for TypeMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMetadata")
            .field("type_name", &self.type_name)
            .field("table", &self.table)
            .field("dialect", &self.dialect.name())
            .field("flags", &self.flags)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

macro_rules! column_set {
    ($($(#[$doc:meta])* $name:ident => $field:ident;)+) => {$(
        $(#[$doc])*
        pub fn $name(&self) -> impl ExactSizeIterator<Item = &Column> + '_ {
            self.$field.iter().map(|&i| &self.columns[i])
        }
    )+};
}

impl TypeMetadata {
    /// Classify every declared field and derive the column subsets.
    pub fn build(def: &TableDef) -> OrmResult<Self> {
        let fail = |message: String| OrmError::configuration(def.type_name, message);

        for name in [Some(def.table), def.schema].into_iter().flatten() {
            ident::validate(name).map_err(|e| fail(e.to_string()))?;
        }

        let dialect = def.syntax.dialect();
        let table = dialect.quoting().qualified(def.schema, def.table);

        let mut order: Vec<(i64, &ColumnDef)> = def
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.ordinal.map_or(i as i64, i64::from), c))
            .collect();
        order.sort_by_key(|(ord, _)| *ord);

        let mut columns = Vec::with_capacity(order.len());
        let mut seen = HashSet::new();
        for (_, c) in order {
            ident::validate(c.column_name())
                .map_err(|e| fail(format!("column `{}`: {e}", c.name)))?;

            let column = classify(c, dialect.quote(c.column_name()));

            if column.is_mapped() && !seen.insert(column.column.to_ascii_lowercase()) {
                return Err(fail(format!("duplicate column name `{}`", column.column)));
            }
            if column.auto_increment_requested {
                if !column.is(ColumnFlags::AUTO_KEY) {
                    return Err(fail(format!(
                        "auto-increment column `{}` must be an integer type, found {}",
                        column.name,
                        column.kind.name()
                    )));
                }
                if c.ignore_insert.is_some_and(|o| o.value.is_some()) {
                    return Err(fail(format!(
                        "auto-increment column `{}` cannot carry an insert literal",
                        column.name
                    )));
                }
            }
            if c.ignore_update.is_some() && c.match_update.is_some() && !c.key && !c.not_mapped {
                tracing::warn!(
                    target: "crudforge.compile",
                    type_name = def.type_name,
                    column = column.name,
                    "ignore_update and match_update both declared; ignore_update wins"
                );
            }
            columns.push(column);
        }

        let positions = |pred: &dyn Fn(&Column) -> bool| -> Vec<usize> {
            columns
                .iter()
                .enumerate()
                .filter(|(_, c)| pred(c))
                .map(|(i, _)| i)
                .collect()
        };

        let mapped = positions(&|c| c.is_mapped());
        if mapped.is_empty() {
            return Err(fail("no mapped columns".to_string()));
        }

        let keys = positions(&|c| c.is_key());
        let auto_keys = positions(&|c| c.is(ColumnFlags::AUTO_KEY));
        if keys.len() > 1 && !auto_keys.is_empty() {
            return Err(fail(format!(
                "composite key ({} columns) cannot contain an auto-increment column",
                keys.len()
            )));
        }
        let auto_key = auto_keys.first().copied();

        let select = positions(&|c| !c.flags.intersects(ColumnFlags::IGNORE_SELECT));
        if select.is_empty() {
            return Err(fail("no selectable columns".to_string()));
        }

        let insert = positions(&|c| {
            c.is_mapped()
                && !c.is(ColumnFlags::AUTO_KEY)
                && (!c.is(ColumnFlags::IGNORE_INSERT) || c.insert_value.is_some())
        });

        let equality = if keys.is_empty() {
            mapped.clone()
        } else {
            keys.clone()
        };

        let update_keys = if keys.is_empty() {
            mapped.clone()
        } else {
            positions(&|c| c.is_key() || c.is(ColumnFlags::MATCH_UPDATE))
        };

        let update = positions(&|c| {
            if !c.is_mapped() {
                return false;
            }
            if c.is(ColumnFlags::MATCH_UPDATE) {
                return c.update_value.is_some();
            }
            if c.is_key() || keys.is_empty() {
                return false;
            }
            !c.is(ColumnFlags::IGNORE_UPDATE) || c.update_value.is_some()
        });

        let delete_keys = if keys.is_empty() {
            mapped.clone()
        } else {
            positions(&|c| c.is_key() || c.is(ColumnFlags::MATCH_DELETE))
        };

        let (insert_sync, update_sync) = if keys.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            (
                positions(&|c| c.is(ColumnFlags::INSERT_AUTO_SYNC)),
                positions(&|c| {
                    c.is(ColumnFlags::MATCH_UPDATE) || c.is(ColumnFlags::UPDATE_AUTO_SYNC)
                }),
            )
        };

        let meta = Self {
            type_name: def.type_name,
            table,
            dialect,
            flags: TableFlags {
                no_inserts: def.no_inserts,
                no_updates: def.no_updates,
                no_deletes: def.no_deletes,
            },
            columns,
            keys,
            auto_key,
            select,
            insert,
            update,
            equality,
            update_keys,
            delete_keys,
            insert_sync,
            update_sync,
        };

        tracing::debug!(
            target: "crudforge.compile",
            type_name = meta.type_name,
            table = %meta.table,
            dialect = meta.dialect.name(),
            columns = meta.columns.len(),
            keys = meta.keys.len(),
            "type metadata built"
        );
        Ok(meta)
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Schema-qualified, dialect-quoted table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    pub fn flags(&self) -> TableFlags {
        self.flags
    }

    /// Every declared column, unmapped ones included.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The server-generated key column, if any.
    pub fn auto_key(&self) -> Option<&Column> {
        self.auto_key.map(|i| &self.columns[i])
    }

    /// The single key column, if exactly one key is declared.
    pub fn single_key(&self) -> Option<&Column> {
        match self.keys.as_slice() {
            [i] => Some(&self.columns[*i]),
            _ => None,
        }
    }

    pub fn has_keys(&self) -> bool {
        !self.keys.is_empty()
    }

    column_set! {
        /// Declared key columns.
        key_columns => keys;
        select_columns => select;
        /// Bound or literal-valued columns of `INSERT`.
        insert_columns => insert;
        /// Assigned columns of `UPDATE`.
        update_columns => update;
        /// Natural row identity: the keys, or every mapped column when none is declared.
        equality_columns => equality;
        /// `WHERE` columns of `UPDATE`.
        update_key_columns => update_keys;
        /// `WHERE` columns of `DELETE`.
        delete_key_columns => delete_keys;
        /// Columns re-read after insert.
        insert_sync_columns => insert_sync;
        /// Columns re-read after a successful update.
        update_sync_columns => update_sync;
    }
}
