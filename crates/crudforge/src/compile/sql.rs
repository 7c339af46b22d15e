use crate::dialect::Dialect;
use crate::meta::{Column, Table};
use crate::value::Value;

/// A rendered statement and the record fields bound to its placeholders, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSql {
    pub sql: String,
    pub binds: Vec<usize>,
}

impl CompiledSql {
    /// Parameter values for `record`.
    pub fn params<T: Table>(&self, record: &T) -> Vec<Value> {
        self.binds.iter().map(|&f| record.get_value(f)).collect()
    }
}

/// Appends SQL and numbers placeholders as field binds are pushed.
pub(crate) struct SqlText {
    dialect: &'static dyn Dialect,
    sql: String,
    binds: Vec<usize>,
}

impl SqlText {
    pub(crate) fn new(dialect: &'static dyn Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            binds: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    pub(crate) fn push_bind(&mut self, field: usize) -> &mut Self {
        self.binds.push(field);
        let ph = self.dialect.placeholder(self.binds.len());
        self.sql.push_str(&ph);
        self
    }

    /// The literal override if present, otherwise a bind of the column's field.
    pub(crate) fn push_value(&mut self, column: &Column, literal: Option<&str>) -> &mut Self {
        match literal {
            Some(expr) => self.push(expr),
            None => self.push_bind(column.field),
        }
    }

    /// `a = $1 AND b = $2` over `columns`.
    pub(crate) fn push_matches<'a>(
        &mut self,
        columns: impl IntoIterator<Item = &'a Column>,
    ) -> &mut Self {
        for (i, c) in columns.into_iter().enumerate() {
            if i > 0 {
                self.push(" AND ");
            }
            self.push(&c.quoted).push(" = ").push_bind(c.field);
        }
        self
    }

    pub(crate) fn finish(self) -> CompiledSql {
        CompiledSql {
            sql: self.sql,
            binds: self.binds,
        }
    }
}

/// Comma-joined quoted names, optionally qualified by a table alias.
pub(crate) fn column_list<'a>(
    columns: impl IntoIterator<Item = &'a Column>,
    alias: Option<&str>,
) -> String {
    let mut out = String::new();
    for (i, c) in columns.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        if let Some(alias) = alias {
            out.push_str(alias);
            out.push('.');
        }
        out.push_str(&c.quoted);
    }
    out
}

/// `t.a = s.a AND t.b = s.b` over `columns`.
pub(crate) fn join_condition<'a>(
    columns: impl IntoIterator<Item = &'a Column>,
    left: &str,
    right: &str,
) -> String {
    let mut out = String::new();
    for (i, c) in columns.into_iter().enumerate() {
        if i > 0 {
            out.push_str(" AND ");
        }
        out.push_str(&format!("{left}.{q} = {right}.{q}", q = c.quoted));
    }
    out
}

/// Append a caller-supplied clause (e.g. `WHERE ...` or `ORDER BY ...`) to a compiled head.
pub(crate) fn with_clause(head: &str, clause: &str) -> String {
    let clause = clause.trim();
    if clause.is_empty() {
        head.to_string()
    } else {
        format!("{head} {clause}")
    }
}
