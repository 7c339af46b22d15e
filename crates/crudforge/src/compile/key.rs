use super::sql::column_list;
use crate::error::{OrmError, OrmResult};
use crate::meta::TypeMetadata;
use crate::value::ScalarKind;
use std::borrow::Cow;

/// Statements addressed by a bare single-column key.
#[derive(Debug, Clone)]
pub struct KeyStatementsSql {
    pub(crate) key_kind: ScalarKind,
    pub(crate) select_fields: Vec<usize>,
    pub(crate) get: String,
    pub(crate) delete: Option<String>,
    pub(crate) keys_head: String,
    select_in_head: String,
    delete_in_head: Option<String>,
    pub(crate) batch_size: usize,
    full_select: String,
    full_delete: Option<String>,
}

impl KeyStatementsSql {
    /// Compile for the type's single key, which must have kind `requested`.
    pub fn compile(meta: &TypeMetadata, requested: ScalarKind, batch_size: usize) -> OrmResult<Self> {
        let fail = |message: String| OrmError::configuration(meta.type_name(), message);

        let key = match meta.single_key() {
            Some(key) => key,
            None if meta.has_keys() => {
                return Err(fail(format!(
                    "key lookups need exactly one key column, found {}",
                    meta.key_columns().len()
                )));
            }
            None => return Err(fail("key lookups need a key column".to_string())),
        };
        if !key.kind.supports_key_lookup() {
            return Err(fail(format!(
                "key column `{}` has unsupported type {}",
                key.name,
                key.kind.name()
            )));
        }
        if key.kind != requested {
            return Err(fail(format!(
                "key column `{}` is {}, requested {}",
                key.name,
                key.kind.name(),
                requested.name()
            )));
        }

        let dialect = meta.dialect();
        let table = meta.table();
        let ph = dialect.placeholder(1);
        let select = column_list(meta.select_columns(), None);
        let no_deletes = meta.flags().no_deletes;

        let select_in_head = format!("SELECT {select} FROM {table} WHERE {} IN (", key.quoted);
        let delete_in_head =
            (!no_deletes).then(|| format!("DELETE FROM {table} WHERE {} IN (", key.quoted));

        let mut sql = Self {
            key_kind: key.kind,
            select_fields: meta.select_columns().map(|c| c.field).collect(),
            get: format!("SELECT {select} FROM {table} WHERE {} = {ph}", key.quoted),
            delete: (!no_deletes).then(|| format!("DELETE FROM {table} WHERE {} = {ph}", key.quoted)),
            keys_head: format!("SELECT {} FROM {table}", key.quoted),
            select_in_head,
            delete_in_head,
            batch_size,
            full_select: String::new(),
            full_delete: None,
        };
        sql.full_select = sql.render(&sql.select_in_head, batch_size, meta);
        sql.full_delete = sql
            .delete_in_head
            .as_ref()
            .map(|head| sql.render(head, batch_size, meta));

        tracing::debug!(
            target: "crudforge.compile",
            type_name = meta.type_name(),
            key = key.column,
            batch_size,
            "key statements compiled"
        );
        Ok(sql)
    }

    fn render(&self, head: &str, n: usize, meta: &TypeMetadata) -> String {
        let dialect = meta.dialect();
        let mut out = String::with_capacity(head.len() + n * 6);
        out.push_str(head);
        for i in 1..=n {
            if i > 1 {
                out.push_str(", ");
            }
            out.push_str(&dialect.placeholder(i));
        }
        out.push(')');
        out
    }

    /// `SELECT ... WHERE key IN (...)` for a batch of `n` keys.
    pub fn select_batch(&self, n: usize, meta: &TypeMetadata) -> Cow<'_, str> {
        if n == self.batch_size {
            Cow::Borrowed(&self.full_select)
        } else {
            Cow::Owned(self.render(&self.select_in_head, n, meta))
        }
    }

    /// `DELETE ... WHERE key IN (...)` for a batch of `n` keys, `None` when deletes are off.
    pub fn delete_batch(&self, n: usize, meta: &TypeMetadata) -> Option<Cow<'_, str>> {
        let head = self.delete_in_head.as_ref()?;
        Some(match &self.full_delete {
            Some(full) if n == self.batch_size => Cow::Borrowed(full.as_str()),
            _ => Cow::Owned(self.render(head, n, meta)),
        })
    }
}
