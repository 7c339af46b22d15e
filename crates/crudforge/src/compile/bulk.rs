use super::crud::insert_values;
use super::sql::{CompiledSql, column_list, join_condition};
use crate::dialect::{Assignment, STAGING_ALIAS, TARGET_ALIAS};
use crate::meta::{Column, TypeMetadata};

/// Staging table lifecycle plus the statements applied against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingPlan {
    pub staging: String,
    pub drop: String,
    pub create: String,
    /// Quoted column names streamed into the staging table.
    pub columns: Vec<String>,
    /// Record fields feeding `columns`, in the same order.
    pub fields: Vec<usize>,
    /// Statements run against the staged rows, in order.
    pub apply: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkInsertPlan {
    NoOp,
    Staged(StagingPlan),
    /// Every insert column is a literal; nothing to stream, so rows are inserted one by one.
    PerRow(CompiledSql),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkUpsertPlan {
    NoOp,
    /// Staged insert guarded by `NOT EXISTS`; reports inserted rows.
    InsertIfNotExists(StagingPlan),
    /// Staged update only; reports zero.
    UpdateOnly(StagingPlan),
    /// One staging pass: join update, then guarded insert; reports inserted rows.
    UpdateThenInsert(StagingPlan),
}

/// The bulk statement group, compiled the first time any bulk operation runs.
#[derive(Debug, Clone)]
pub struct BulkStatements {
    pub(crate) insert: BulkInsertPlan,
    pub(crate) insert_if_not_exists: Option<StagingPlan>,
    pub(crate) update: Option<StagingPlan>,
    pub(crate) delete: Option<StagingPlan>,
    pub(crate) get: StagingPlan,
    pub(crate) get_fields: Vec<usize>,
    pub(crate) upsert: BulkUpsertPlan,
}

struct Builder<'a> {
    meta: &'a TypeMetadata,
    staging: String,
}

impl<'a> Builder<'a> {
    fn plan(&self, staged: Vec<&'a Column>, apply: Vec<String>) -> StagingPlan {
        let dialect = self.meta.dialect();
        let list = column_list(staged.iter().copied(), None);
        StagingPlan {
            drop: dialect.drop_table_if_exists(&self.staging),
            create: dialect.create_staging_table(&self.staging, &list, self.meta.table()),
            staging: self.staging.clone(),
            columns: staged.iter().map(|c| c.quoted.clone()).collect(),
            fields: staged.iter().map(|c| c.field).collect(),
            apply,
        }
    }

    /// Columns of `sets`, deduplicated and kept in table order.
    fn union(&self, sets: &[&[&'a Column]]) -> Vec<&'a Column> {
        self.meta
            .columns()
            .iter()
            .filter(|c| sets.iter().any(|s| s.iter().any(|x| x.field == c.field)))
            .collect()
    }

    fn bound_insert_columns(&self) -> Vec<&'a Column> {
        self.meta
            .insert_columns()
            .filter(|c| c.insert_value.is_none())
            .collect()
    }

    fn bound_update_columns(&self) -> Vec<&'a Column> {
        self.meta
            .update_columns()
            .filter(|c| c.update_value.is_none())
            .collect()
    }

    /// `INSERT INTO t (cols) SELECT s.a, <literal>, ... FROM staging AS s [WHERE NOT EXISTS ...]`.
    fn insert_select(&self, guarded: bool) -> String {
        let meta = self.meta;
        let values: Vec<String> = meta
            .insert_columns()
            .map(|c| match c.insert_value {
                Some(expr) => expr.to_string(),
                None => format!("{STAGING_ALIAS}.{}", c.quoted),
            })
            .collect();
        let mut sql = format!(
            "INSERT INTO {table} ({cols}) SELECT {values} FROM {staging} AS {STAGING_ALIAS}",
            table = meta.table(),
            cols = column_list(meta.insert_columns(), None),
            values = values.join(", "),
            staging = self.staging,
        );
        if guarded {
            sql.push_str(&format!(
                " WHERE NOT EXISTS (SELECT 1 FROM {table} AS {TARGET_ALIAS} WHERE {on})",
                table = meta.table(),
                on = join_condition(meta.equality_columns(), TARGET_ALIAS, STAGING_ALIAS),
            ));
        }
        sql
    }

    /// Join update against the staged rows.
    ///
    /// The staging table is read through a derived table whose columns are renamed, so a
    /// literal such as `version + 1` can only resolve against the target table.
    fn update_join(&self) -> String {
        let meta = self.meta;
        let update_keys: Vec<&Column> = meta.update_key_columns().collect();
        let bound_update = self.bound_update_columns();
        let staged = self.union(&[update_keys.as_slice(), bound_update.as_slice()]);
        let renamed: Vec<String> = staged
            .iter()
            .map(|c| format!("{} AS {}", c.quoted, staged_alias(c)))
            .collect();
        let source = format!("(SELECT {} FROM {})", renamed.join(", "), self.staging);

        let set: Vec<Assignment> = meta
            .update_columns()
            .map(|c| Assignment {
                column: c.quoted.clone(),
                value: match c.update_value {
                    Some(expr) => expr.to_string(),
                    None => format!("{STAGING_ALIAS}.{}", staged_alias(c)),
                },
            })
            .collect();
        let on = update_keys
            .iter()
            .map(|c| format!("{TARGET_ALIAS}.{} = {STAGING_ALIAS}.{}", c.quoted, staged_alias(c)))
            .collect::<Vec<_>>()
            .join(" AND ");
        meta.dialect().bulk_update(meta.table(), &source, &set, &on)
    }
}

/// Name of a staged column inside the renamed derived table of a join update.
fn staged_alias(c: &Column) -> String {
    format!("crudforge_f{}", c.field)
}

impl BulkStatements {
    pub fn compile(meta: &TypeMetadata) -> Self {
        let flags = meta.flags();
        let b = Builder {
            meta,
            staging: meta.dialect().staging_table(meta.table()),
        };

        let equality: Vec<&Column> = meta.equality_columns().collect();
        let update_keys: Vec<&Column> = meta.update_key_columns().collect();
        let bound_insert = b.bound_insert_columns();
        let bound_update = b.bound_update_columns();

        let insertable = !flags.no_inserts && meta.insert_columns().len() > 0;
        let updatable = !flags.no_updates && meta.update_columns().len() > 0;

        let insert = if !insertable {
            BulkInsertPlan::NoOp
        } else if bound_insert.is_empty() {
            BulkInsertPlan::PerRow(insert_values(meta))
        } else {
            BulkInsertPlan::Staged(b.plan(bound_insert.clone(), vec![b.insert_select(false)]))
        };

        let guarded_columns = b.union(&[bound_insert.as_slice(), equality.as_slice()]);
        let insert_if_not_exists = insertable
            .then(|| b.plan(guarded_columns.clone(), vec![b.insert_select(true)]));

        let update_columns = b.union(&[update_keys.as_slice(), bound_update.as_slice()]);
        let update = updatable.then(|| b.plan(update_columns.clone(), vec![b.update_join()]));

        let delete = (!flags.no_deletes).then(|| {
            let on = join_condition(meta.delete_key_columns(), TARGET_ALIAS, STAGING_ALIAS);
            b.plan(
                meta.delete_key_columns().collect(),
                vec![meta.dialect().bulk_delete(meta.table(), &b.staging, &on)],
            )
        });

        let get = b.plan(
            equality.clone(),
            vec![format!(
                "SELECT {cols} FROM {table} AS {TARGET_ALIAS} INNER JOIN {staging} AS {STAGING_ALIAS} ON {on}",
                cols = column_list(meta.select_columns(), Some(TARGET_ALIAS)),
                table = meta.table(),
                staging = b.staging,
                on = join_condition(meta.equality_columns(), TARGET_ALIAS, STAGING_ALIAS),
            )],
        );

        let upsert = match (insertable, updatable) {
            (false, false) => BulkUpsertPlan::NoOp,
            (true, false) => {
                BulkUpsertPlan::InsertIfNotExists(b.plan(guarded_columns, vec![b.insert_select(true)]))
            }
            (false, true) => BulkUpsertPlan::UpdateOnly(b.plan(update_columns, vec![b.update_join()])),
            (true, true) => {
                let staged = b.union(&[guarded_columns.as_slice(), update_columns.as_slice()]);
                BulkUpsertPlan::UpdateThenInsert(
                    b.plan(staged, vec![b.update_join(), b.insert_select(true)]),
                )
            }
        };

        tracing::debug!(
            target: "crudforge.compile",
            type_name = meta.type_name(),
            staging = %b.staging,
            "bulk statements compiled"
        );

        Self {
            insert,
            insert_if_not_exists,
            update,
            delete,
            get,
            get_fields: meta.select_columns().map(|c| c.field).collect(),
            upsert,
        }
    }
}
