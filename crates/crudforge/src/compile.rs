//! Statement synthesis.
//!
//! Each statement group is rendered once from [`TypeMetadata`](crate::meta::TypeMetadata)
//! and kept for the life of the process:
//!
//! - [`CoreStatements`]: single-row and where-clause operations
//! - [`BulkStatements`]: staging-table pipelines
//! - [`KeyStatementsSql`]: operations addressed by a bare key value
//!
//! Every operation resolves at compile time to a no-op, a single statement, or a staging
//! pipeline. Caller values only ever travel as bound parameters; the only SQL text not
//! derived from quoted metadata names is the literal overrides declared on the record.

mod bulk;
mod crud;
mod key;
mod sql;


pub use bulk::{BulkInsertPlan, BulkStatements, BulkUpsertPlan, StagingPlan};
pub use crud::{
    CoreStatements, Identity, IdentityFetch, InsertPlan, SyncPlan, UpdatePlan, UpsertPlan,
};
pub use key::KeyStatementsSql;
pub use sql::CompiledSql;

pub(crate) use sql::with_clause;
