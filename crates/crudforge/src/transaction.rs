//! Transaction macros.
//!
//! Every statement operation takes any [`Connection`](crate::Connection), and
//! `tokio_postgres::Transaction` (or the deadpool wrapper) is one. Running a bulk
//! pipeline or an upsert inside [`transaction!`] makes its statements atomic.
//!
//! ```ignore
//! let stmts = crudforge::statements::<Employee>()?;
//! crudforge::transaction!(&mut client, tx, {
//!     stmts.bulk_upsert(&tx, &employees, None).await?;
//!     stmts.delete_list(&tx, "WHERE Retired = $1", &[true.into()], None).await?;
//!     Ok(())
//! })?;
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

static SAVEPOINT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Runs the block inside a transaction: commit on `Ok`, roll back on `Err`.
///
/// The block must evaluate to `crudforge::OrmResult<T>`.
#[macro_export]
macro_rules! transaction {
    ($client:expr, $tx:ident, $body:block) => {{
        let mut $tx = ($client)
            .transaction()
            .await
            .map_err($crate::OrmError::from_db_error)?;

        let __crudforge_tx_result = async { $body }.await;
        match __crudforge_tx_result {
            Ok(value) => {
                $tx.commit()
                    .await
                    .map_err($crate::OrmError::from_db_error)?;
                Ok(value)
            }
            Err(error) => match $tx.rollback().await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::OrmError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }};
}

/// Runs the block inside a savepoint of an open transaction.
///
/// Without a name the savepoint is numbered automatically.
#[macro_export]
macro_rules! savepoint {
    ($tx:expr, $name:expr, $sp:ident, $body:block) => {{
        let mut $sp = ($tx)
            .savepoint($name)
            .await
            .map_err($crate::OrmError::from_db_error)?;

        let __crudforge_sp_result = async { $body }.await;
        match __crudforge_sp_result {
            Ok(value) => {
                $sp.commit()
                    .await
                    .map_err($crate::OrmError::from_db_error)?;
                Ok(value)
            }
            Err(error) => match $sp.rollback().await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::OrmError::Other(format!(
                    "{error} (savepoint rollback failed: {rollback_err})"
                ))),
            },
        }
    }};
    ($tx:expr, $sp:ident, $body:block) => {{
        let __crudforge_sp_name = $crate::__next_savepoint_name();
        $crate::savepoint!($tx, &__crudforge_sp_name, $sp, $body)
    }};
}

#[doc(hidden)]
pub fn __next_savepoint_name() -> String {
    let n = SAVEPOINT_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("crudforge_sp_{n}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn savepoint_names_are_unique() {
        let a = __next_savepoint_name();
        let b = __next_savepoint_name();
        assert_ne!(a, b);
        assert!(a.starts_with("crudforge_sp_"));
    }
}
