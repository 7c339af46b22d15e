//! Staging-table pipelines.
//!
//! Each bulk operation drops any leftover staging table, creates it from the target's
//! shape, streams the records in through [`BulkConnection::bulk_copy`], runs the set-based
//! statements against it and drops it again. All of it happens on the caller's
//! connection, so wrapping the call in a transaction makes the whole pipeline atomic.

use super::Statements;
use crate::client::BulkConnection;
use crate::compile::{BulkInsertPlan, BulkUpsertPlan, StagingPlan};
use crate::error::OrmResult;
use crate::exec::{self, read_records};
use crate::meta::Table;
use crate::value::Value;
use std::time::Duration;

impl<T: Table> Statements<T> {
    async fn stage<C: BulkConnection>(
        &self,
        conn: &C,
        plan: &StagingPlan,
        records: &[T],
        op: &'static str,
        timeout: Option<Duration>,
    ) -> OrmResult<()> {
        exec::execute(conn, op, &plan.drop, &[], timeout).await?;
        exec::execute(conn, op, &plan.create, &[], timeout).await?;
        let rows: Vec<Vec<Value>> = records
            .iter()
            .map(|r| plan.fields.iter().map(|&f| r.get_value(f)).collect())
            .collect();
        exec::bulk_copy(conn, op, &plan.staging, &plan.columns, rows, timeout).await?;
        Ok(())
    }

    /// Stage `records`, run every apply statement and drop the staging table.
    ///
    /// Returns the rows affected by the last apply statement.
    async fn run_staged<C: BulkConnection>(
        &self,
        conn: &C,
        plan: &StagingPlan,
        records: &[T],
        op: &'static str,
        timeout: Option<Duration>,
    ) -> OrmResult<u64> {
        self.stage(conn, plan, records, op, timeout).await?;
        let mut affected = 0;
        for sql in &plan.apply {
            affected = exec::execute(conn, op, sql, &[], timeout).await?;
        }
        exec::execute(conn, op, &plan.drop, &[], timeout).await?;
        tracing::debug!(
            target: "crudforge.bulk",
            type_name = self.meta.type_name(),
            op,
            records = records.len(),
            affected,
            "bulk pipeline finished"
        );
        Ok(affected)
    }

    /// Insert all records. Generated keys are not written back.
    pub async fn bulk_insert<C: BulkConnection>(
        &self,
        conn: &C,
        records: &[T],
        timeout: Option<Duration>,
    ) -> OrmResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }
        match &self.bulk().insert {
            BulkInsertPlan::NoOp => Ok(0),
            BulkInsertPlan::Staged(plan) => {
                self.run_staged(conn, plan, records, "bulk_insert", timeout)
                    .await
            }
            BulkInsertPlan::PerRow(sql) => {
                let mut inserted = 0;
                for record in records {
                    inserted += exec::execute(conn, "bulk_insert", &sql.sql, &sql.params(record), timeout)
                        .await?;
                }
                Ok(inserted)
            }
        }
    }

    /// Insert the records whose equality columns match no stored row.
    pub async fn bulk_insert_if_not_exists<C: BulkConnection>(
        &self,
        conn: &C,
        records: &[T],
        timeout: Option<Duration>,
    ) -> OrmResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }
        match &self.bulk().insert_if_not_exists {
            Some(plan) => {
                self.run_staged(conn, plan, records, "bulk_insert_if_not_exists", timeout)
                    .await
            }
            None => Ok(0),
        }
    }

    /// Update every stored row matched by a record's update keys.
    pub async fn bulk_update<C: BulkConnection>(
        &self,
        conn: &C,
        records: &[T],
        timeout: Option<Duration>,
    ) -> OrmResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }
        match &self.bulk().update {
            Some(plan) => {
                self.run_staged(conn, plan, records, "bulk_update", timeout)
                    .await
            }
            None => Ok(0),
        }
    }

    /// Delete every stored row matched by a record's delete keys.
    pub async fn bulk_delete<C: BulkConnection>(
        &self,
        conn: &C,
        records: &[T],
        timeout: Option<Duration>,
    ) -> OrmResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }
        match &self.bulk().delete {
            Some(plan) => {
                self.run_staged(conn, plan, records, "bulk_delete", timeout)
                    .await
            }
            None => Ok(0),
        }
    }

    /// Update matching rows, then insert the rest in the same staging pass.
    ///
    /// Returns the number of inserted rows; updates are not counted.
    pub async fn bulk_upsert<C: BulkConnection>(
        &self,
        conn: &C,
        records: &[T],
        timeout: Option<Duration>,
    ) -> OrmResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }
        match &self.bulk().upsert {
            BulkUpsertPlan::NoOp => Ok(0),
            BulkUpsertPlan::InsertIfNotExists(plan) | BulkUpsertPlan::UpdateThenInsert(plan) => {
                self.run_staged(conn, plan, records, "bulk_upsert", timeout)
                    .await
            }
            BulkUpsertPlan::UpdateOnly(plan) => {
                self.run_staged(conn, plan, records, "bulk_upsert", timeout)
                    .await?;
                Ok(0)
            }
        }
    }

    /// Stored rows matching any record on the equality columns.
    pub async fn bulk_get<C: BulkConnection>(
        &self,
        conn: &C,
        records: &[T],
        timeout: Option<Duration>,
    ) -> OrmResult<Vec<T>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let bulk = self.bulk();
        let plan = &bulk.get;
        self.stage(conn, plan, records, "bulk_get", timeout).await?;
        let mut rows = Vec::new();
        for sql in &plan.apply {
            rows.extend(exec::query(conn, "bulk_get", sql, &[], timeout).await?);
        }
        exec::execute(conn, "bulk_get", &plan.drop, &[], timeout).await?;
        read_records(rows, &bulk.get_fields)
    }
}
