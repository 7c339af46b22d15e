//! Compile-only tests for core API patterns.
//!
//! These tests verify that key API surfaces compile correctly.
//! They do NOT execute against a database; they only check types and signatures.

#![allow(dead_code)]

use crudforge::prelude::*;

#[derive(Debug, Clone, Default, Table)]
#[crud(table = "compile_users")]
struct CompileUser {
    #[crud(auto_key)]
    id: i64,
    name: String,
    #[crud(column = "email_address")]
    email: Option<String>,
    #[crud(ignore_select)]
    #[crud(column = "pw_hash")]
    password_hash: Vec<u8>,
    #[crud(skip)]
    cached: Option<std::collections::HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Table)]
#[crud(table = "compile_tags", schema = "meta", syntax = "mysql", no_updates)]
struct CompileTag {
    #[crud(key)]
    id: uuid::Uuid,
    #[crud(ordinal = -1)]
    label: String,
    payload: serde_json::Value,
}

fn assert_connection<C: Connection>() {}
fn assert_bulk_connection<C: BulkConnection>() {}

#[test]
fn compile_connection_impls() {
    assert_bulk_connection::<tokio_postgres::Client>();
    assert_bulk_connection::<tokio_postgres::Transaction<'static>>();
    assert_bulk_connection::<&tokio_postgres::Client>();
    assert_bulk_connection::<crudforge::deadpool_postgres::Client>();
    assert_bulk_connection::<crudforge::deadpool_postgres::Transaction<'static>>();
    assert_connection::<crudforge::deadpool_postgres::ClientWrapper>();
}

#[test]
fn compile_statement_calls() {
    async fn run(client: &tokio_postgres::Client) -> OrmResult<()> {
        let stmts = crudforge::statements::<CompileUser>()?;
        let mut user = CompileUser::default();
        let _: bool = stmts.insert(client, &mut user, None).await?;
        let _: bool = stmts.update(client, &mut user, None).await?;
        let _: bool = stmts.upsert(client, &mut user, None).await?;
        let _: Option<CompileUser> = stmts.get(client, &user, None).await?;
        let _: Vec<CompileUser> = stmts
            .get_list(client, "WHERE name = $1", &["x".into()], None)
            .await?;
        let _: u64 = stmts.bulk_insert(client, &[user.clone()], None).await?;

        let by_id = crudforge::key_statements::<CompileUser, i64>()?;
        let _: Vec<CompileUser> = by_id.bulk_get(client, &[1, 2], None).await?;
        let _: Vec<i64> = by_id.get_keys(client, "", &[], None).await?;
        Ok(())
    }
    let _ = run;
}

#[test]
fn compile_transaction_macro() {
    async fn run(client: &mut tokio_postgres::Client) -> OrmResult<u64> {
        let stmts = crudforge::statements::<CompileTag>()?;
        crudforge::transaction!(client, tx, {
            let n = stmts.bulk_upsert(&tx, &[], None).await?;
            crudforge::savepoint!(tx, sp, {
                stmts.delete_all(&sp, None).await?;
                Ok::<_, OrmError>(())
            })?;
            Ok::<_, OrmError>(n)
        })
    }
    let _ = run;
}

#[test]
fn compile_derived_tables_validate() {
    let info = crudforge::type_info::<CompileTag>().unwrap();
    assert_eq!(info.table(), "meta.compile_tags");
    assert_eq!(info.columns()[0].column, "label");

    let users = crudforge::type_info::<CompileUser>().unwrap();
    assert_eq!(users.select_columns().count(), 3);
    assert_eq!(users.insert_columns().count(), 3);
    let hash = &users.columns()[3];
    assert_eq!(hash.column, "pw_hash");
    assert!(!users.select_columns().any(|c| c.column == "pw_hash"));
}
