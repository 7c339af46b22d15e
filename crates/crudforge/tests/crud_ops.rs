//! Statement operations against a recording connection.

mod common;

use chrono::NaiveDate;
use common::{Call, SpyConnection, row};
use crudforge::{Table, Value};

#[derive(Debug, Clone, Default, PartialEq, Table)]
#[crud(table = "Employees", syntax = "sqlserver")]
struct Employee {
    #[crud(auto_key, column = "EmployeeID")]
    id: i32,
    #[crud(column = "LastName")]
    last_name: String,
    #[crud(column = "ModifiedDate", ignore_insert(auto_sync))]
    modified: Option<chrono::NaiveDateTime>,
    #[crud(skip)]
    scratch: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Table)]
#[crud(table = "products")]
struct Product {
    #[crud(auto_key)]
    id: i64,
    sku: String,
    price: f64,
}

#[derive(Debug, Clone, Default, Table)]
#[crud(table = "audit", no_deletes)]
struct Audit {
    #[crud(key)]
    id: i64,
    action: String,
}

#[derive(Debug, Clone, Default, Table)]
#[crud(table = "settings", no_updates)]
struct Setting {
    #[crud(key)]
    name: String,
    value: String,
}

#[derive(Debug, Clone, Default, Table)]
#[crud(table = "docs")]
struct Doc {
    #[crud(key)]
    id: i64,
    #[crud(match_update(value = "version + 1", auto_sync))]
    version: i32,
    body: String,
}

fn product(sku: &str, price: f64) -> Product {
    Product {
        id: 0,
        sku: sku.to_string(),
        price,
    }
}

#[tokio::test]
async fn insert_writes_back_identity_and_synced_columns() {
    let stmts = crudforge::statements::<Employee>().unwrap();
    let modified = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    let conn = SpyConnection::new()
        .scalar(Some(Value::I32(42)))
        .rows(vec![row(vec![("ModifiedDate", Value::Timestamp(modified))])]);

    let mut e = Employee {
        last_name: "Hopper".into(),
        ..Default::default()
    };
    assert!(stmts.insert(&conn, &mut e, None).await.unwrap());
    assert_eq!(e.id, 42);
    assert_eq!(e.modified, Some(modified));

    let calls = conn.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0],
        Call::Scalar {
            sql: "INSERT INTO Employees (LastName) VALUES (@p1); SELECT CAST(SCOPE_IDENTITY() AS INT)"
                .into(),
            params: vec![Value::Text("Hopper".into())],
        }
    );
    assert_eq!(
        calls[1],
        Call::Query {
            sql: "SELECT ModifiedDate FROM Employees WHERE EmployeeID = @p1".into(),
            params: vec![Value::I32(42)],
        }
    );
}

#[tokio::test]
async fn follow_up_identity_only_after_a_row_was_written() {
    let stmts = crudforge::statements::<Product>().unwrap();
    let conn = SpyConnection::new()
        .affected([1, 0])
        .scalar(Some(Value::I64(7)));

    let mut p = product("A-1", 9.5);
    assert!(stmts.insert(&conn, &mut p, None).await.unwrap());
    assert_eq!(p.id, 7);

    let mut dup = product("A-1", 9.5);
    dup.id = 7;
    assert!(!stmts.insert_if_not_exists(&conn, &mut dup, None).await.unwrap());

    assert_eq!(
        conn.sqls(),
        [
            "INSERT INTO products (sku, price) VALUES ($1, $2)",
            "SELECT lastval()",
            "INSERT INTO products (sku, price) SELECT $1, $2 WHERE NOT EXISTS (SELECT 1 FROM products WHERE id = $3)",
        ]
    );
}

#[tokio::test]
async fn get_reads_by_key() {
    let stmts = crudforge::statements::<Product>().unwrap();
    let conn = SpyConnection::new().rows(vec![row(vec![
        ("id", Value::I64(3)),
        ("sku", Value::Text("B-2".into())),
        ("price", Value::F64(1.25)),
    ])]);
    let lookup = Product {
        id: 3,
        ..Default::default()
    };
    let found = stmts.get(&conn, &lookup, None).await.unwrap().unwrap();
    assert_eq!(found.sku, "B-2");
    assert_eq!(found.price, 1.25);
    assert_eq!(conn.calls()[0].params(), [Value::I64(3)]);

    let missing = SpyConnection::new();
    assert!(stmts.get(&missing, &lookup, None).await.unwrap().is_none());
}

#[tokio::test]
async fn where_clause_operations_append_the_caller_clause() {
    let stmts = crudforge::statements::<Product>().unwrap();
    let conn = SpyConnection::new()
        .scalar(Some(Value::I64(12)))
        .affected([4]);

    let params = [Value::Text("A%".into())];
    stmts
        .get_list(&conn, "WHERE sku LIKE $1 ORDER BY id", &params, None)
        .await
        .unwrap();
    stmts
        .get_limited(&conn, 10, "WHERE sku LIKE $1", &params, None)
        .await
        .unwrap();
    stmts.get_distinct(&conn, "", &[], None).await.unwrap();
    let count = stmts.record_count(&conn, "WHERE price > $1", &[Value::F64(2.0)], None)
        .await
        .unwrap();
    assert_eq!(count, 12);
    let deleted = stmts.delete_list(&conn, "WHERE price = $1", &[Value::F64(0.0)], None)
        .await
        .unwrap();
    assert_eq!(deleted, 4);

    let calls = conn.calls();
    assert_eq!(
        calls[0].sql(),
        "SELECT id, sku, price FROM products WHERE sku LIKE $1 ORDER BY id"
    );
    assert_eq!(
        calls[1].sql(),
        "SELECT id, sku, price FROM products WHERE sku LIKE $1 LIMIT $2"
    );
    assert_eq!(calls[1].params(), [Value::Text("A%".into()), Value::I64(10)]);
    assert_eq!(calls[2].sql(), "SELECT DISTINCT id, sku, price FROM products");
    assert_eq!(
        calls[3].sql(),
        "SELECT COUNT(*) FROM products WHERE price > $1"
    );
    assert_eq!(calls[4].sql(), "DELETE FROM products WHERE price = $1");
}

#[tokio::test]
async fn sqlserver_limit_uses_top() {
    let stmts = crudforge::statements::<Employee>().unwrap();
    let conn = SpyConnection::new();
    stmts
        .get_distinct_limited(&conn, 5, "ORDER BY LastName", &[], None)
        .await
        .unwrap();
    let calls = conn.calls();
    assert_eq!(
        calls[0].sql(),
        "SELECT DISTINCT TOP (@p1) EmployeeID, LastName, ModifiedDate FROM Employees ORDER BY LastName"
    );
    assert_eq!(calls[0].params(), [Value::I64(5)]);
}

#[tokio::test]
async fn disabled_deletes_issue_no_sql() {
    let stmts = crudforge::statements::<Audit>().unwrap();
    let conn = SpyConnection::new();
    let a = Audit {
        id: 1,
        action: "login".into(),
    };

    assert!(!stmts.delete(&conn, &a, None).await.unwrap());
    assert_eq!(stmts.delete_list(&conn, "WHERE 1 = 1", &[], None).await.unwrap(), 0);
    assert_eq!(stmts.delete_all(&conn, None).await.unwrap(), 0);
    stmts.truncate(&conn, None).await.unwrap();
    assert_eq!(stmts.bulk_delete(&conn, &[a.clone()], None).await.unwrap(), 0);

    let by_id = crudforge::key_statements::<Audit, i64>().unwrap();
    assert!(!by_id.delete(&conn, &1, None).await.unwrap());
    assert_eq!(by_id.bulk_delete(&conn, &[1, 2, 3], None).await.unwrap(), 0);

    assert!(conn.calls().is_empty());
}

#[tokio::test]
async fn upsert_without_updates_is_insert_if_not_exists() {
    let stmts = crudforge::statements::<Setting>().unwrap();
    let conn = SpyConnection::new().affected([1, 0]);
    let mut s = Setting {
        name: "theme".into(),
        value: "dark".into(),
    };

    assert!(stmts.upsert(&conn, &mut s, None).await.unwrap());
    assert!(!stmts.upsert(&conn, &mut s, None).await.unwrap());
    assert!(!stmts.update(&conn, &mut s, None).await.unwrap());

    let expected = "INSERT INTO settings (name, value) SELECT $1, $2 WHERE NOT EXISTS (SELECT 1 FROM settings WHERE name = $3)";
    assert_eq!(conn.sqls(), [expected, expected]);
}

#[tokio::test]
async fn upsert_inserts_only_when_update_missed() {
    let stmts = crudforge::statements::<Product>().unwrap();
    let conn = SpyConnection::new()
        .affected([1, 0, 1])
        .scalar(Some(Value::I64(99)));

    let mut hit = product("C-3", 4.0);
    hit.id = 5;
    assert!(!stmts.upsert(&conn, &mut hit, None).await.unwrap());

    let mut miss = product("D-4", 8.0);
    assert!(stmts.upsert(&conn, &mut miss, None).await.unwrap());
    assert_eq!(miss.id, 99);

    let update = "UPDATE products SET sku = $1, price = $2 WHERE id = $3";
    assert_eq!(
        conn.sqls(),
        [
            update,
            update,
            "INSERT INTO products (sku, price) VALUES ($1, $2)",
            "SELECT lastval()",
        ]
    );
}

#[tokio::test]
async fn update_resyncs_match_update_columns() {
    let stmts = crudforge::statements::<Doc>().unwrap();
    let conn = SpyConnection::new()
        .affected([1, 0])
        .rows(vec![row(vec![("version", Value::I32(4))])]);
    let mut d = Doc {
        id: 1,
        version: 3,
        body: "text".into(),
    };

    assert!(stmts.update(&conn, &mut d, None).await.unwrap());
    assert_eq!(d.version, 4);

    // A stale version matches nothing and leaves the record untouched.
    assert!(!stmts.update(&conn, &mut d, None).await.unwrap());
    assert_eq!(d.version, 4);

    let calls = conn.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[0].sql(),
        "UPDATE docs SET version = version + 1, body = $1 WHERE id = $2 AND version = $3"
    );
    assert_eq!(
        calls[0].params(),
        [Value::Text("text".into()), Value::I64(1), Value::I32(3)]
    );
    assert_eq!(calls[1].sql(), "SELECT version FROM docs WHERE id = $1");
}

#[tokio::test]
async fn key_lookups_batch_by_2000() {
    let by_id = crudforge::key_statements::<Product, i64>().unwrap();
    assert_eq!(by_id.batch_size(), 2000);
    let conn = SpyConnection::new();
    let keys: Vec<i64> = (1..=4500).collect();

    let found = by_id.bulk_get(&conn, &keys, None).await.unwrap();
    assert!(found.is_empty());

    let calls = conn.calls();
    let sizes: Vec<usize> = calls.iter().map(|c| c.params().len()).collect();
    assert_eq!(sizes, [2000, 2000, 500]);
    assert!(calls[2].sql().ends_with("$499, $500)"));
    assert_eq!(calls[2].params()[0], Value::I64(4001));
    assert_eq!(calls[0].sql(), calls[1].sql());

    let none = SpyConnection::new();
    assert!(by_id.bulk_get(&none, &[], None).await.unwrap().is_empty());
    assert!(none.calls().is_empty());
}

#[tokio::test]
async fn key_get_and_keys() {
    let by_id = crudforge::key_statements::<Product, i64>().unwrap();
    let conn = SpyConnection::new()
        .rows(vec![row(vec![
            ("id", Value::I64(8)),
            ("sku", Value::Text("E-5".into())),
            ("price", Value::F64(3.0)),
        ])])
        .rows(vec![
            row(vec![("id", Value::I64(1))]),
            row(vec![("id", Value::I64(2))]),
        ])
        .affected([1]);

    let p = by_id.get(&conn, &8, None).await.unwrap().unwrap();
    assert_eq!(p.sku, "E-5");

    let keys = by_id
        .get_keys(&conn, "WHERE price < $1", &[Value::F64(5.0)], None)
        .await
        .unwrap();
    assert_eq!(keys, [1, 2]);

    assert!(by_id.delete(&conn, &8, None).await.unwrap());
    assert_eq!(
        conn.sqls(),
        [
            "SELECT id, sku, price FROM products WHERE id = $1",
            "SELECT id FROM products WHERE price < $1",
            "DELETE FROM products WHERE id = $1",
        ]
    );
}

#[tokio::test]
async fn bulk_insert_runs_the_staging_pipeline_in_order() {
    let stmts = crudforge::statements::<Product>().unwrap();
    let conn = SpyConnection::new().affected([0, 0, 2, 0]);
    let rows = [product("A", 1.0), product("B", 2.0)];

    assert_eq!(stmts.bulk_insert(&conn, &rows, None).await.unwrap(), 2);

    let calls = conn.calls();
    assert_eq!(calls.len(), 5);
    assert_eq!(calls[0].sql(), "DROP TABLE IF EXISTS crudforge_stage_products");
    assert!(calls[1].sql().starts_with("CREATE TEMP TABLE crudforge_stage_products"));
    assert_eq!(
        calls[2],
        Call::Copy {
            table: "crudforge_stage_products".into(),
            columns: vec!["sku".into(), "price".into()],
            rows: vec![
                vec![Value::Text("A".into()), Value::F64(1.0)],
                vec![Value::Text("B".into()), Value::F64(2.0)],
            ],
        }
    );
    assert!(calls[3].sql().starts_with("INSERT INTO products"));
    assert_eq!(calls[4].sql(), calls[0].sql());
}

#[tokio::test]
async fn bulk_update_shares_match_update_literal_with_single_update() {
    let stmts = crudforge::statements::<Doc>().unwrap();
    let conn = SpyConnection::new().affected([0, 0, 2, 0]);
    let docs = [
        Doc {
            id: 1,
            version: 3,
            body: "a".into(),
        },
        Doc {
            id: 2,
            version: 7,
            body: "b".into(),
        },
    ];

    assert_eq!(stmts.bulk_update(&conn, &docs, None).await.unwrap(), 2);

    let calls = conn.calls();
    assert_eq!(calls.len(), 5);
    assert_eq!(
        calls[3].sql(),
        "UPDATE docs AS t SET version = version + 1, body = s.crudforge_f2 \
         FROM (SELECT id AS crudforge_f0, version AS crudforge_f1, body AS crudforge_f2 FROM crudforge_stage_docs) AS s \
         WHERE t.id = s.crudforge_f0 AND t.version = s.crudforge_f1"
    );
}

#[tokio::test]
async fn bulk_upsert_reports_inserted_rows_only() {
    let stmts = crudforge::statements::<Product>().unwrap();
    // drop, create, update (5 rows), insert (3 rows), drop
    let conn = SpyConnection::new().affected([0, 0, 5, 3, 0]);
    let rows: Vec<Product> = (0..8).map(|i| product(&format!("S-{i}"), i as f64)).collect();

    assert_eq!(stmts.bulk_upsert(&conn, &rows, None).await.unwrap(), 3);

    let calls = conn.calls();
    assert_eq!(calls.len(), 6);
    assert!(calls[3].sql().starts_with("UPDATE products AS t"));
    assert!(calls[4].sql().contains("WHERE NOT EXISTS"));
    match &calls[2] {
        Call::Copy { columns, rows, .. } => {
            assert_eq!(columns.len(), 3);
            assert_eq!(rows.len(), 8);
        }
        other => panic!("expected copy, got {other:?}"),
    }
}

#[tokio::test]
async fn bulk_get_reads_joined_rows() {
    let stmts = crudforge::statements::<Product>().unwrap();
    let conn = SpyConnection::new().rows(vec![row(vec![
        ("id", Value::I64(1)),
        ("sku", Value::Text("A".into())),
        ("price", Value::F64(1.0)),
    ])]);
    let lookups = [Product {
        id: 1,
        ..Default::default()
    }];

    let found = stmts.bulk_get(&conn, &lookups, None).await.unwrap();
    assert_eq!(found, [product_with_id(1, "A", 1.0)]);
    let calls = conn.calls();
    assert_eq!(calls.len(), 5);
    assert!(matches!(calls[3], Call::Query { .. }));
}

#[tokio::test]
async fn bulk_operations_on_empty_input_issue_no_sql() {
    let stmts = crudforge::statements::<Product>().unwrap();
    let conn = SpyConnection::new();
    assert_eq!(stmts.bulk_insert(&conn, &[], None).await.unwrap(), 0);
    assert_eq!(stmts.bulk_update(&conn, &[], None).await.unwrap(), 0);
    assert_eq!(stmts.bulk_upsert(&conn, &[], None).await.unwrap(), 0);
    assert_eq!(stmts.bulk_insert_if_not_exists(&conn, &[], None).await.unwrap(), 0);
    assert!(stmts.bulk_get(&conn, &[], None).await.unwrap().is_empty());
    assert!(conn.calls().is_empty());
}

fn product_with_id(id: i64, sku: &str, price: f64) -> Product {
    Product {
        id,
        ..product(sku, price)
    }
}
