use super::*;

#[test]
fn syntax_selects_dialect() {
    assert_eq!(Syntax::default().dialect().name(), "postgres");
    assert_eq!(Syntax::SqlServer.dialect().name(), "sqlserver");
    assert_eq!(Syntax::MySql.dialect().name(), "mysql");
    assert_eq!(Syntax::Sqlite.dialect().name(), "sqlite");
}

#[test]
fn quoting_per_engine() {
    assert_eq!(Postgres.quote("Order Details"), r#""Order Details""#);
    assert_eq!(SqlServer.quote("Order Details"), "[Order Details]");
    assert_eq!(MySql.quote("Order`Details"), "`Order``Details`");
    assert_eq!(Sqlite.quote("Employees"), "Employees");
}

#[test]
fn placeholders() {
    assert_eq!(Postgres.placeholder(3), "$3");
    assert_eq!(SqlServer.placeholder(3), "@p3");
    assert_eq!(MySql.placeholder(3), "?");
    assert_eq!(Sqlite.placeholder(3), "?3");
}

#[test]
fn limit_shapes() {
    assert_eq!(
        Postgres.limit_query(false, "a, b", "FROM t WHERE a > $1", "$2"),
        "SELECT a, b FROM t WHERE a > $1 LIMIT $2"
    );
    assert_eq!(
        SqlServer.limit_query(true, "a", "FROM t", "@p1"),
        "SELECT DISTINCT TOP (@p1) a FROM t"
    );
}

#[test]
fn staging_names() {
    assert_eq!(
        Postgres.staging_table("Employees"),
        "crudforge_stage_Employees"
    );
    assert_eq!(
        Postgres.staging_table(r#""Order Details""#),
        "crudforge_stage_Order_Details"
    );
    assert_eq!(SqlServer.staging_table("hr.Employees"), "#crudforge_stage_hr_Employees");
}

#[test]
fn staging_lifecycle_sql() {
    assert_eq!(
        Postgres.create_staging_table("stg", "id, name", "users"),
        "CREATE TEMP TABLE stg AS SELECT id, name FROM users WHERE 1 = 0"
    );
    assert_eq!(
        SqlServer.create_staging_table("#stg", "id", "users"),
        "SELECT TOP (0) id INTO #stg FROM users UNION ALL SELECT TOP (0) id FROM users"
    );
    assert_eq!(
        SqlServer.drop_table_if_exists("#stg"),
        "IF OBJECT_ID('tempdb..#stg') IS NOT NULL DROP TABLE #stg"
    );
    assert_eq!(MySql.drop_table_if_exists("stg"), "DROP TEMPORARY TABLE IF EXISTS stg");
    assert_eq!(Sqlite.truncate_table("users"), "DELETE FROM users");
    assert_eq!(Postgres.truncate_table("users"), "TRUNCATE TABLE users");
}

#[test]
fn identity_is_sized_by_key_width() {
    assert_eq!(
        SqlServer.identity_select(ScalarKind::I32),
        "SELECT CAST(SCOPE_IDENTITY() AS INT)"
    );
    assert_eq!(
        SqlServer.identity_select(ScalarKind::I64),
        "SELECT CAST(SCOPE_IDENTITY() AS BIGINT)"
    );
    assert_eq!(
        Postgres.identity_select(ScalarKind::I32),
        "SELECT CAST(lastval() AS integer)"
    );
    assert_eq!(Postgres.identity_select(ScalarKind::I64), "SELECT lastval()");
    assert!(SqlServer.identity_in_batch());
    assert!(!Postgres.identity_in_batch());
}

#[test]
fn bulk_update_shapes() {
    let set = [Assignment {
        column: "name".into(),
        value: "s.name".into(),
    }];
    assert_eq!(
        Postgres.bulk_update("users", "stg", &set, "t.id = s.id"),
        "UPDATE users AS t SET name = s.name FROM stg AS s WHERE t.id = s.id"
    );
    assert_eq!(
        SqlServer.bulk_update("users", "#stg", &set, "t.id = s.id"),
        "UPDATE t SET t.name = s.name FROM users AS t INNER JOIN #stg AS s ON t.id = s.id"
    );
    assert_eq!(
        MySql.bulk_update("users", "stg", &set, "t.id = s.id"),
        "UPDATE users AS t INNER JOIN stg AS s ON t.id = s.id SET t.name = s.name"
    );
}

#[test]
fn bulk_delete_shapes() {
    assert_eq!(
        Postgres.bulk_delete("users", "stg", "t.id = s.id"),
        "DELETE FROM users AS t USING stg AS s WHERE t.id = s.id"
    );
    assert_eq!(
        SqlServer.bulk_delete("users", "#stg", "t.id = s.id"),
        "DELETE t FROM users AS t INNER JOIN #stg AS s ON t.id = s.id"
    );
    assert_eq!(
        Sqlite.bulk_delete("users", "stg", "t.id = s.id"),
        "DELETE FROM users AS t WHERE EXISTS (SELECT 1 FROM stg AS s WHERE t.id = s.id)"
    );
}
