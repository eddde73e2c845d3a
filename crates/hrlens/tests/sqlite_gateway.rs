use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use hrlens::store::schema::{
    HrRecord, count_records, ensure_hr_schema, insert_records, open_writable_connection,
};
use hrlens::store::{GatewayError, NO_RESULTS_TEXT, Scalar, SqliteGateway, TabularGateway};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}-{nanos}"))
}

fn empty_database(prefix: &str) -> PathBuf {
    let path = unique_temp_dir(prefix).join("hr_data.sqlite");
    let connection = open_writable_connection(&path).expect("database should be creatable");
    ensure_hr_schema(&connection).expect("schema should be created");
    path
}

#[test]
fn describes_schema_of_empty_store() {
    let path = empty_database("hrlens-gateway-schema");
    let gateway = SqliteGateway::new(path);

    let description = gateway.describe_schema().expect("schema should describe");

    assert!(description.starts_with("Table: hr_data\nColumns: id (INTEGER), month (TEXT)"));
    assert!(description.contains("overall_inactive_count (INTEGER)"));
    assert!(description.contains("tenure_bucket (TEXT)"));
    assert!(!description.contains("sqlite_sequence"));
}

#[test]
fn missing_file_is_store_unavailable() {
    let gateway = SqliteGateway::new(unique_temp_dir("hrlens-gateway-missing").join("none.sqlite"));

    let error = gateway
        .describe_schema()
        .expect_err("missing database must fail");

    assert!(error.is_store_unavailable());
    assert!(error.message().contains("database file not found"));
}

#[test]
fn execution_errors_keep_engine_message() {
    let gateway = SqliteGateway::new(empty_database("hrlens-gateway-exec-error"));

    let error = gateway
        .execute("SELECT salary FROM hr_data")
        .expect_err("unknown column must fail");

    match error {
        GatewayError::QueryExecution(message) => {
            assert!(message.contains("no such column: salary"), "{message}")
        }
        other => panic!("expected query execution error, got {other:?}"),
    }
}

#[test]
fn mutating_statements_are_rejected() {
    let path = empty_database("hrlens-gateway-guardrail");
    let gateway = SqliteGateway::new(path.clone());

    for statement in [
        "DELETE FROM hr_data",
        "SELECT 1; DROP TABLE hr_data",
        "UPDATE hr_data SET age = 1",
        "WITH d AS (SELECT id FROM hr_data) DELETE FROM hr_data WHERE id IN (SELECT id FROM d)",
    ] {
        let error = gateway
            .execute(statement)
            .expect_err("mutation must be rejected");
        assert!(!error.is_store_unavailable(), "{statement}");
    }

    let connection = open_writable_connection(&path).expect("database should reopen");
    assert_eq!(count_records(&connection).expect("count should succeed"), 0);
}

#[test]
fn preserves_projection_order_and_value_types() {
    let path = empty_database("hrlens-gateway-values");
    let mut connection = open_writable_connection(&path).expect("database should reopen");
    insert_records(
        &mut connection,
        &[HrRecord {
            month: "March".to_string(),
            date: "2024-03-01".to_string(),
            month_year: "March 2024".to_string(),
            year: 2024,
            count: 1,
            emp_id: "EMP0042".to_string(),
            employee_name: "Linda Moore".to_string(),
            age: Some(41),
            active_count: 1,
            ..HrRecord::default()
        }],
        500,
    )
    .expect("row should insert");

    let gateway = SqliteGateway::new(path);
    let rows = gateway
        .execute("SELECT emp_id, age, gender, age * 0.5 AS half FROM hr_data;")
        .expect("query should run");

    assert_eq!(rows.len(), 1);
    let columns = rows[0].columns().collect::<Vec<_>>();
    assert_eq!(columns, ["emp_id", "age", "gender", "half"]);
    assert_eq!(rows[0].get("emp_id"), Some(&Scalar::Text("EMP0042".to_string())));
    assert_eq!(rows[0].get("age"), Some(&Scalar::Integer(41)));
    assert_eq!(rows[0].get("gender"), Some(&Scalar::Null));
    assert_eq!(rows[0].get("half"), Some(&Scalar::Real(20.5)));

    insta::assert_snapshot!(gateway.render(&rows), @r"
    emp_id  | age | gender | half
    --------+-----+--------+-----
    EMP0042 | 41  | NULL   | 20.5
    ");
}

#[test]
fn empty_result_renders_fixed_message() {
    let gateway = SqliteGateway::new(empty_database("hrlens-gateway-empty"));

    let rows = gateway
        .execute("SELECT emp_id FROM hr_data WHERE age > 100")
        .expect("query should run");

    assert!(rows.is_empty());
    assert_eq!(gateway.render(&rows), NO_RESULTS_TEXT);
}

fn seeded_database(prefix: &str, records: &[HrRecord]) -> PathBuf {
    let path = empty_database(prefix);
    let mut connection = open_writable_connection(&path).expect("database should reopen");
    insert_records(&mut connection, records, 500).expect("rows should insert");
    path
}

fn month_row(emp_id: &str, month: &str, reason: Option<&str>) -> HrRecord {
    HrRecord {
        month: month.to_string(),
        date: "2024-01-01".to_string(),
        month_year: format!("{month} 2024"),
        year: 2024,
        count: 1,
        emp_id: emp_id.to_string(),
        employee_name: format!("Employee {emp_id}"),
        reason: reason.map(str::to_string),
        active_count: 1,
        ..HrRecord::default()
    }
}

#[test]
fn read_only_queries_with_comments_and_keyword_literals_run() {
    let gateway = SqliteGateway::new(seeded_database(
        "hrlens-gateway-literals",
        &[
            month_row("EMP0001", "January", Some("Role update requested")),
            month_row("EMP0002", "January", None),
        ],
    ));

    for (query, expected) in [
        ("-- headcount\nSELECT COUNT(*) AS n FROM hr_data", 2),
        ("(SELECT COUNT(*) AS n FROM hr_data)", 2),
        ("/* reasons */ SELECT COUNT(*) AS n FROM hr_data WHERE reason LIKE '%update%';", 1),
        ("SELECT COUNT(*) AS n FROM hr_data WHERE reason LIKE '%analyze%' ; -- none", 0),
    ] {
        let rows = gateway
            .execute(query)
            .unwrap_or_else(|error| panic!("{query} should run: {error}"));
        assert_eq!(rows[0].get("n"), Some(&Scalar::Integer(expected)), "{query}");
    }
}

#[test]
fn self_join_renders_both_same_named_columns() {
    let gateway = SqliteGateway::new(seeded_database(
        "hrlens-gateway-self-join",
        &[
            month_row("EMP0001", "January", None),
            month_row("EMP0001", "March", None),
        ],
    ));

    let rows = gateway
        .execute(
            "SELECT a.month, b.month FROM hr_data a JOIN hr_data b ON a.emp_id = b.emp_id \
             WHERE a.month = 'January' AND b.month = 'March'",
        )
        .expect("self join should run");

    insta::assert_snapshot!(gateway.render(&rows), @r"
    month   | month
    --------+------
    January | March
    ");
}

#[test]
fn idle_connections_are_reused_up_to_the_limit() {
    let path = empty_database("hrlens-gateway-pool");
    let gateway = SqliteGateway::new(path).with_max_idle_connections(1);
    assert_eq!(gateway.idle_connections(), 0);

    std::thread::scope(|scope| {
        for _ in 0..3 {
            scope.spawn(|| {
                gateway
                    .execute("SELECT COUNT(*) FROM hr_data")
                    .expect("concurrent query should run");
            });
        }
    });

    assert_eq!(gateway.idle_connections(), 1);
    gateway.describe_schema().expect("schema should describe");
    assert_eq!(gateway.idle_connections(), 1);
}
