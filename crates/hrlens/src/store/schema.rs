use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params_from_iter};

pub const HR_TABLE: &str = "hr_data";
pub const DEFAULT_INSERT_BATCH_SIZE: usize = 500;

pub const HR_INSERT_COLUMNS: &[&str] = &[
    "month",
    "date",
    "month_year",
    "year",
    "count",
    "emp_id",
    "employee_name",
    "date_of_birth",
    "age",
    "gender",
    "date_of_joining",
    "band",
    "designation",
    "process",
    "voice_non_voice",
    "account_name",
    "domain",
    "department",
    "manager",
    "functional_head",
    "location",
    "sub_location",
    "country",
    "date_of_resignation",
    "last_working_day",
    "date_of_intimation_of_attrition",
    "reason",
    "voluntary_involuntary",
    "nascom_attrition_analysis",
    "new_country",
    "active_count",
    "new_hire",
    "opening_hc",
    "overall_inactive_count",
    "inactive_count",
    "age_group",
    "tenure_bucket",
];

const CREATE_HR_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS hr_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    month TEXT,
    date TEXT,
    month_year TEXT,
    year INTEGER,
    count INTEGER,
    emp_id TEXT,
    employee_name TEXT,
    date_of_birth TEXT,
    age INTEGER,
    gender TEXT,
    date_of_joining TEXT,
    band TEXT,
    designation TEXT,
    process TEXT,
    voice_non_voice TEXT,
    account_name TEXT,
    domain TEXT,
    department TEXT,
    manager TEXT,
    functional_head TEXT,
    location TEXT,
    sub_location TEXT,
    country TEXT,
    date_of_resignation TEXT,
    last_working_day TEXT,
    date_of_intimation_of_attrition TEXT,
    reason TEXT,
    voluntary_involuntary TEXT,
    nascom_attrition_analysis TEXT,
    new_country TEXT,
    active_count INTEGER,
    new_hire INTEGER,
    opening_hc INTEGER,
    overall_inactive_count INTEGER,
    inactive_count INTEGER,
    age_group TEXT,
    tenure_bucket TEXT,
    CHECK (overall_inactive_count IN (0, 1)),
    CHECK (overall_inactive_count = 0 OR date_of_resignation IS NOT NULL)
);
"#;

const CREATE_INDEX_STATEMENTS: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_month ON hr_data (month);",
    "CREATE INDEX IF NOT EXISTS idx_year ON hr_data (year);",
    "CREATE INDEX IF NOT EXISTS idx_department ON hr_data (department);",
    "CREATE INDEX IF NOT EXISTS idx_location ON hr_data (location);",
    "CREATE INDEX IF NOT EXISTS idx_band ON hr_data (band);",
    "CREATE INDEX IF NOT EXISTS idx_process ON hr_data (process);",
    "CREATE INDEX IF NOT EXISTS idx_gender ON hr_data (gender);",
];

/// One employee observed in one month.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HrRecord {
    pub month: String,
    pub date: String,
    pub month_year: String,
    pub year: i64,
    pub count: i64,
    pub emp_id: String,
    pub employee_name: String,
    pub date_of_birth: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub date_of_joining: Option<String>,
    pub band: Option<String>,
    pub designation: Option<String>,
    pub process: Option<String>,
    pub voice_non_voice: Option<String>,
    pub account_name: Option<String>,
    pub domain: Option<String>,
    pub department: Option<String>,
    pub manager: Option<String>,
    pub functional_head: Option<String>,
    pub location: Option<String>,
    pub sub_location: Option<String>,
    pub country: Option<String>,
    pub date_of_resignation: Option<String>,
    pub last_working_day: Option<String>,
    pub date_of_intimation_of_attrition: Option<String>,
    pub reason: Option<String>,
    pub voluntary_involuntary: Option<String>,
    pub nascom_attrition_analysis: Option<String>,
    pub new_country: Option<String>,
    pub active_count: i64,
    pub new_hire: i64,
    pub opening_hc: i64,
    pub overall_inactive_count: i64,
    pub inactive_count: i64,
    pub age_group: Option<String>,
    pub tenure_bucket: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HrWriteStats {
    pub input_records: usize,
    pub records_written: usize,
    pub batches_committed: usize,
}

#[must_use]
pub fn create_schema_sql() -> String {
    std::iter::once(CREATE_HR_TABLE_SQL)
        .chain(CREATE_INDEX_STATEMENTS.iter().copied())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Opens (creating if needed) a writable connection for administration commands.
pub fn open_writable_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!(
                "failed to create sqlite parent directory: {}",
                parent.display()
            )
        })?;
    }

    Connection::open(path)
        .with_context(|| format!("failed to open sqlite database: {}", path.display()))
}

pub fn ensure_hr_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(&create_schema_sql())
        .context("failed to create hr_data schema")
}

pub fn count_records(connection: &Connection) -> Result<i64> {
    connection
        .query_row(&format!("SELECT COUNT(*) FROM {HR_TABLE}"), [], |row| {
            row.get::<usize, i64>(0)
        })
        .context("failed to count hr_data rows")
}

pub fn clear_records(connection: &Connection) -> Result<usize> {
    connection
        .execute(&format!("DELETE FROM {HR_TABLE}"), [])
        .context("failed to clear hr_data rows")
}

pub fn insert_records(
    connection: &mut Connection,
    records: &[HrRecord],
    batch_size: usize,
) -> Result<HrWriteStats> {
    let batch_size = batch_size.max(1);
    let insert_sql = build_insert_sql();
    let mut records_written = 0usize;
    let mut batches_committed = 0usize;

    for batch in records.chunks(batch_size) {
        let tx = connection
            .transaction()
            .context("failed to open sqlite transaction")?;
        {
            let mut statement = tx
                .prepare_cached(&insert_sql)
                .context("failed to prepare hr_data insert statement")?;

            for record in batch {
                statement
                    .execute(params_from_iter(record_insert_values(record)))
                    .with_context(|| {
                        format!(
                            "failed to insert emp_id={} month_year={}",
                            record.emp_id, record.month_year
                        )
                    })?;
                records_written += 1;
            }
        }
        tx.commit()
            .context("failed to commit sqlite batch transaction")?;
        batches_committed += 1;
    }

    Ok(HrWriteStats {
        input_records: records.len(),
        records_written,
        batches_committed,
    })
}

fn build_insert_sql() -> String {
    let placeholders = (1..=HR_INSERT_COLUMNS.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {HR_TABLE} ({}) VALUES ({placeholders})",
        HR_INSERT_COLUMNS.join(", ")
    )
}

fn record_insert_values(record: &HrRecord) -> Vec<SqlValue> {
    vec![
        text_value(&record.month),
        text_value(&record.date),
        text_value(&record.month_year),
        SqlValue::Integer(record.year),
        SqlValue::Integer(record.count),
        text_value(&record.emp_id),
        text_value(&record.employee_name),
        opt_text_value(record.date_of_birth.as_deref()),
        opt_int_value(record.age),
        opt_text_value(record.gender.as_deref()),
        opt_text_value(record.date_of_joining.as_deref()),
        opt_text_value(record.band.as_deref()),
        opt_text_value(record.designation.as_deref()),
        opt_text_value(record.process.as_deref()),
        opt_text_value(record.voice_non_voice.as_deref()),
        opt_text_value(record.account_name.as_deref()),
        opt_text_value(record.domain.as_deref()),
        opt_text_value(record.department.as_deref()),
        opt_text_value(record.manager.as_deref()),
        opt_text_value(record.functional_head.as_deref()),
        opt_text_value(record.location.as_deref()),
        opt_text_value(record.sub_location.as_deref()),
        opt_text_value(record.country.as_deref()),
        opt_text_value(record.date_of_resignation.as_deref()),
        opt_text_value(record.last_working_day.as_deref()),
        opt_text_value(record.date_of_intimation_of_attrition.as_deref()),
        opt_text_value(record.reason.as_deref()),
        opt_text_value(record.voluntary_involuntary.as_deref()),
        opt_text_value(record.nascom_attrition_analysis.as_deref()),
        opt_text_value(record.new_country.as_deref()),
        SqlValue::Integer(record.active_count),
        SqlValue::Integer(record.new_hire),
        SqlValue::Integer(record.opening_hc),
        SqlValue::Integer(record.overall_inactive_count),
        SqlValue::Integer(record.inactive_count),
        opt_text_value(record.age_group.as_deref()),
        opt_text_value(record.tenure_bucket.as_deref()),
    ]
}

fn text_value(value: &str) -> SqlValue {
    SqlValue::Text(value.to_string())
}

fn opt_text_value(value: Option<&str>) -> SqlValue {
    value.map_or(SqlValue::Null, text_value)
}

fn opt_int_value(value: Option<i64>) -> SqlValue {
    value.map_or(SqlValue::Null, SqlValue::Integer)
}

#[cfg(test)]
mod tests {
    use super::{
        HR_INSERT_COLUMNS, HR_TABLE, HrRecord, count_records, ensure_hr_schema, insert_records,
        record_insert_values,
    };
    use rusqlite::Connection;

    fn active_record(emp_id: &str) -> HrRecord {
        HrRecord {
            month: "January".to_string(),
            date: "2024-01-01".to_string(),
            month_year: "January 2024".to_string(),
            year: 2024,
            count: 1,
            emp_id: emp_id.to_string(),
            employee_name: "Mary Smith".to_string(),
            department: Some("IT".to_string()),
            active_count: 1,
            opening_hc: 1,
            ..HrRecord::default()
        }
    }

    #[test]
    fn ensure_schema_is_idempotent() {
        let connection = Connection::open_in_memory().expect("in-memory sqlite should open");
        ensure_hr_schema(&connection).expect("first schema ensure should succeed");
        ensure_hr_schema(&connection).expect("second schema ensure should succeed");

        let exists = connection
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1",
                [HR_TABLE],
                |_| Ok(()),
            )
            .is_ok();
        assert!(exists);
    }

    #[test]
    fn insert_values_cover_every_column() {
        assert_eq!(
            record_insert_values(&active_record("EMP0001")).len(),
            HR_INSERT_COLUMNS.len()
        );
    }

    #[test]
    fn inserts_in_batches() {
        let mut connection = Connection::open_in_memory().expect("in-memory sqlite should open");
        ensure_hr_schema(&connection).expect("schema should be created");

        let records = (1..=5)
            .map(|index| active_record(&format!("EMP{index:04}")))
            .collect::<Vec<_>>();
        let stats = insert_records(&mut connection, &records, 2).expect("insert should succeed");

        assert_eq!(stats.records_written, 5);
        assert_eq!(stats.batches_committed, 3);
        assert_eq!(count_records(&connection).expect("count should succeed"), 5);
    }

    #[test]
    fn inactive_rows_require_resignation_date() {
        let mut connection = Connection::open_in_memory().expect("in-memory sqlite should open");
        ensure_hr_schema(&connection).expect("schema should be created");

        let invalid = HrRecord {
            active_count: 0,
            overall_inactive_count: 1,
            ..active_record("EMP0009")
        };
        let error = insert_records(&mut connection, &[invalid], 10)
            .expect_err("inactive row without resignation date must be rejected");
        assert!(format!("{error:#}").contains("EMP0009"));
    }
}
