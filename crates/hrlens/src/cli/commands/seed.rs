use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use super::{envelope_failure, print_envelope};
use crate::config::RuntimeSettings;
use crate::models::{EnvelopeIssue, QueryEnvelope};
use crate::store::demo::{DemoConfig, generate_demo_records};
use crate::store::schema::{
    DEFAULT_INSERT_BATCH_SIZE, clear_records, count_records, ensure_hr_schema, insert_records,
    open_writable_connection,
};

#[derive(Debug, Clone, Args)]
pub struct SeedArgs {
    #[arg(long, default_value_t = 1000)]
    pub employees: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Last day covered by the generated data; defaults to today (UTC).
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_as_of)]
    pub as_of: Option<Date>,

    /// Delete existing rows before inserting.
    #[arg(long, default_value_t = false)]
    pub replace: bool,
}

pub fn parse_as_of(raw: &str) -> Result<Date, String> {
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map_err(|error| format!("expected YYYY-MM-DD: {error}"))
}

pub fn run(args: &SeedArgs, settings: &RuntimeSettings) -> Result<()> {
    let database_path = settings.database_path.display().to_string();
    let config = DemoConfig {
        employees: args.employees,
        seed: args.seed,
        as_of: args
            .as_of
            .unwrap_or_else(|| OffsetDateTime::now_utc().date()),
    };

    let mut connection = open_writable_connection(&settings.database_path)
        .and_then(|connection| {
            ensure_hr_schema(&connection)?;
            Ok(connection)
        })
        .map_err(|error| {
            envelope_failure(
                QueryEnvelope::from_error(
                    "seed",
                    "seed_store_unavailable",
                    "failed to open HR store",
                    &error,
                )
                .with_meta("database_path", json!(database_path)),
            )
        })?;

    let existing = count_records(&connection)?;
    let cleared = if existing > 0 {
        if !args.replace {
            return Err(envelope_failure(
                QueryEnvelope::failure(
                    "seed",
                    EnvelopeIssue::new(
                        "seed_table_not_empty",
                        "hr_data already has rows; pass --replace to regenerate",
                    )
                    .with_details(json!({ "existing_rows": existing })),
                )
                .with_meta("database_path", json!(database_path)),
            ));
        }
        clear_records(&connection)?
    } else {
        0
    };

    let records = generate_demo_records(config).context("failed to generate demo records")?;
    let stats = insert_records(&mut connection, &records, DEFAULT_INSERT_BATCH_SIZE)?;
    tracing::info!(
        employees = config.employees,
        rows = stats.records_written,
        batches = stats.batches_committed,
        "demo data inserted"
    );

    print_envelope(
        &QueryEnvelope::ok(
            "seed",
            json!({
                "database_path": database_path,
                "employees": config.employees,
                "seed": config.seed,
                "as_of": config.as_of.to_string(),
                "rows_cleared": cleared,
                "rows_written": stats.records_written,
                "batches_committed": stats.batches_committed,
            }),
        )
        .with_meta("batch_size", json!(DEFAULT_INSERT_BATCH_SIZE)),
    )
}
