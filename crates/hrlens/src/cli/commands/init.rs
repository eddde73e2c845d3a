use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::{envelope_failure, print_envelope};
use crate::config::RuntimeSettings;
use crate::models::QueryEnvelope;
use crate::store::schema::{HR_TABLE, count_records, ensure_hr_schema, open_writable_connection};

#[derive(Debug, Clone, Args)]
pub struct InitArgs {}

pub fn run(_args: &InitArgs, settings: &RuntimeSettings) -> Result<()> {
    let database_path = settings.database_path.display().to_string();
    let rows = open_writable_connection(&settings.database_path)
        .and_then(|connection| {
            ensure_hr_schema(&connection)?;
            count_records(&connection)
        })
        .map_err(|error| {
            envelope_failure(
                QueryEnvelope::from_error(
                    "init",
                    "init_failed",
                    "failed to initialize HR store",
                    &error,
                )
                .with_meta("database_path", json!(database_path)),
            )
        })?;

    tracing::info!(database = %database_path, rows, "hr_data schema ready");
    print_envelope(&QueryEnvelope::ok(
        "init",
        json!({
            "database_path": database_path,
            "table": HR_TABLE,
            "rows": rows,
        }),
    ))
}
