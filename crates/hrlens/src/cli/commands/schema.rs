use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::{envelope_failure, print_envelope};
use crate::config::RuntimeSettings;
use crate::models::{EnvelopeIssue, QueryEnvelope};
use crate::store::{SqliteGateway, TabularGateway};

#[derive(Debug, Clone, Args)]
pub struct SchemaArgs {}

pub fn run(_args: &SchemaArgs, settings: &RuntimeSettings) -> Result<()> {
    let database_path = settings.database_path.display().to_string();
    let gateway = SqliteGateway::new(settings.database_path.clone());
    let description = gateway.describe_schema().map_err(|error| {
        envelope_failure(
            QueryEnvelope::failure(
                "schema",
                EnvelopeIssue::new("store_unavailable", error.to_string()),
            )
            .with_meta("database_path", json!(database_path)),
        )
    })?;

    print_envelope(
        &QueryEnvelope::ok(
            "schema",
            json!({
                "dialect": gateway.dialect(),
                "description": description,
            }),
        )
        .with_meta("database_path", json!(database_path)),
    )
}
