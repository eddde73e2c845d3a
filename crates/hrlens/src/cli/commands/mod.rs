pub mod ask;
pub mod chat;
pub mod contract;
pub mod init;
pub mod schema;
pub mod seed;

use std::sync::Arc;

use anyhow::{Error, Result};
use serde_json::json;

use crate::config::RuntimeSettings;
use crate::engine::{AnalyticsEngine, EngineMode};
use crate::llm::{AzureChatClient, TextCompletion};
use crate::models::{EnvelopeFailure, EnvelopeIssue, QueryEnvelope};
use crate::store::SqliteGateway;

/// Builds the engine once per process from resolved settings.
#[must_use]
pub fn build_engine(settings: &RuntimeSettings) -> AnalyticsEngine {
    let gateway = Arc::new(SqliteGateway::new(settings.database_path.clone()));
    let mode = EngineMode::select(settings.generative.as_ref(), |generative| {
        AzureChatClient::from_settings(generative)
            .map(|client| Arc::new(client) as Arc<dyn TextCompletion>)
    });

    AnalyticsEngine::new(gateway, mode).with_reporting_year(settings.reporting_year)
}

pub(crate) fn print_envelope(envelope: &QueryEnvelope) -> Result<()> {
    let encoded = serde_json::to_string(envelope).map_err(|error| {
        let issue =
            EnvelopeIssue::new("response_encode_failed", "failed to encode command response")
                .with_details(json!({ "cause": format!("{error:#}") }));
        envelope_failure(QueryEnvelope::failure(envelope.command.clone(), issue))
    })?;
    println!("{encoded}");
    Ok(())
}

pub(crate) fn envelope_failure(envelope: QueryEnvelope) -> Error {
    Error::new(EnvelopeFailure(envelope))
}
