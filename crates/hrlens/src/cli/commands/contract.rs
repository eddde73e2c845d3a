use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::print_envelope;
use crate::models::{QueryEnvelope, request_json_schema, response_json_schema};

#[derive(Debug, Clone, Args)]
pub struct ContractArgs {}

pub fn run(_args: &ContractArgs) -> Result<()> {
    print_envelope(&QueryEnvelope::ok(
        "contract",
        json!({
            "request": request_json_schema(),
            "response": response_json_schema(),
        }),
    ))
}
