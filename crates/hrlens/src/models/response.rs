use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::conversation::AnalyticsRequest;

pub const STORE_UNAVAILABLE_ANSWER: &str =
    "Error: HR Analytics database is not properly initialized. Please check the configuration.";
pub const EXECUTION_APOLOGY: &str = "Could not execute query. Please try a simpler question.";

/// Always returned whole; failures show up as text inside the fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EngineResponse {
    pub answer: String,
    pub query: String,
    pub result: String,
    pub analysis: String,
}

impl EngineResponse {
    #[must_use]
    pub fn store_unavailable() -> Self {
        Self {
            answer: STORE_UNAVAILABLE_ANSWER.to_string(),
            ..Self::default()
        }
    }
}

#[must_use]
pub fn request_json_schema() -> Value {
    schema_value(schemars::schema_for!(AnalyticsRequest))
}

#[must_use]
pub fn response_json_schema() -> Value {
    schema_value(schemars::schema_for!(EngineResponse))
}

fn schema_value(schema: schemars::Schema) -> Value {
    match serde_json::to_value(schema) {
        Ok(value) => value,
        Err(error) => {
            panic!("failed to serialize generated contract schema: {error}");
        }
    }
}
