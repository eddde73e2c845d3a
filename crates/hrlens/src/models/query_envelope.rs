//! JSON envelope printed by every CLI command.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const QUERY_ENVELOPE_SCHEMA_VERSION: &str = "hrlens.query-envelope.v1";

pub type QueryEnvelopeMeta = BTreeMap<String, Value>;

/// A coded message: a warning on a successful envelope, or its error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeIssue {
    pub code: String,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl EnvelopeIssue {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEnvelope {
    pub ok: bool,
    pub command: String,
    pub generated_at_utc: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    pub meta: QueryEnvelopeMeta,
    pub warnings: Vec<EnvelopeIssue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EnvelopeIssue>,
}

impl QueryEnvelope {
    #[must_use]
    pub fn ok(command: impl Into<String>, data: Value) -> Self {
        let mut envelope = Self::stamped(command, true);
        envelope.data = Some(data);
        envelope
    }

    #[must_use]
    pub fn failure(command: impl Into<String>, issue: EnvelopeIssue) -> Self {
        let mut envelope = Self::stamped(command, false);
        envelope.error = Some(issue);
        envelope
    }

    /// Failure whose details carry the full `anyhow` cause chain.
    #[must_use]
    pub fn from_error(
        command: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
        error: &anyhow::Error,
    ) -> Self {
        let cause = json!({ "cause": format!("{error:#}") });
        Self::failure(command, EnvelopeIssue::new(code, message).with_details(cause))
    }

    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_warning(mut self, warning: EnvelopeIssue) -> Self {
        self.warnings.push(warning);
        self
    }

    fn stamped(command: impl Into<String>, ok: bool) -> Self {
        let meta = QueryEnvelopeMeta::from([(
            "schema_version".to_string(),
            json!(QUERY_ENVELOPE_SCHEMA_VERSION),
        )]);
        Self {
            ok,
            command: command.into(),
            generated_at_utc: generated_at_utc_now(),
            data: None,
            meta,
            warnings: Vec::new(),
            error: None,
        }
    }
}

/// Command error that already knows the envelope to print.
#[derive(Debug, Clone)]
pub struct EnvelopeFailure(pub QueryEnvelope);

impl EnvelopeFailure {
    #[must_use]
    pub fn envelope(&self) -> &QueryEnvelope {
        &self.0
    }
}

impl Display for EnvelopeFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(encoded) => f.write_str(&encoded),
            Err(_) => f.write_str("query envelope serialization failure"),
        }
    }
}

impl std::error::Error for EnvelopeFailure {}

fn generated_at_utc_now() -> String {
    OffsetDateTime::now_utc()
        .replace_nanosecond(0)
        .ok()
        .and_then(|now| now.format(&Rfc3339).ok())
        .unwrap_or_else(|| "1970-01-01T00:00:00Z".to_string())
}
