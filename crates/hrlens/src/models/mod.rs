pub mod conversation;
pub mod query_envelope;
pub mod response;

pub use conversation::{
    AnalyticsRequest, ConversationTurn, MAX_HISTORY_TURNS, TurnRole, format_history, recent_turns,
};
pub use query_envelope::{
    EnvelopeFailure, EnvelopeIssue, QUERY_ENVELOPE_SCHEMA_VERSION, QueryEnvelope, QueryEnvelopeMeta,
};
pub use response::{
    EXECUTION_APOLOGY, EngineResponse, STORE_UNAVAILABLE_ANSWER, request_json_schema,
    response_json_schema,
};
