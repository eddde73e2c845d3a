use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use super::{build_engine, envelope_failure, print_envelope};
use crate::config::RuntimeSettings;
use crate::engine::CATEGORY_TABLE_VERSION;
use crate::models::{
    ConversationTurn, EnvelopeIssue, MAX_HISTORY_TURNS, QueryEnvelope, recent_turns,
};

#[derive(Debug, Clone, Args)]
pub struct AskArgs {
    #[arg(value_name = "QUESTION")]
    pub question: String,

    /// JSON array of `{role, content}` turns, oldest first.
    #[arg(long, value_name = "FILE")]
    pub history: Option<PathBuf>,
}

/// Turns read from a history file after capping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedHistory {
    pub turns: Vec<ConversationTurn>,
    pub dropped: usize,
}

pub fn run(args: &AskArgs, settings: &RuntimeSettings) -> Result<()> {
    let history = match &args.history {
        Some(path) => load_history(path).map_err(|error| {
            envelope_failure(
                QueryEnvelope::from_error(
                    "ask",
                    "history_invalid",
                    "failed to load history",
                    &error,
                )
                .with_meta("history_path", json!(path.display().to_string())),
            )
        })?,
        None => LoadedHistory::default(),
    };

    let engine = build_engine(settings);
    let run = engine.run(&args.question, &history.turns);

    let mut envelope = QueryEnvelope::ok("ask", json!(run.response))
        .with_meta("mode", json!(engine.mode()))
        .with_meta("strategies", json!(engine.strategies()))
        .with_meta("trace", json!(run.trace))
        .with_meta("category_table_version", json!(CATEGORY_TABLE_VERSION))
        .with_meta("history_turns", json!(history.turns.len()));
    if history.dropped > 0 {
        envelope = envelope.with_warning(
            EnvelopeIssue::new(
                "history_truncated",
                format!("kept the {MAX_HISTORY_TURNS} most recent turns"),
            )
            .with_details(json!({ "dropped": history.dropped })),
        );
    }

    print_envelope(&envelope)
}

/// Reads a history file and keeps the most recent turns.
pub fn load_history(path: &Path) -> Result<LoadedHistory> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read history file: {}", path.display()))?;
    let turns: Vec<ConversationTurn> = serde_json::from_str(&raw).with_context(|| {
        format!("history file is not a JSON array of turns: {}", path.display())
    })?;

    let kept = recent_turns(&turns, MAX_HISTORY_TURNS);
    Ok(LoadedHistory {
        dropped: turns.len() - kept.len(),
        turns: kept,
    })
}
