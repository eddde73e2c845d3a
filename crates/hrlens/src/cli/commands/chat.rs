use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use clap::Args;

use super::build_engine;
use crate::config::RuntimeSettings;
use crate::engine::AnalyticsEngine;
use crate::models::{ConversationTurn, MAX_HISTORY_TURNS, recent_turns};

const PROMPT: &str = "hrlens> ";

#[derive(Debug, Clone, Args)]
pub struct ChatArgs {}

pub fn run(_args: &ChatArgs, settings: &RuntimeSettings) -> Result<()> {
    let engine = build_engine(settings);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let turns = run_chat_loop(&engine, stdin.lock(), stdout.lock())?;
    tracing::info!(turns, "chat session ended");
    Ok(())
}

/// Reads questions line by line until `exit`, `quit` or EOF. Returns the number answered.
pub fn run_chat_loop<R: BufRead, W: Write>(
    engine: &AnalyticsEngine,
    mut input: R,
    mut output: W,
) -> Result<usize> {
    let mut history: Vec<ConversationTurn> = Vec::new();
    let mut answered = 0usize;
    let mut line = String::new();

    loop {
        write!(output, "{PROMPT}").context("failed to write prompt")?;
        output.flush().context("failed to flush prompt")?;

        line.clear();
        if input.read_line(&mut line).context("failed to read question")? == 0 {
            writeln!(output).context("failed to write output")?;
            break;
        }

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question.to_ascii_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        let response = engine.run_analytics_query(question, &history);
        writeln!(output, "\n{}\n", response.answer).context("failed to write answer")?;
        if !response.analysis.is_empty() {
            writeln!(output, "{}\n", response.analysis).context("failed to write analysis")?;
        }

        history.push(ConversationTurn::user(question));
        history.push(ConversationTurn::assistant(response.answer));
        history = recent_turns(&history, MAX_HISTORY_TURNS);
        answered += 1;
    }

    Ok(answered)
}
