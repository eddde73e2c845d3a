use std::io::Cursor;
use std::sync::{Arc, Mutex};

use hrlens::cli::commands::chat::run_chat_loop;
use hrlens::engine::{AnalyticsEngine, EngineMode};
use hrlens::llm::{GenerationFailure, TextCompletion};
use hrlens::store::{GatewayError, Record, Scalar, TabularGateway};

struct CountGateway;

impl TabularGateway for CountGateway {
    fn describe_schema(&self) -> Result<String, GatewayError> {
        Ok("Table: hr_data\nColumns: emp_id (TEXT)\n".to_string())
    }

    fn execute(&self, _query: &str) -> Result<Vec<Record>, GatewayError> {
        Ok(vec![Record::new().with("total_headcount", Scalar::Integer(812))])
    }
}

/// Records every prompt it sees and answers with a fixed query.
#[derive(Default)]
struct RecordingBackend {
    prompts: Mutex<Vec<String>>,
}

impl TextCompletion for RecordingBackend {
    fn complete(&self, prompt: &str) -> Result<String, GenerationFailure> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        Ok("```sql\nSELECT COUNT(DISTINCT emp_id) AS total_headcount FROM hr_data\n```".to_string())
    }
}

#[test]
fn answers_until_exit_and_prints_analysis() {
    let engine = AnalyticsEngine::new(Arc::new(CountGateway), EngineMode::Deterministic);
    let input = Cursor::new("headcount\n\nexit\nheadcount\n");
    let mut output = Vec::new();

    let answered = run_chat_loop(&engine, input, &mut output).expect("chat loop should finish");

    let transcript = String::from_utf8(output).expect("output should be utf-8");
    assert_eq!(answered, 1);
    assert_eq!(transcript.matches("### Total Headcount").count(), 1);
    assert!(transcript.contains("## Analysis"));
    assert!(transcript.starts_with("hrlens> "));
}

#[test]
fn end_of_input_stops_the_loop() {
    let engine = AnalyticsEngine::new(Arc::new(CountGateway), EngineMode::Deterministic);
    let mut output = Vec::new();

    let answered = run_chat_loop(&engine, Cursor::new("headcount\nQUIT"), &mut output)
        .expect("chat loop should finish");

    assert_eq!(answered, 1);
}

#[test]
fn history_is_capped_to_recent_turns() {
    let backend = Arc::new(RecordingBackend::default());
    let engine = AnalyticsEngine::new(
        Arc::new(CountGateway),
        EngineMode::Generative(backend.clone()),
    );
    let questions = (1..=7)
        .map(|index| format!("headcount question {index}\n"))
        .collect::<String>();
    let mut output = Vec::new();

    let answered = run_chat_loop(&engine, Cursor::new(questions), &mut output)
        .expect("chat loop should finish");
    assert_eq!(answered, 7);

    let prompts = backend.prompts.lock().expect("prompt log should lock");
    let last_query_prompt = prompts
        .iter()
        .rev()
        .find(|prompt| prompt.starts_with("You are a SQL expert"))
        .expect("query prompt should be recorded");
    assert!(last_query_prompt.contains("QUESTION: headcount question 7"));
    assert!(!last_query_prompt.contains("USER: headcount question 1\n"));
    assert!(last_query_prompt.contains("USER: headcount question 2\n"));
    assert!(last_query_prompt.contains("USER: headcount question 6\n"));
}
