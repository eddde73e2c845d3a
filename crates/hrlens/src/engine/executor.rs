use serde::Serialize;

use super::synthesizer::Synthesis;
use crate::models::EXECUTION_APOLOGY;
use crate::store::{GatewayError, TabularGateway};

/// Hard ceiling on gateway executions per call: the primary query plus one fallback.
pub const MAX_EXECUTION_ATTEMPTS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub state: ExecutionState,
    pub query: String,
    pub result: String,
    pub attempts: u8,
    pub used_fallback: bool,
}

pub struct ExecutionController<'a> {
    gateway: &'a dyn TabularGateway,
    fallback_query: &'a str,
}

impl<'a> ExecutionController<'a> {
    #[must_use]
    pub fn new(gateway: &'a dyn TabularGateway, fallback_query: &'a str) -> Self {
        Self {
            gateway,
            fallback_query,
        }
    }

    /// Runs the synthesized query, retrying once with the fallback query on execution failure.
    /// Only `StoreUnavailable` escapes; every other outcome is folded into the returned state.
    pub fn run(&self, synthesis: Synthesis) -> Result<ExecutionOutcome, GatewayError> {
        let query = match synthesis {
            Synthesis::Query { text, .. } => text,
            Synthesis::Unavailable { message } => {
                tracing::warn!(stage = "synthesize", %message, "no query to execute");
                return Ok(ExecutionOutcome {
                    state: ExecutionState::Failed,
                    query: message.clone(),
                    result: message,
                    attempts: 0,
                    used_fallback: false,
                });
            }
        };

        let primary_error = match self.gateway.execute(&query) {
            Ok(rows) => {
                return Ok(ExecutionOutcome {
                    state: ExecutionState::Succeeded,
                    query,
                    result: self.gateway.render(&rows),
                    attempts: 1,
                    used_fallback: false,
                });
            }
            Err(error @ GatewayError::StoreUnavailable(_)) => return Err(error),
            Err(GatewayError::QueryExecution(message)) => message,
        };

        tracing::warn!(
            stage = "execute",
            error = %primary_error,
            "primary query failed; running fallback query"
        );

        match self.gateway.execute(self.fallback_query) {
            Ok(rows) => Ok(ExecutionOutcome {
                state: ExecutionState::Succeeded,
                query: self.fallback_query.to_string(),
                result: self.gateway.render(&rows),
                attempts: MAX_EXECUTION_ATTEMPTS,
                used_fallback: true,
            }),
            Err(error @ GatewayError::StoreUnavailable(_)) => Err(error),
            Err(GatewayError::QueryExecution(message)) => {
                tracing::warn!(stage = "fallback", error = %message, "fallback query failed");
                Ok(ExecutionOutcome {
                    state: ExecutionState::Failed,
                    query: self.fallback_query.to_string(),
                    result: EXECUTION_APOLOGY.to_string(),
                    attempts: MAX_EXECUTION_ATTEMPTS,
                    used_fallback: true,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ExecutionController, ExecutionState};
    use crate::engine::mode::StrategyKind;
    use crate::engine::synthesizer::{FALLBACK_QUERY, Synthesis};
    use crate::models::EXECUTION_APOLOGY;
    use crate::store::{GatewayError, Record, Scalar, TabularGateway};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedGateway {
        fallback_ok: bool,
        primary_ok: bool,
        calls: AtomicUsize,
    }

    impl ScriptedGateway {
        fn new(primary_ok: bool, fallback_ok: bool) -> Self {
            Self {
                fallback_ok,
                primary_ok,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl TabularGateway for ScriptedGateway {
        fn describe_schema(&self) -> Result<String, GatewayError> {
            Ok("Table: hr_data\nColumns: emp_id (TEXT)\n".to_string())
        }

        fn execute(&self, query: &str) -> Result<Vec<Record>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let ok = if query == FALLBACK_QUERY {
                self.fallback_ok
            } else {
                self.primary_ok
            };
            if ok {
                Ok(vec![
                    Record::new().with("total_records", Scalar::Integer(42)),
                ])
            } else {
                Err(GatewayError::QueryExecution("no such column: salary".to_string()))
            }
        }
    }

    fn query(text: &str) -> Synthesis {
        Synthesis::Query {
            text: text.to_string(),
            strategy: StrategyKind::Deterministic,
        }
    }

    #[test]
    fn primary_success_takes_one_attempt() {
        let gateway = ScriptedGateway::new(true, true);
        let outcome = ExecutionController::new(&gateway, FALLBACK_QUERY)
            .run(query("SELECT 1"))
            .expect("store is available");
        assert_eq!(outcome.state, ExecutionState::Succeeded);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.query, "SELECT 1");
    }

    #[test]
    fn primary_failure_recovers_with_fallback() {
        let gateway = ScriptedGateway::new(false, true);
        let outcome = ExecutionController::new(&gateway, FALLBACK_QUERY)
            .run(query("SELECT salary FROM hr_data"))
            .expect("store is available");
        assert_eq!(outcome.state, ExecutionState::Succeeded);
        assert!(outcome.used_fallback);
        assert_eq!(outcome.query, FALLBACK_QUERY);
        assert!(outcome.result.contains("42"));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn double_failure_ends_in_apology() {
        let gateway = ScriptedGateway::new(false, false);
        let outcome = ExecutionController::new(&gateway, FALLBACK_QUERY)
            .run(query("SELECT salary FROM hr_data"))
            .expect("store is available");
        assert_eq!(outcome.state, ExecutionState::Failed);
        assert_eq!(outcome.result, EXECUTION_APOLOGY);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unavailable_synthesis_skips_execution() {
        let gateway = ScriptedGateway::new(true, true);
        let outcome = ExecutionController::new(&gateway, FALLBACK_QUERY)
            .run(Synthesis::Unavailable {
                message: "Error: backend refused".to_string(),
            })
            .expect("store is available");
        assert_eq!(outcome.state, ExecutionState::Failed);
        assert_eq!(outcome.result, "Error: backend refused");
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }
}
