//! Natural-language analytics over the HR dataset.
//!
//! One call runs synthesize, execute, render and analyze in that order. Every stage degrades
//! instead of failing, so [`AnalyticsEngine::run_analytics_query`] always returns a complete
//! [`EngineResponse`].

pub mod category;
pub mod executor;
pub mod insights;
pub mod mode;
pub mod renderer;
pub mod synthesizer;

use std::sync::Arc;

use serde::Serialize;

use crate::config::DEFAULT_REPORTING_YEAR;
use crate::models::{
    ConversationTurn, EngineResponse, MAX_HISTORY_TURNS, format_history, recent_turns,
};
use crate::store::{GatewayError, TabularGateway};

pub use category::{CATEGORY_RULES, CATEGORY_TABLE_VERSION, Category, classify};
pub use executor::{ExecutionController, ExecutionOutcome, ExecutionState};
pub use insights::InsightGenerator;
pub use mode::{EngineMode, Strategy, StrategyKind};
pub use renderer::ResponseRenderer;
pub use synthesizer::{FALLBACK_QUERY, QuerySynthesizer, Synthesis};

use renderer::RenderRequest;
use synthesizer::SynthesisRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComponentStrategies {
    pub synthesizer: StrategyKind,
    pub renderer: StrategyKind,
    pub insights: StrategyKind,
}

/// What actually happened during one call; strategies can differ from the configured mode
/// when a generative step fell back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunTrace {
    pub category: Option<Category>,
    pub synthesis: Option<StrategyKind>,
    pub execution: Option<ExecutionState>,
    pub attempts: u8,
    pub used_fallback: bool,
    pub answer: Option<StrategyKind>,
    pub analysis: Option<StrategyKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRun {
    pub response: EngineResponse,
    pub trace: RunTrace,
}

pub struct AnalyticsEngine {
    gateway: Arc<dyn TabularGateway>,
    mode: StrategyKind,
    synthesizer: QuerySynthesizer,
    renderer: ResponseRenderer,
    insights: InsightGenerator,
}

impl AnalyticsEngine {
    #[must_use]
    pub fn new(gateway: Arc<dyn TabularGateway>, mode: EngineMode) -> Self {
        Self {
            gateway,
            mode: mode.kind(),
            synthesizer: QuerySynthesizer::new(mode.strategy(), DEFAULT_REPORTING_YEAR),
            renderer: ResponseRenderer::new(mode.strategy()),
            insights: InsightGenerator::new(mode.strategy()),
        }
    }

    #[must_use]
    pub fn with_reporting_year(mut self, reporting_year: i32) -> Self {
        self.synthesizer = self.synthesizer.with_reporting_year(reporting_year);
        self
    }

    #[must_use]
    pub fn mode(&self) -> StrategyKind {
        self.mode
    }

    #[must_use]
    pub fn strategies(&self) -> ComponentStrategies {
        ComponentStrategies {
            synthesizer: self.synthesizer.strategy_kind(),
            renderer: self.renderer.strategy_kind(),
            insights: self.insights.strategy_kind(),
        }
    }

    /// The engine's entry point. Never fails; errors are reported inside `answer`.
    pub fn run_analytics_query(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> EngineResponse {
        self.run(question, history).response
    }

    pub fn run(&self, question: &str, history: &[ConversationTurn]) -> EngineRun {
        let mut response = EngineResponse::default();
        let mut trace = RunTrace::default();

        match self.run_stages(question, history, &mut response, &mut trace) {
            Ok(()) => {}
            Err(error @ GatewayError::StoreUnavailable(_)) => {
                tracing::error!(error = %error, "HR store unavailable");
                response = EngineResponse::store_unavailable();
            }
            Err(error) => {
                tracing::error!(error = %error, "analytics call aborted");
                response.answer = format!("Error: {}", error.message());
            }
        }

        EngineRun { response, trace }
    }

    fn run_stages(
        &self,
        question: &str,
        history: &[ConversationTurn],
        response: &mut EngineResponse,
        trace: &mut RunTrace,
    ) -> Result<(), GatewayError> {
        let schema = self.gateway.describe_schema()?;
        let history = format_history(&recent_turns(history, MAX_HISTORY_TURNS));
        let category = classify(question);
        trace.category = Some(category);

        let synthesis = self.synthesizer.synthesize(&SynthesisRequest {
            question,
            history: &history,
            schema: &schema,
            dialect: self.gateway.dialect(),
            category,
        });
        if let Synthesis::Query { text, strategy } = &synthesis {
            trace.synthesis = Some(*strategy);
            response.query.clone_from(text);
        }

        let controller =
            ExecutionController::new(self.gateway.as_ref(), self.synthesizer.fallback_query());
        let outcome = controller.run(synthesis)?;
        tracing::debug!(
            category = category.as_str(),
            state = ?outcome.state,
            attempts = outcome.attempts,
            used_fallback = outcome.used_fallback,
            "query executed"
        );
        trace.execution = Some(outcome.state);
        trace.attempts = outcome.attempts;
        trace.used_fallback = outcome.used_fallback;
        response.query = outcome.query;
        response.result = outcome.result;

        let rendered = self.renderer.render(&RenderRequest {
            question,
            history: &history,
            query: &response.query,
            result: &response.result,
            category,
        });
        trace.answer = Some(rendered.strategy);
        response.answer = rendered.text;

        let analysis = self.insights.analyze(category, &response.result);
        trace.analysis = Some(analysis.strategy);
        response.analysis = analysis.text;

        Ok(())
    }
}
