use super::category::Category;
use super::mode::{Strategy, StrategyKind};
use crate::store::NO_RESULTS_TEXT;

pub const NO_DATA_ANSWER: &str =
    "I couldn't find any data matching your query. Please try a different question.";

/// Markdown header and table columns a matched category prepends to its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerLayout {
    pub header: &'static str,
    pub columns: &'static [&'static str],
}

#[must_use]
pub const fn answer_layout(category: Category) -> Option<AnswerLayout> {
    let (header, columns): (&str, &[&str]) = match category {
        Category::AttritionRate => (
            "### Attrition Rate Analysis",
            &["Department", "Attrited", "Total", "Attrition Rate (%)"],
        ),
        Category::HeadcountByDepartment => {
            ("### Headcount by Department", &["Department", "Headcount"])
        }
        Category::TotalHeadcount => ("### Total Headcount", &["Metric", "Value"]),
        Category::GenderDistribution => (
            "### Gender Distribution",
            &["Gender", "Count", "Percentage (%)"],
        ),
        Category::AgeGroupDistribution => (
            "### Age Group Distribution",
            &["Age Group", "Count", "Percentage (%)"],
        ),
        Category::TenureDistribution => (
            "### Tenure Distribution",
            &["Tenure", "Count", "Percentage (%)"],
        ),
        Category::LocationBreakdown => (
            "### Location Analysis",
            &["Location", "Headcount", "Attrited", "Attrition Rate (%)"],
        ),
        Category::ResignationReasons => (
            "### Reasons for Leaving",
            &["Reason", "Count", "Percentage (%)"],
        ),
        Category::Unmatched => return None,
    };
    Some(AnswerLayout { header, columns })
}

#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub question: &'a str,
    pub history: &'a str,
    pub query: &'a str,
    pub result: &'a str,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub strategy: StrategyKind,
}

#[derive(Debug, Clone)]
pub struct ResponseRenderer {
    strategy: Strategy,
}

impl ResponseRenderer {
    #[must_use]
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    #[must_use]
    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub fn render(&self, request: &RenderRequest<'_>) -> Rendered {
        if let Some(client) = self.strategy.client() {
            match client.complete(&build_answer_prompt(request)) {
                Ok(text) => {
                    return Rendered {
                        text,
                        strategy: StrategyKind::Generative,
                    };
                }
                Err(failure) => tracing::warn!(
                    stage = "render",
                    error = %failure,
                    "generative answer failed; using category template"
                ),
            }
        }

        Rendered {
            text: render_deterministic(request.category, request.result),
            strategy: StrategyKind::Deterministic,
        }
    }
}

/// Header plus empty table skeleton above the raw result for matched categories.
/// Anything that is not a rendered table comes back as-is.
#[must_use]
pub fn render_deterministic(category: Category, result: &str) -> String {
    let Some(layout) = answer_layout(category) else {
        return result.to_string();
    };

    let trimmed = result.trim();
    if trimmed.is_empty() || trimmed == NO_RESULTS_TEXT {
        return NO_DATA_ANSWER.to_string();
    }
    if !is_rendered_table(trimmed) {
        return result.to_string();
    }

    format!(
        "{}\n\n{}\n\n{result}",
        layout.header,
        table_skeleton(layout.columns)
    )
}

fn table_skeleton(columns: &[&str]) -> String {
    let header = columns.join(" | ");
    let divider = columns
        .iter()
        .map(|column| "-".repeat(column.chars().count() + 2))
        .collect::<Vec<_>>()
        .join("|");
    format!("| {header} |\n|{divider}|")
}

fn is_rendered_table(text: &str) -> bool {
    let mut lines = text.lines();
    let has_header = lines.next().is_some_and(|line| !line.trim().is_empty());
    let separator_ok = lines.next().is_some_and(|line| {
        line.contains('-') && line.chars().all(|ch| ch == '-' || ch == '+')
    });
    has_header && separator_ok
}

#[must_use]
pub fn build_answer_prompt(request: &RenderRequest<'_>) -> String {
    format!(
        "CONVERSATION HISTORY:
{history}
QUESTION: {question}
SQL QUERY: {query}
SQL RESULT: {result}

Write the answer for an HR analyst:
1. Open with a direct answer to the question.
2. Present the main findings first and keep explanations short.
3. Show every value in the result; do not drop rows.
4. Use markdown tables only for numeric results (counts, percentages, rates), for example:
   | Metric | Value |
   |--------|-------|
5. Multi-row numeric results get one table row per result row.
6. Skip tables unless the question is about an attrition rate or a count.
7. Put key numbers in **bold** and state their units (%, employees).
8. Keep a professional tone.",
        history = request.history,
        question = request.question,
        query = request.query,
        result = request.result,
    )
}
