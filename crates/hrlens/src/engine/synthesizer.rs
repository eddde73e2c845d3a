use super::category::Category;
use super::mode::{Strategy, StrategyKind};
use crate::llm::{GenerationFailureKind, extract_query_text};

/// Row cap the generative prompt asks the model to respect.
pub const RESULT_CAP: usize = 2000;

/// Counts every row. Independent of the question so it cannot fail the way the primary did.
pub const FALLBACK_QUERY: &str = "SELECT COUNT(*) AS total_records FROM hr_data LIMIT 1";

pub const DEFAULT_QUERY: &str = "SELECT * FROM hr_data LIMIT 10";

const ATTRITION_RATE_QUERY: &str = "SELECT
    department,
    COUNT(CASE WHEN overall_inactive_count = 1 THEN 1 END) AS attrited,
    COUNT(*) AS total,
    ROUND(COUNT(CASE WHEN overall_inactive_count = 1 THEN 1 END) * 100.0 / COUNT(*), 2) AS attrition_rate
FROM hr_data
GROUP BY department
ORDER BY attrition_rate DESC
LIMIT 10";

const HEADCOUNT_BY_DEPARTMENT_QUERY: &str = "SELECT
    department,
    COUNT(DISTINCT emp_id) AS headcount
FROM hr_data
WHERE active_count = 1
GROUP BY department
ORDER BY headcount DESC
LIMIT 10";

const TOTAL_HEADCOUNT_QUERY: &str = "SELECT
    COUNT(DISTINCT emp_id) AS total_headcount
FROM hr_data
WHERE active_count = 1";

const GENDER_DISTRIBUTION_QUERY: &str = "SELECT
    gender,
    COUNT(DISTINCT emp_id) AS count,
    ROUND(COUNT(DISTINCT emp_id) * 100.0 / (SELECT COUNT(DISTINCT emp_id) FROM hr_data), 2) AS percentage
FROM hr_data
GROUP BY gender
ORDER BY count DESC";

const AGE_GROUP_DISTRIBUTION_QUERY: &str = "SELECT
    age_group,
    COUNT(DISTINCT emp_id) AS count,
    ROUND(COUNT(DISTINCT emp_id) * 100.0 / (SELECT COUNT(DISTINCT emp_id) FROM hr_data), 2) AS percentage
FROM hr_data
GROUP BY age_group
ORDER BY
    CASE
        WHEN age_group = '20-25' THEN 1
        WHEN age_group = '26-30' THEN 2
        WHEN age_group = '31-35' THEN 3
        WHEN age_group = '36-40' THEN 4
        WHEN age_group = '41-45' THEN 5
        WHEN age_group = '46-50' THEN 6
        WHEN age_group = '51+' THEN 7
    END";

const TENURE_DISTRIBUTION_QUERY: &str = "SELECT
    tenure_bucket,
    COUNT(DISTINCT emp_id) AS count,
    ROUND(COUNT(DISTINCT emp_id) * 100.0 / (SELECT COUNT(DISTINCT emp_id) FROM hr_data), 2) AS percentage
FROM hr_data
GROUP BY tenure_bucket
ORDER BY
    CASE
        WHEN tenure_bucket = '<1 year' THEN 1
        WHEN tenure_bucket = '1-2 years' THEN 2
        WHEN tenure_bucket = '3-5 years' THEN 3
        WHEN tenure_bucket = '6-10 years' THEN 4
        WHEN tenure_bucket = '10+ years' THEN 5
    END";

const LOCATION_BREAKDOWN_QUERY: &str = "SELECT
    location,
    COUNT(DISTINCT emp_id) AS headcount,
    COUNT(CASE WHEN overall_inactive_count = 1 THEN 1 END) AS attrited,
    ROUND(COUNT(CASE WHEN overall_inactive_count = 1 THEN 1 END) * 100.0 / COUNT(*), 2) AS attrition_rate
FROM hr_data
GROUP BY location
ORDER BY headcount DESC
LIMIT 10";

const RESIGNATION_REASONS_QUERY: &str = "SELECT
    reason,
    COUNT(*) AS count,
    ROUND(COUNT(*) * 100.0 / (SELECT COUNT(*) FROM hr_data WHERE reason IS NOT NULL), 2) AS percentage
FROM hr_data
WHERE reason IS NOT NULL
GROUP BY reason
ORDER BY count DESC
LIMIT 10";

#[must_use]
pub const fn template_for(category: Category) -> &'static str {
    match category {
        Category::AttritionRate => ATTRITION_RATE_QUERY,
        Category::HeadcountByDepartment => HEADCOUNT_BY_DEPARTMENT_QUERY,
        Category::TotalHeadcount => TOTAL_HEADCOUNT_QUERY,
        Category::GenderDistribution => GENDER_DISTRIBUTION_QUERY,
        Category::AgeGroupDistribution => AGE_GROUP_DISTRIBUTION_QUERY,
        Category::TenureDistribution => TENURE_DISTRIBUTION_QUERY,
        Category::LocationBreakdown => LOCATION_BREAKDOWN_QUERY,
        Category::ResignationReasons => RESIGNATION_REASONS_QUERY,
        Category::Unmatched => DEFAULT_QUERY,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    pub question: &'a str,
    pub history: &'a str,
    pub schema: &'a str,
    pub dialect: &'a str,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Synthesis {
    Query {
        text: String,
        strategy: StrategyKind,
    },
    /// The backend answered with an error instead of a query.
    Unavailable { message: String },
}

#[derive(Debug, Clone)]
pub struct QuerySynthesizer {
    strategy: Strategy,
    reporting_year: i32,
}

impl QuerySynthesizer {
    #[must_use]
    pub fn new(strategy: Strategy, reporting_year: i32) -> Self {
        Self {
            strategy,
            reporting_year,
        }
    }

    #[must_use]
    pub fn with_reporting_year(mut self, reporting_year: i32) -> Self {
        self.reporting_year = reporting_year;
        self
    }

    #[must_use]
    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    #[must_use]
    pub fn fallback_query(&self) -> &'static str {
        FALLBACK_QUERY
    }

    pub fn synthesize(&self, request: &SynthesisRequest<'_>) -> Synthesis {
        let Some(client) = self.strategy.client() else {
            return deterministic(request.category);
        };

        let prompt = build_query_prompt(request, self.reporting_year);
        match client.complete(&prompt) {
            Ok(output) => {
                let text = extract_query_text(&output);
                if text.is_empty() || text.starts_with("Error") {
                    // The model answered but gave no runnable query.
                    Synthesis::Unavailable { message: text }
                } else {
                    Synthesis::Query {
                        text,
                        strategy: StrategyKind::Generative,
                    }
                }
            }
            Err(failure) if failure.kind == GenerationFailureKind::EmptyCompletion => {
                tracing::warn!(stage = "synthesize", error = %failure, "model returned no query");
                Synthesis::Unavailable {
                    message: String::new(),
                }
            }
            Err(failure) => {
                tracing::warn!(
                    stage = "synthesize",
                    error = %failure,
                    "generative query synthesis failed; using template"
                );
                deterministic(request.category)
            }
        }
    }
}

fn deterministic(category: Category) -> Synthesis {
    Synthesis::Query {
        text: template_for(category).to_string(),
        strategy: StrategyKind::Deterministic,
    }
}

#[must_use]
pub fn build_query_prompt(request: &SynthesisRequest<'_>, reporting_year: i32) -> String {
    format!(
        "You are a SQL expert. Given an input question and the conversation so far, write one \
syntactically correct {dialect} query that answers it.
Return at most {RESULT_CAP} rows using a LIMIT clause.
Select only the columns the question needs; never use SELECT *.
Use only column names that appear in the schema below.

RULES:
1. Match text columns (names, managers, departments, locations) with LIKE and '%' wildcards.
2. Make text matching case-insensitive by applying LOWER() to both the column and the value.
3. Use CAST for type conversions.
4. Read the conversation history when the question refers back to earlier answers.
5. Attrition rate = (number of rows where overall_inactive_count = 1) / SUM(count) * 100.
6. Apply every filter the user gives (department, location, band, process, gender, month, year) \
without dropping any.
7. When no month or year is given, use all months of {reporting_year}; month-on-month questions \
compute the rate per month in calendar order.
8. Return the attrition rate together with the attrited count and the total headcount.
9. Put the final query in a ```sql fenced block.

CONVERSATION HISTORY:
{history}

AVAILABLE TABLES:
{schema}

QUESTION: {question}",
        dialect = request.dialect,
        history = request.history,
        schema = request.schema,
        question = request.question,
    )
}

#[cfg(test)]
mod tests {
    use super::{
        DEFAULT_QUERY, QuerySynthesizer, Synthesis, SynthesisRequest, build_query_prompt,
        template_for,
    };
    use crate::engine::category::{Category, classify};
    use crate::engine::mode::{Strategy, StrategyKind};
    use crate::llm::{GenerationFailure, GenerationFailureKind, TextCompletion};
    use std::sync::Arc;

    struct Canned(Result<String, GenerationFailure>);

    impl TextCompletion for Canned {
        fn complete(&self, _prompt: &str) -> Result<String, GenerationFailure> {
            self.0.clone()
        }
    }

    fn request(question: &str) -> SynthesisRequest<'_> {
        SynthesisRequest {
            question,
            history: "",
            schema: "Table: hr_data\nColumns: emp_id (TEXT)\n",
            dialect: "sqlite",
            category: classify(question),
        }
    }

    fn generative(output: Result<String, GenerationFailure>) -> QuerySynthesizer {
        QuerySynthesizer::new(Strategy::Generative(Arc::new(Canned(output))), 2024)
    }

    #[test]
    fn attrition_template_groups_by_department() {
        let query = template_for(Category::AttritionRate);
        assert!(query.contains("GROUP BY department"));
        assert!(query.contains("AS attrited"));
        assert!(query.contains("AS total"));
        assert!(query.contains(", 2) AS attrition_rate"));
    }

    #[test]
    fn unmatched_questions_select_first_ten_rows() {
        let synthesizer = QuerySynthesizer::new(Strategy::Deterministic, 2024);
        assert_eq!(
            synthesizer.synthesize(&request("tell me a joke")),
            Synthesis::Query {
                text: DEFAULT_QUERY.to_string(),
                strategy: StrategyKind::Deterministic,
            }
        );
    }

    #[test]
    fn generative_output_uses_fenced_block() {
        let synthesizer = generative(Ok(
            "```sql\nSELECT COUNT(*) FROM hr_data WHERE gender = 'Female'\n```".to_string(),
        ));
        assert_eq!(
            synthesizer.synthesize(&request("how many women")),
            Synthesis::Query {
                text: "SELECT COUNT(*) FROM hr_data WHERE gender = 'Female'".to_string(),
                strategy: StrategyKind::Generative,
            }
        );
    }

    #[test]
    fn generation_failure_falls_back_to_template() {
        let synthesizer = generative(Err(GenerationFailure::new(
            GenerationFailureKind::Transport,
            "connection refused",
        )));
        let Synthesis::Query { text, strategy } = synthesizer.synthesize(&request("headcount"))
        else {
            panic!("template fallback expected");
        };
        assert_eq!(strategy, StrategyKind::Deterministic);
        assert_eq!(text, template_for(Category::TotalHeadcount));
    }

    #[test]
    fn error_prefixed_output_is_unavailable() {
        let synthesizer = generative(Ok("Error: question is not about HR data".to_string()));
        assert_eq!(
            synthesizer.synthesize(&request("tell me a joke")),
            Synthesis::Unavailable {
                message: "Error: question is not about HR data".to_string(),
            }
        );
    }

    #[test]
    fn empty_generated_query_is_unavailable_not_templated() {
        for output in [
            Ok("```sql\n```".to_string()),
            Ok("   ".to_string()),
            Err(GenerationFailure::new(
                GenerationFailureKind::EmptyCompletion,
                "choice had no content",
            )),
        ] {
            assert_eq!(
                generative(output).synthesize(&request("headcount")),
                Synthesis::Unavailable {
                    message: String::new(),
                }
            );
        }
    }

    #[test]
    fn prompt_carries_cap_schema_and_year() {
        let prompt = build_query_prompt(&request("attrition rate in IT"), 2023);
        assert!(prompt.contains("at most 2000 rows"));
        assert!(prompt.contains("Table: hr_data"));
        assert!(prompt.contains("all months of 2023"));
        assert!(prompt.contains("QUESTION: attrition rate in IT"));
        assert!(prompt.contains("sqlite query"));
    }
}
