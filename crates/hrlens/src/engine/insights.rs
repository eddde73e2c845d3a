use super::category::Category;
use super::mode::{Strategy, StrategyKind};

struct CannedInsight {
    findings: &'static [&'static str],
    recommendations: &'static [&'static str],
}

const ATTRITION_INSIGHT: CannedInsight = CannedInsight {
    findings: &[
        "The data shows varying attrition rates across departments",
        "Departments with higher attrition rates may require focused retention strategies",
        "Consider investigating the root causes in departments with above-average attrition",
    ],
    recommendations: &[
        "Conduct exit interviews to understand reasons for leaving",
        "Implement targeted retention programs for high-attrition departments",
        "Review compensation and benefits packages to remain competitive",
    ],
};

const HEADCOUNT_INSIGHT: CannedInsight = CannedInsight {
    findings: &[
        "The headcount distribution provides insights into organizational structure",
        "Some departments may be understaffed or overstaffed relative to their responsibilities",
    ],
    recommendations: &[
        "Review resource allocation across departments",
        "Consider workforce planning to address any imbalances",
        "Align headcount with strategic business objectives",
    ],
};

const GENDER_INSIGHT: CannedInsight = CannedInsight {
    findings: &[
        "The gender distribution provides insights into workforce diversity",
        "There may be opportunities to improve gender balance in certain areas",
    ],
    recommendations: &[
        "Review recruitment and promotion practices for potential bias",
        "Implement diversity and inclusion initiatives",
        "Set targets for improving gender balance where needed",
    ],
};

const AGE_INSIGHT: CannedInsight = CannedInsight {
    findings: &[
        "The age distribution shows the generational makeup of the workforce",
        "Different age groups may have different needs and expectations",
    ],
    recommendations: &[
        "Develop age-inclusive policies and practices",
        "Consider mentorship programs to facilitate knowledge transfer",
        "Ensure benefits and development opportunities appeal to all age groups",
    ],
};

const TENURE_INSIGHT: CannedInsight = CannedInsight {
    findings: &[
        "The tenure mix shows how much experience is concentrated in long-serving staff",
        "A large share of short-tenure employees can signal onboarding or early attrition issues",
    ],
    recommendations: &[
        "Track early-tenure attrition separately from overall attrition",
        "Strengthen onboarding and first-year check-ins",
        "Plan succession for roles held by long-tenure employees",
    ],
};

const LOCATION_INSIGHT: CannedInsight = CannedInsight {
    findings: &[
        "Headcount and attrition differ between locations",
        "Sites with high attrition relative to their size deserve a closer look",
    ],
    recommendations: &[
        "Compare local compensation against the regional market",
        "Share retention practices from low-attrition sites",
        "Review site leadership and working conditions where attrition is highest",
    ],
};

const REASON_INSIGHT: CannedInsight = CannedInsight {
    findings: &[
        "A few resignation reasons account for most of the exits",
        "Some of the leading reasons are within the organization's control",
    ],
    recommendations: &[
        "Target the top controllable reasons with specific programs",
        "Validate exit reasons with stay interviews for current staff",
        "Re-check the reason mix each quarter to measure progress",
    ],
};

const GENERIC_INSIGHT: CannedInsight = CannedInsight {
    findings: &[
        "The data provides valuable insights into workforce metrics",
        "Further analysis may reveal additional patterns and trends",
    ],
    recommendations: &[
        "Continue monitoring these metrics over time",
        "Compare results with industry benchmarks",
        "Use these insights to inform HR strategy and decision-making",
    ],
};

const fn canned_insight(category: Category) -> &'static CannedInsight {
    match category {
        Category::AttritionRate => &ATTRITION_INSIGHT,
        Category::HeadcountByDepartment | Category::TotalHeadcount => &HEADCOUNT_INSIGHT,
        Category::GenderDistribution => &GENDER_INSIGHT,
        Category::AgeGroupDistribution => &AGE_INSIGHT,
        Category::TenureDistribution => &TENURE_INSIGHT,
        Category::LocationBreakdown => &LOCATION_INSIGHT,
        Category::ResignationReasons => &REASON_INSIGHT,
        Category::Unmatched => &GENERIC_INSIGHT,
    }
}

/// "Key Findings" and "Recommendations" sections for a category. Ignores the numbers.
#[must_use]
pub fn deterministic_analysis(category: Category) -> String {
    let insight = canned_insight(category);
    let mut analysis = String::from("## Analysis\n\n### Key Findings\n\n");
    for finding in insight.findings {
        analysis.push_str("* ");
        analysis.push_str(finding);
        analysis.push('\n');
    }
    analysis.push_str("\n### Recommendations\n\n");
    for (index, recommendation) in insight.recommendations.iter().enumerate() {
        analysis.push_str(&format!("{}. {recommendation}\n", index + 1));
    }
    analysis
}

#[must_use]
pub fn build_analysis_prompt(result: &str) -> String {
    format!(
        "Analyze these HR query results in detail:
{result}

Cover:
1. Trends
2. Notable patterns and anomalies
3. Key takeaways
4. Practical business recommendations

Format:
- Clear section headers
- Bullet points for key findings
- Significant numbers highlighted
- HR metrics context
- Short paragraphs"
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub text: String,
    pub strategy: StrategyKind,
}

#[derive(Debug, Clone)]
pub struct InsightGenerator {
    strategy: Strategy,
}

impl InsightGenerator {
    #[must_use]
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    #[must_use]
    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub fn analyze(&self, category: Category, result: &str) -> Analysis {
        if let Some(client) = self.strategy.client() {
            match client.complete(&build_analysis_prompt(result)) {
                Ok(text) => {
                    return Analysis {
                        text,
                        strategy: StrategyKind::Generative,
                    };
                }
                Err(failure) => tracing::warn!(
                    stage = "analyze",
                    error = %failure,
                    "generative analysis failed; using canned insight"
                ),
            }
        }

        Analysis {
            text: deterministic_analysis(category),
            strategy: StrategyKind::Deterministic,
        }
    }
}
