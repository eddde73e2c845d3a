//! Ordered phrase rules that map a question onto a template category.
//!
//! The synthesizer, renderer and insight generator all dispatch on the category returned by
//! [`classify`], so one question always lands in the same bucket across a call.

use serde::Serialize;

pub const CATEGORY_TABLE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    AttritionRate,
    HeadcountByDepartment,
    TotalHeadcount,
    GenderDistribution,
    AgeGroupDistribution,
    TenureDistribution,
    LocationBreakdown,
    ResignationReasons,
    Unmatched,
}

impl Category {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AttritionRate => "attrition_rate",
            Self::HeadcountByDepartment => "headcount_by_department",
            Self::TotalHeadcount => "total_headcount",
            Self::GenderDistribution => "gender_distribution",
            Self::AgeGroupDistribution => "age_group_distribution",
            Self::TenureDistribution => "tenure_distribution",
            Self::LocationBreakdown => "location_breakdown",
            Self::ResignationReasons => "resignation_reasons",
            Self::Unmatched => "unmatched",
        }
    }
}

/// Matches when every `all` phrase is present and, if `any` is non-empty, at least one of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseRule {
    pub all: &'static [&'static str],
    pub any: &'static [&'static str],
}

impl PhraseRule {
    #[must_use]
    pub fn matches(&self, lowered_question: &str) -> bool {
        self.all
            .iter()
            .all(|phrase| lowered_question.contains(phrase))
            && (self.any.is_empty()
                || self
                    .any
                    .iter()
                    .any(|phrase| lowered_question.contains(phrase)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRule {
    pub category: Category,
    pub phrases: PhraseRule,
}

/// Evaluated top to bottom; the first satisfied rule wins.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::AttritionRate,
        phrases: PhraseRule {
            all: &[],
            any: &["attrition rate", "turnover rate"],
        },
    },
    CategoryRule {
        category: Category::HeadcountByDepartment,
        phrases: PhraseRule {
            all: &["headcount", "department"],
            any: &[],
        },
    },
    CategoryRule {
        category: Category::TotalHeadcount,
        phrases: PhraseRule {
            all: &["headcount"],
            any: &[],
        },
    },
    CategoryRule {
        category: Category::GenderDistribution,
        phrases: PhraseRule {
            all: &["gender", "distribution"],
            any: &[],
        },
    },
    CategoryRule {
        category: Category::AgeGroupDistribution,
        phrases: PhraseRule {
            all: &["age", "group"],
            any: &[],
        },
    },
    CategoryRule {
        category: Category::TenureDistribution,
        phrases: PhraseRule {
            all: &[],
            any: &["tenure", "years of service"],
        },
    },
    CategoryRule {
        category: Category::LocationBreakdown,
        phrases: PhraseRule {
            all: &["location"],
            any: &[],
        },
    },
    CategoryRule {
        category: Category::ResignationReasons,
        phrases: PhraseRule {
            all: &["reason"],
            any: &["leaving", "resignation", "attrition"],
        },
    },
];

#[must_use]
pub fn classify(question: &str) -> Category {
    let lowered = question.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|rule| rule.phrases.matches(&lowered))
        .map_or(Category::Unmatched, |rule| rule.category)
}

#[cfg(test)]
mod tests {
    use super::{CATEGORY_RULES, Category, classify};

    #[test]
    fn priority_order_is_first_match_wins() {
        assert_eq!(
            classify("Headcount and attrition rate by department"),
            Category::AttritionRate
        );
        assert_eq!(
            classify("headcount per DEPARTMENT"),
            Category::HeadcountByDepartment
        );
        assert_eq!(classify("headcount"), Category::TotalHeadcount);
        assert_eq!(
            classify("What is the age group split by location?"),
            Category::AgeGroupDistribution
        );
    }

    #[test]
    fn reason_rule_needs_a_qualifier() {
        assert_eq!(
            classify("top reasons for leaving"),
            Category::ResignationReasons
        );
        assert_eq!(classify("reason codes"), Category::Unmatched);
    }

    #[test]
    fn every_rule_is_reachable() {
        let samples = [
            "turnover rate",
            "headcount by department",
            "headcount",
            "gender distribution",
            "age group",
            "years of service",
            "location",
            "reason for resignation",
        ];
        let categories = samples.map(classify);
        let expected = CATEGORY_RULES.iter().map(|rule| rule.category).collect::<Vec<_>>();
        assert_eq!(categories.to_vec(), expected);
    }
}
