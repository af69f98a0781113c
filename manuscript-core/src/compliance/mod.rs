//! Compliance evaluation of a parsed manuscript against one guideline.
//!
//! Pure functions only: the same (manuscript, guideline, metrics) triple
//! always produces the same report.

pub mod screening;
pub mod status;

pub use screening::{screen_guidelines, RequiredChanges, ScreeningResult};
pub use status::{
    compute_compliance_status, constraint_summaries, ComplianceStatus, ConstraintSummary,
    StatusAssessment,
};

use crate::classifier::find_categories_in_text;
use crate::guidelines::Guideline;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Actual words for one expected category against its limit or even share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDetail {
    pub category: Category,
    pub actual: usize,
    /// Explicit per-category limit from the guideline
    pub limit: Option<u64>,
    /// Even share of the overall word limit, only when no explicit limit exists
    pub expected: Option<u64>,
    /// `actual / (limit or expected)` to two decimals, or "n/a"
    pub ratio: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub expected_categories: Vec<Category>,
    /// Sorted by label
    pub missing_categories: Vec<Category>,
    /// Human-readable required changes, in evaluation order
    pub violations: Vec<String>,
    pub section_details: Vec<SectionDetail>,
    pub constraints: Vec<ConstraintSummary>,
}

impl ComplianceReport {
    pub fn is_compliant(&self) -> bool {
        self.violations.is_empty()
    }

    /// Whether any expected category has an explicit limit (changes table headers).
    pub fn has_section_limits(&self) -> bool {
        self.section_details.iter().any(|d| d.limit.is_some())
    }
}

/// Categories the guideline's structure text names, or the default six.
pub fn expected_categories(guideline: &Guideline) -> Vec<Category> {
    let detected = guideline
        .structure
        .as_deref()
        .map(find_categories_in_text)
        .unwrap_or_default();
    if detected.is_empty() {
        Category::DEFAULT_EXPECTED.to_vec()
    } else {
        detected.into_iter().collect()
    }
}

pub fn evaluate(manuscript: &ParsedManuscript, guideline: &Guideline) -> ComplianceReport {
    evaluate_with_metrics(manuscript, guideline, &ManuscriptMetrics::default())
}

pub fn evaluate_with_metrics(
    manuscript: &ParsedManuscript,
    guideline: &Guideline,
    metrics: &ManuscriptMetrics,
) -> ComplianceReport {
    let expected = expected_categories(guideline);
    let present = manuscript.present_categories();
    let by_category = manuscript.words_by_category();
    let section_limits = guideline.per_category_limits();
    let words_in = |c: Category| by_category.get(&c).copied().unwrap_or(0) as u64;

    let mut violations = Vec::new();

    let mut missing: Vec<Category> = expected
        .iter()
        .copied()
        .filter(|c| !present.contains(c))
        .collect();
    missing.sort_by_key(|c| c.label());
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|c| c.label()).collect();
        violations.push(format!("Add sections covering: {}", names.join(", ")));
    }

    let total = manuscript.total_words as u64;
    let word_limit = guideline.word_limit_value();
    if let Some(limit) = word_limit.filter(|l| total > *l) {
        violations.push(format!(
            "Total word count {total} exceeds {limit} limit by {} words",
            total - limit
        ));
    }

    // Checked on the first Abstract section alone, independently of the per-category pass below
    if let Some(limit) = guideline.abstract_limit_value() {
        let first_abstract = manuscript
            .sections
            .iter()
            .find(|s| s.category == Category::Abstract);
        if let Some(section) = first_abstract.filter(|s| s.word_count as u64 > limit) {
            let words = section.word_count as u64;
            violations.push(format!(
                "Abstract {words}/{limit} words (reduce by {})",
                words - limit
            ));
        }
    }

    for (&category, &limit) in &section_limits {
        if category == Category::SignificanceStatement {
            continue;
        }
        let actual = words_in(category);
        if actual > limit {
            violations.push(format!(
                "{category} {actual}/{limit} words (reduce by {})",
                actual - limit
            ));
        }
    }

    if let Some(&limit) = section_limits.get(&Category::SignificanceStatement) {
        if guideline.enforces_significance_statement() {
            let words = words_in(Category::SignificanceStatement);
            if words == 0 {
                violations.push(
                    "Add a Significance Statement (required for PNAS Research Reports)".to_string(),
                );
            } else if words > limit {
                violations.push(format!(
                    "Significance Statement {words}/{limit} words (reduce by {})",
                    words - limit
                ));
            }
        }
    }

    let share = word_limit
        .filter(|_| !expected.is_empty())
        .map(|limit| (limit as f64 / expected.len() as f64).round() as u64)
        .filter(|share| *share > 0);

    let section_details = expected
        .iter()
        .map(|&category| {
            let actual = by_category.get(&category).copied().unwrap_or(0);
            let limit = section_limits.get(&category).copied();
            let expected = if limit.is_some() { None } else { share };
            let ratio = match limit.or(expected) {
                Some(denominator) => format!("{:.2}", actual as f64 / denominator as f64),
                None => "n/a".to_string(),
            };
            SectionDetail {
                category,
                actual,
                limit,
                expected,
                ratio,
            }
        })
        .collect();

    ComplianceReport {
        expected_categories: expected,
        missing_categories: missing,
        violations,
        section_details,
        constraints: constraint_summaries(guideline, Some(manuscript), metrics),
    }
}
