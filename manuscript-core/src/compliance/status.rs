use crate::guidelines::Guideline;
use crate::limits::LimitSpec;
use crate::types::{ManuscriptMetrics, ParsedManuscript};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    /// No stated limit, or nothing measured yet
    Na,
    Over,
    Warning,
    Ok,
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComplianceStatus::Na => "na",
            ComplianceStatus::Over => "over",
            ComplianceStatus::Warning => "warning",
            ComplianceStatus::Ok => "ok",
        })
    }
}

/// A status plus the human label and the numbers it was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusAssessment {
    pub status: ComplianceStatus,
    pub label: String,
    pub limit: Option<u64>,
    pub actual: Option<u64>,
}

/// Classify `actual` against `limit`: over when above, warning from 90%, ok below.
pub fn compute_compliance_status(actual: Option<u64>, limit: Option<u64>) -> StatusAssessment {
    let (status, label) = match (limit, actual) {
        (None, _) | (Some(0), _) => (ComplianceStatus::Na, "No stated limit"),
        (Some(_), None) => (ComplianceStatus::Na, "No manuscript data"),
        (Some(limit), Some(actual)) if actual > limit => (ComplianceStatus::Over, "Over limit"),
        // integer form of actual / limit >= 0.9
        (Some(limit), Some(actual)) if actual as u128 * 10 >= limit as u128 * 9 => {
            (ComplianceStatus::Warning, "Close to limit")
        }
        (Some(_), Some(_)) => (ComplianceStatus::Ok, "Under limit"),
    };
    StatusAssessment {
        status,
        label: label.to_string(),
        limit,
        actual,
    }
}

/// One of the three headline limits (words, figures, references).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSummary {
    pub key: String,
    pub label: String,
    pub limit_text: String,
    pub status: StatusAssessment,
    pub detail: String,
}

fn limit_text(spec: Option<&LimitSpec>) -> Option<String> {
    spec.filter(|s| !s.is_blank()).map(|s| s.to_string())
}

pub fn constraint_summaries(
    guideline: &Guideline,
    manuscript: Option<&ParsedManuscript>,
    metrics: &ManuscriptMetrics,
) -> Vec<ConstraintSummary> {
    let manuscript = manuscript.filter(|m| m.has_sections());
    let has_data = manuscript.is_some();

    let total_words = manuscript.map(|m| m.total_words as u64);
    let figure_mentions = manuscript.map(|m| m.figure_reference_count as u64);
    let figure_uploads = metrics.figure_uploads.map(|n| n as u64);
    let figure_actual = match (figure_mentions, figure_uploads) {
        (None, None) => None,
        (mentions, uploads) => Some(mentions.unwrap_or(0).max(uploads.unwrap_or(0))),
    };
    let reference_count = metrics.reference_count;

    let word_limit = guideline.word_limit_value();
    let figure_limit = guideline.figure_limit_value();
    let reference_limit = guideline.reference_limit_value();

    let word_text = limit_text(guideline.word_limit.as_ref());
    let figure_text = limit_text(guideline.figure_limit.as_ref());
    let reference_text = limit_text(guideline.reference_limit.as_ref());
    let not_provided = |text: &Option<String>| {
        text.clone()
            .unwrap_or_else(|| "Limit not provided".to_string())
    };

    let words_detail = match word_limit {
        Some(limit) if has_data => format!("{} / {} words", total_words.unwrap_or(0), limit),
        Some(limit) => format!("{limit} words (limit)"),
        None => not_provided(&word_text),
    };
    let figures_detail = match (figure_limit, figure_actual) {
        (Some(limit), Some(actual)) if has_data => format!("{actual} of {limit} items"),
        (Some(limit), _) => format!("{limit} items (limit)"),
        (None, _) => not_provided(&figure_text),
    };
    let references_detail = match (reference_limit, reference_count) {
        (Some(limit), Some(actual)) if has_data => format!("{actual} of {limit}"),
        (Some(limit), _) => format!("{limit} references (limit)"),
        (None, _) => not_provided(&reference_text),
    };

    let gate = |actual: Option<u64>| if has_data { actual } else { None };

    vec![
        ConstraintSummary {
            key: "words".to_string(),
            label: "Main text".to_string(),
            limit_text: word_text.unwrap_or_else(|| "Not specified".to_string()),
            status: compute_compliance_status(gate(total_words), word_limit),
            detail: words_detail,
        },
        ConstraintSummary {
            key: "figures".to_string(),
            label: "Figures/Tables".to_string(),
            limit_text: figure_text.unwrap_or_else(|| "Not specified".to_string()),
            status: compute_compliance_status(gate(figure_actual), figure_limit),
            detail: figures_detail,
        },
        ConstraintSummary {
            key: "references".to_string(),
            label: "References".to_string(),
            limit_text: reference_text.unwrap_or_else(|| "Not specified".to_string()),
            status: compute_compliance_status(gate(reference_count), reference_limit),
            detail: references_detail,
        },
    ]
}
