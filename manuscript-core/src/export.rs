//! Shareable renderings of an analysis: a Markdown checklist, a JSON
//! snapshot and a plain guideline template.
//!
//! Everything here is pure; delivery (clipboard, download, disk) belongs to
//! the caller.

use crate::compliance::{constraint_summaries, ComplianceReport, SectionDetail};
use crate::guidelines::Guideline;
use crate::limits::LimitSpec;
use crate::types::{Category, ManuscriptMetrics, ParsedManuscript};
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static UNSAFE_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static pattern"));

/// Markdown checklist for one manuscript against one guideline.
pub fn render_checklist_markdown(
    report: &ComplianceReport,
    manuscript: &ParsedManuscript,
    guideline: &Guideline,
    metrics: &ManuscriptMetrics,
) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "# Journal checklist: {} — {}",
        guideline.journal, guideline.article_type
    ));
    lines.push(String::new());

    let total = match manuscript.total_words {
        0 => "n/a".to_string(),
        n => n.to_string(),
    };
    lines.push(format!("- Total word count: {total}"));
    let figures = manuscript
        .figure_reference_count
        .max(metrics.figure_uploads.unwrap_or(0));
    lines.push(format!("- Figures mentioned/uploaded: {figures}"));
    lines.push(String::new());

    lines.push("## Section word counts".to_string());
    for detail in &report.section_details {
        let annotation = detail
            .limit
            .map(|limit| format!(" ({}/{} words)", detail.actual, limit))
            .unwrap_or_default();
        lines.push(format!("- {}: {}{annotation}", detail.category, detail.actual));
    }

    lines.push(String::new());
    lines.push("## Constraints".to_string());
    for constraint in constraint_summaries(guideline, Some(manuscript), metrics) {
        lines.push(format!(
            "- {}: {} — {} ({})",
            constraint.status.label, constraint.label, constraint.detail, constraint.limit_text
        ));
    }

    lines.join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTotals {
    pub section_count: usize,
    pub total_words: usize,
    pub figure_references: usize,
    pub figure_uploads: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSection {
    pub title: String,
    pub category: Category,
    pub word_count: usize,
}

/// The guideline fields worth carrying next to an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportGuideline {
    pub journal: String,
    pub article_type: String,
    pub word_limit: Option<LimitSpec>,
    pub abstract_limit: Option<LimitSpec>,
    pub structure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEvaluation {
    pub change_list: Vec<String>,
    pub expected_sections: Vec<SectionDetail>,
}

/// JSON snapshot of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisExport {
    pub generated_at: String,
    pub totals: ExportTotals,
    pub sections: Vec<ExportSection>,
    pub guideline: Option<ExportGuideline>,
    pub evaluation: Option<ExportEvaluation>,
}

impl AnalysisExport {
    pub fn to_json_pretty(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn build_analysis_export(
    manuscript: &ParsedManuscript,
    guideline: Option<&Guideline>,
    report: Option<&ComplianceReport>,
    metrics: &ManuscriptMetrics,
    now: DateTime<Utc>,
) -> AnalysisExport {
    AnalysisExport {
        generated_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        totals: ExportTotals {
            section_count: manuscript.sections.len(),
            total_words: manuscript.total_words,
            figure_references: manuscript.figure_reference_count,
            figure_uploads: metrics.figure_uploads.unwrap_or(0),
        },
        sections: manuscript
            .sections
            .iter()
            .map(|s| ExportSection {
                title: s.title.clone(),
                category: s.category,
                word_count: s.word_count,
            })
            .collect(),
        guideline: guideline.map(|g| ExportGuideline {
            journal: g.journal.clone(),
            article_type: g.article_type.clone(),
            word_limit: g.word_limit.clone(),
            abstract_limit: g.abstract_limit.clone(),
            structure: g.structure.clone(),
        }),
        evaluation: report.map(|r| ExportEvaluation {
            change_list: r.violations.clone(),
            expected_sections: r.section_details.clone(),
        }),
    }
}

fn sanitize_file_part(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    UNSAFE_FILE_CHARS
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// `analysis-<journal>-<type>-<timestamp>.json`, empty parts dropped.
pub fn export_file_name(guideline: Option<&Guideline>, now: DateTime<Utc>) -> String {
    let mut parts = vec!["analysis".to_string()];
    if let Some(g) = guideline {
        parts.push(sanitize_file_part(&g.journal));
        parts.push(sanitize_file_part(&g.article_type));
    }
    parts.push(
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-"),
    );
    parts.retain(|p| !p.is_empty());
    format!("{}.json", parts.join("-"))
}

/// Checklist items for every limit or requirement the guideline states.
pub fn guideline_template(guideline: &Guideline) -> Vec<String> {
    let limits = [
        ("Title limit", guideline.title_limit.as_ref()),
        ("Abstract limit", guideline.abstract_limit.as_ref()),
        ("Word limit", guideline.word_limit.as_ref()),
        ("Figure limit", guideline.figure_limit.as_ref()),
        ("Reference limit", guideline.reference_limit.as_ref()),
    ];
    let mut items: Vec<String> = limits
        .into_iter()
        .filter_map(|(label, spec)| {
            spec.filter(|s| !s.is_blank())
                .map(|s| format!("{label}: {s}"))
        })
        .collect();

    let prose = [
        ("Structure", guideline.structure.as_deref()),
        ("Other requirements", guideline.other_requirements.as_deref()),
    ];
    items.extend(prose.into_iter().filter_map(|(label, text)| {
        text.filter(|t| !t.trim().is_empty())
            .map(|t| format!("{label}: {t}"))
    }));
    items
}
