//! Caller-owned state for one interactive session: the current manuscript,
//! the selected guideline and which analysis request is still current.

use crate::compliance::{evaluate_with_metrics, ComplianceReport};
use crate::error::ManuscriptError;
use crate::guidelines::Guideline;
use crate::processor::AnalysisOutcome;
use crate::types::{ManuscriptMetrics, ParsedManuscript};
use tracing::debug;
use uuid::Uuid;

/// What `Session::complete_analysis` did with an outcome.
#[derive(Debug)]
pub enum Completion {
    /// The manuscript was replaced.
    Applied,
    /// Superseded; state left as it was.
    Cancelled,
    /// The manuscript was reset; the error is for the caller to show.
    Failed(ManuscriptError),
    /// A newer request exists; the outcome was dropped.
    Stale,
}

impl Completion {
    pub fn is_applied(&self) -> bool {
        matches!(self, Completion::Applied)
    }
}

#[derive(Debug, Default)]
pub struct Session {
    manuscript: Option<ParsedManuscript>,
    guideline: Option<Guideline>,
    figure_uploads: Option<usize>,
    reference_count: Option<u64>,
    latest_request: Option<Uuid>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new analysis request; earlier requests become stale.
    pub fn begin_analysis(&mut self) -> Uuid {
        let id = Uuid::new_v4();
        if let Some(previous) = self.latest_request.replace(id) {
            debug!("Request {} superseded by {}", previous, id);
        }
        id
    }

    pub fn latest_request(&self) -> Option<Uuid> {
        self.latest_request
    }

    pub fn complete_analysis(&mut self, id: Uuid, outcome: AnalysisOutcome) -> Completion {
        if self.latest_request != Some(id) {
            debug!("Dropping result of stale request {}", id);
            return Completion::Stale;
        }
        match outcome {
            AnalysisOutcome::Parsed(manuscript) => {
                self.manuscript = Some(manuscript);
                Completion::Applied
            }
            AnalysisOutcome::Cancelled => Completion::Cancelled,
            AnalysisOutcome::Failed(error) => {
                self.manuscript = None;
                Completion::Failed(error)
            }
        }
    }

    pub fn manuscript(&self) -> Option<&ParsedManuscript> {
        self.manuscript.as_ref()
    }

    pub fn clear_manuscript(&mut self) {
        self.manuscript = None;
    }

    pub fn select_guideline(&mut self, guideline: Option<Guideline>) {
        self.guideline = guideline;
    }

    pub fn guideline(&self) -> Option<&Guideline> {
        self.guideline.as_ref()
    }

    pub fn set_figure_uploads(&mut self, count: Option<usize>) {
        self.figure_uploads = count;
    }

    pub fn set_reference_count(&mut self, count: Option<u64>) {
        self.reference_count = count;
    }

    pub fn metrics(&self) -> ManuscriptMetrics {
        ManuscriptMetrics {
            figure_uploads: self.figure_uploads,
            reference_count: self.reference_count,
        }
    }

    /// Evaluate the current pair; `None` until both halves are present.
    pub fn report(&self) -> Option<ComplianceReport> {
        let manuscript = self.manuscript.as_ref()?;
        let guideline = self.guideline.as_ref()?;
        Some(evaluate_with_metrics(manuscript, guideline, &self.metrics()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Section};

    fn manuscript(name: &str, words: usize) -> ParsedManuscript {
        ParsedManuscript::new(
            name,
            vec![Section {
                title: "Results".into(),
                word_count: words,
                category: Category::Results,
            }],
            String::new(),
        )
    }

    #[test]
    fn stale_results_never_overwrite_newer_state() {
        let mut session = Session::new();
        let first = session.begin_analysis();
        let second = session.begin_analysis();
        assert_ne!(first, second);

        let applied = session.complete_analysis(second, AnalysisOutcome::Parsed(manuscript("new.md", 10)));
        assert!(applied.is_applied());

        let late = session.complete_analysis(first, AnalysisOutcome::Parsed(manuscript("old.md", 99)));
        assert!(matches!(late, Completion::Stale));
        assert_eq!(session.manuscript().unwrap().file_name, "new.md");
    }

    #[test]
    fn failure_resets_and_cancellation_keeps_state() {
        let mut session = Session::new();
        let id = session.begin_analysis();
        session.complete_analysis(id, AnalysisOutcome::Parsed(manuscript("a.md", 10)));

        let id = session.begin_analysis();
        let cancelled = session.complete_analysis(id, AnalysisOutcome::Cancelled);
        assert!(matches!(cancelled, Completion::Cancelled));
        assert!(session.manuscript().is_some());

        let id = session.begin_analysis();
        let failed = session.complete_analysis(
            id,
            AnalysisOutcome::Failed(ManuscriptError::MalformedDocument("no body".into())),
        );
        assert!(matches!(failed, Completion::Failed(ManuscriptError::MalformedDocument(_))));
        assert!(session.manuscript().is_none());
    }

    #[test]
    fn report_requires_manuscript_and_guideline() {
        let mut session = Session::new();
        session.select_guideline(Some(Guideline {
            word_limit: Some("100 words".into()),
            structure: Some("Results".into()),
            ..Guideline::new("J", "A")
        }));
        assert!(session.report().is_none());

        let id = session.begin_analysis();
        session.complete_analysis(id, AnalysisOutcome::Parsed(manuscript("a.md", 150)));
        session.set_figure_uploads(Some(2));

        let report = session.report().unwrap();
        assert_eq!(
            report.violations,
            vec!["Total word count 150 exceeds 100 limit by 50 words".to_string()]
        );
        assert_eq!(session.metrics().figure_uploads, Some(2));

        session.select_guideline(None);
        assert!(session.report().is_none());
    }
}
