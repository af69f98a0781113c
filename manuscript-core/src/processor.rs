use crate::background::CancellationToken;
use crate::classifier::classify_sections;
use crate::config::{AnalyzerConfig, ProgressConfig};
use crate::error::{ManuscriptError, Result};
use crate::preprocessors::{ParseContext, Preprocessor, PreprocessorImpl, ProgressFn};
use crate::types::*;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.timings.push((step_name.to_string(), elapsed));
        info!("⏱️  {}: {:.0}ms", step_name, elapsed.as_millis());

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn log_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();
        info!("📊 Performance Summary:");
        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            info!(
                "   {:.<35} {:.0}ms ({:.1}%)",
                step,
                duration.as_millis(),
                percentage
            );
        }
        info!("   {:.<35} {:.0}ms", "Total", total.as_millis());
    }
}

/// Result of one analysis request as seen by the caller.
#[derive(Debug)]
pub enum AnalysisOutcome {
    Parsed(ParsedManuscript),
    /// Superseded by a newer request; not an error.
    Cancelled,
    Failed(ManuscriptError),
}

impl AnalysisOutcome {
    pub fn from_result(result: Result<ParsedManuscript>) -> Self {
        match result {
            Ok(manuscript) => AnalysisOutcome::Parsed(manuscript),
            Err(e) if e.is_cancellation() => AnalysisOutcome::Cancelled,
            Err(e) => AnalysisOutcome::Failed(e),
        }
    }

    pub fn into_result(self) -> Result<ParsedManuscript> {
        match self {
            AnalysisOutcome::Parsed(m) => Ok(m),
            AnalysisOutcome::Cancelled => Err(ManuscriptError::Cancelled),
            AnalysisOutcome::Failed(e) => Err(e),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AnalysisOutcome::Cancelled)
    }
}

/// Format detection → parsing → classification.
///
/// Stateless apart from its settings; one instance can serve any number of
/// requests, including from worker threads.
#[derive(Debug, Clone, Default)]
pub struct ManuscriptAnalyzer {
    progress: ProgressConfig,
    profile: bool,
}

impl ManuscriptAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self {
            progress: config.progress.clone(),
            profile: config.profile,
        }
    }

    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profile = enabled;
        self
    }

    pub fn analyze(&self, input: &ManuscriptInput) -> Result<ParsedManuscript> {
        self.analyze_with(input, None, None)
    }

    pub fn analyze_path(&self, path: &Path) -> Result<ParsedManuscript> {
        let input = ManuscriptInput::from_path(path)?;
        self.analyze(&input)
    }

    /// Analyze with optional cooperative cancellation and progress reporting.
    pub fn analyze_with(
        &self,
        input: &ManuscriptInput,
        cancel: Option<&CancellationToken>,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<ParsedManuscript> {
        let mut ctx = ParseContext::new().with_batches(&self.progress);
        if let Some(token) = cancel {
            ctx = ctx.with_cancellation(token);
        }
        if let Some(progress) = progress {
            ctx = ctx.with_progress(progress);
        }

        let mut profiler = StepProfiler::new(self.profile);
        ctx.report("Starting analysis", 0.0);

        let preprocessor = PreprocessorImpl::for_input(input)?;
        debug!("🔍 {} → {}", input.file_name, preprocessor.name());

        let document = profiler.time_step("Parse document", || preprocessor.parse(input, &ctx))?;
        ctx.ensure_not_cancelled()?;

        let sections = profiler.time_step("Classify sections", || {
            classify_sections(document.sections)
        });
        let manuscript = profiler.time_step("Aggregate counts", || {
            ParsedManuscript::new(input.file_name.clone(), sections, document.text_content)
        });
        ctx.ensure_not_cancelled()?;

        info!(
            "✅ Analyzed {}: {} sections, {} words, {} figure references",
            manuscript.file_name,
            manuscript.sections.len(),
            manuscript.total_words,
            manuscript.figure_reference_count
        );
        profiler.log_summary();
        ctx.report("Analysis complete", 1.0);

        Ok(manuscript)
    }
}
