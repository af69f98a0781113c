// Preprocessor abstraction for manuscript parsing
//
// This module defines the boundary between format handling (bytes -> titled
// blocks with word counts) and everything downstream (classification,
// compliance). Format parsers never classify; they only find headings and
// count words.

use crate::background::CancellationToken;
use crate::config::ProgressConfig;
use crate::error::{ManuscriptError, Result};
use crate::types::*;

/// Progress sink shared by the parsers and the analyzer.
pub type ProgressFn<'a> = &'a (dyn Fn(AnalysisProgress) + Send + Sync);

/// Everything a parser needs besides the document itself: where to report
/// progress, when to check for cancellation, and how often.
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    cancel: Option<&'a CancellationToken>,
    progress: Option<ProgressFn<'a>>,
    pub paragraph_batch: usize,
    pub line_batch: usize,
}

impl Default for ParseContext<'_> {
    fn default() -> Self {
        let batches = ProgressConfig::default();
        Self {
            cancel: None,
            progress: None,
            paragraph_batch: batches.paragraph_batch,
            line_batch: batches.line_batch,
        }
    }
}

impl<'a> ParseContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_progress(mut self, progress: ProgressFn<'a>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_batches(mut self, config: &ProgressConfig) -> Self {
        self.paragraph_batch = config.paragraph_batch.max(1);
        self.line_batch = config.line_batch.max(1);
        self
    }

    pub fn ensure_not_cancelled(&self) -> Result<()> {
        match self.cancel {
            Some(token) if token.is_cancelled() => Err(ManuscriptError::Cancelled),
            _ => Ok(()),
        }
    }

    pub fn report(&self, stage: &str, fraction: f32) {
        if let Some(progress) = self.progress {
            progress(AnalysisProgress {
                stage: stage.to_string(),
                fraction: fraction.clamp(0.0, 1.0),
            });
        }
    }

    /// Cancellation check plus progress report, run once per batch of `batch` items.
    pub fn checkpoint(
        &self,
        index: usize,
        batch: usize,
        stage: &str,
        fraction: impl FnOnce() -> f32,
    ) -> Result<()> {
        if index % batch.max(1) == 0 {
            self.ensure_not_cancelled()?;
            self.report(stage, fraction());
        }
        Ok(())
    }
}

/// Preprocessor trait - converts one document format into a ParsedDocument
///
/// Implementations handle:
/// - decoding the container (zip archive, UTF-8 text)
/// - finding headings and their nesting level
/// - counting words per section
///
/// Everything after this point works with RawSections and is format-agnostic.
pub trait Preprocessor {
    fn parse(&self, input: &ManuscriptInput, ctx: &ParseContext<'_>) -> Result<ParsedDocument>;

    /// Get preprocessor name for logging
    fn name(&self) -> &str;

    /// Lowercase extensions this preprocessor accepts
    fn extensions(&self) -> &'static [&'static str];

    fn supports_extension(&self, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        self.extensions().iter().any(|e| *e == extension)
    }
}

/// Whitespace-token count; runs of whitespace never produce empty words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
