//! Document Preprocessors
//!
//! This module provides the preprocessing layer for converting the accepted
//! manuscript formats into a unified ParsedDocument that feeds classification.
//!
//! ## Architecture
//!
//! ```text
//! Manuscript (DOCX, MD, TXT)
//!     ↓
//! [Format-specific Preprocessor]   (chosen by extension)
//!     ↓
//! ParsedDocument (titled sections + raw text)
//!     ↓
//! [Section classifier]
//!     ↓
//! ParsedManuscript
//! ```
//!
//! ## Available Preprocessors
//!
//! - `DocxPreprocessor` - Word documents (`.docx`), heading styles nest by level
//! - `MarkdownPreprocessor` - Markdown (`.md`, `.markdown`), ATX headings
//! - `PlainTextPreprocessor` - plain text (`.txt`), a single section

pub mod docx;
pub mod markdown;
pub mod preprocessor;
pub mod section_stack;
pub mod text;

pub use docx::DocxPreprocessor;
pub use markdown::MarkdownPreprocessor;
pub use preprocessor::{count_words, ParseContext, Preprocessor, ProgressFn};
pub use section_stack::SectionStack;
pub use text::PlainTextPreprocessor;

use crate::error::{ManuscriptError, Result};
use crate::types::{ManuscriptInput, ParsedDocument};

/// Preprocessor enum for runtime format selection
pub enum PreprocessorImpl {
    Docx(DocxPreprocessor),
    Markdown(MarkdownPreprocessor),
    PlainText(PlainTextPreprocessor),
}

impl PreprocessorImpl {
    /// Pick the preprocessor for a (case-insensitive) file extension.
    pub fn for_extension(extension: &str) -> Result<Self> {
        let candidates = [
            PreprocessorImpl::Docx(DocxPreprocessor::new()),
            PreprocessorImpl::PlainText(PlainTextPreprocessor::new()),
            PreprocessorImpl::Markdown(MarkdownPreprocessor::new()),
        ];
        candidates
            .into_iter()
            .find(|p| p.supports_extension(extension))
            .ok_or_else(|| ManuscriptError::UnsupportedFormat {
                extension: extension.to_lowercase(),
            })
    }

    pub fn for_input(input: &ManuscriptInput) -> Result<Self> {
        Self::for_extension(&input.extension())
    }
}

impl Preprocessor for PreprocessorImpl {
    fn parse(&self, input: &ManuscriptInput, ctx: &ParseContext<'_>) -> Result<ParsedDocument> {
        match self {
            PreprocessorImpl::Docx(p) => p.parse(input, ctx),
            PreprocessorImpl::Markdown(p) => p.parse(input, ctx),
            PreprocessorImpl::PlainText(p) => p.parse(input, ctx),
        }
    }

    fn name(&self) -> &str {
        match self {
            PreprocessorImpl::Docx(p) => p.name(),
            PreprocessorImpl::Markdown(p) => p.name(),
            PreprocessorImpl::PlainText(p) => p.name(),
        }
    }

    fn extensions(&self) -> &'static [&'static str] {
        match self {
            PreprocessorImpl::Docx(p) => p.extensions(),
            PreprocessorImpl::Markdown(p) => p.extensions(),
            PreprocessorImpl::PlainText(p) => p.extensions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ACCEPTED_EXTENSIONS;

    #[test]
    fn dispatch_is_case_insensitive() {
        assert_eq!(PreprocessorImpl::for_extension("DOCX").unwrap().name(), "DocxPreprocessor");
        assert_eq!(PreprocessorImpl::for_extension("Markdown").unwrap().name(), "MarkdownPreprocessor");
        assert_eq!(PreprocessorImpl::for_extension("md").unwrap().name(), "MarkdownPreprocessor");
        assert_eq!(PreprocessorImpl::for_extension("txt").unwrap().name(), "PlainTextPreprocessor");
    }

    #[test]
    fn every_accepted_extension_has_a_preprocessor() {
        for ext in ACCEPTED_EXTENSIONS {
            assert!(PreprocessorImpl::for_extension(ext).is_ok(), "{ext}");
        }
    }

    #[test]
    fn unknown_extension_is_rejected_with_its_name() {
        let input = ManuscriptInput::new("paper.PDF", vec![]);
        let err = PreprocessorImpl::for_input(&input).err().unwrap();
        assert_eq!(
            err.to_string(),
            "Unsupported file type: .pdf. Upload .docx, .txt, or .md/.markdown files."
        );
    }
}
