//! Markdown Preprocessor
//!
//! ATX headings (`#`, `##`, ...) open sections; the run length of `#` is the
//! level. Body lines are buffered and counted when the next heading arrives.

use super::preprocessor::{count_words, ParseContext, Preprocessor};
use super::section_stack::SectionStack;
use crate::error::Result;
use crate::types::*;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#+)\s+(.*)$").expect("static pattern"));

pub struct MarkdownPreprocessor;

impl MarkdownPreprocessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarkdownPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Heading level and title when `line` is an ATX heading.
pub fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let cap = HEADING_REGEX.captures(line)?;
    let level = cap.get(1)?.as_str().len();
    let title = cap.get(2)?.as_str().trim();
    Some((level, title))
}

impl Preprocessor for MarkdownPreprocessor {
    fn parse(&self, input: &ManuscriptInput, ctx: &ParseContext<'_>) -> Result<ParsedDocument> {
        ctx.ensure_not_cancelled()?;
        ctx.report("Reading markdown", 0.1);
        let text = String::from_utf8_lossy(&input.bytes).into_owned();
        ctx.ensure_not_cancelled()?;

        let lines: Vec<&str> = text.lines().collect();
        let total = lines.len().max(1);
        let mut stack = SectionStack::new();
        let mut buffer: Vec<&str> = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            ctx.checkpoint(idx, ctx.line_batch, "Scanning markdown headings", || {
                (0.1 + (idx as f32 / total as f32) * 0.75).min(0.9)
            })?;

            match parse_heading(line) {
                Some((level, title)) => {
                    stack.add_words(count_words(&buffer.join(" ")));
                    buffer.clear();
                    stack.open_heading(level, title);
                }
                None => buffer.push(line),
            }
        }
        stack.add_words(count_words(&buffer.join(" ")));
        ctx.ensure_not_cancelled()?;

        debug!("📝 {}: {} lines, {} headings", input.file_name, lines.len(), stack.heading_count());

        let sections = stack.finish(&input.file_name);
        ctx.report("Finishing analysis", 0.95);

        Ok(ParsedDocument {
            sections,
            text_content: text,
        })
    }

    fn name(&self) -> &str {
        "MarkdownPreprocessor"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["md", "markdown"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> ParsedDocument {
        let input = ManuscriptInput::new("paper.md", text.as_bytes().to_vec());
        MarkdownPreprocessor::new()
            .parse(&input, &ParseContext::new())
            .unwrap()
    }

    #[test]
    fn headings_need_space_after_hashes() {
        assert_eq!(parse_heading("## Methods "), Some((2, "Methods")));
        assert_eq!(parse_heading("#hashtag"), None);
        assert_eq!(parse_heading("text # not heading"), None);
    }

    #[test]
    fn nested_markdown_sections_in_document_order() {
        let doc = parse("# Methods\nintro words\n## Sample\none two three\n## Analysis\nfour\n# Results\nfive six\n");
        let got: Vec<(String, usize)> = doc
            .sections
            .into_iter()
            .map(|s| (s.title, s.word_count))
            .collect();
        assert_eq!(
            got,
            vec![
                ("Methods".to_string(), 2),
                ("Sample".to_string(), 3),
                ("Analysis".to_string(), 1),
                ("Results".to_string(), 2),
            ]
        );
    }

    #[test]
    fn crlf_line_endings_are_handled() {
        let doc = parse("# Abstract\r\nshort abstract here\r\n");
        assert_eq!(doc.sections[0].title, "Abstract");
        assert_eq!(doc.sections[0].word_count, 3);
    }

    #[test]
    fn headingless_markdown_is_one_section() {
        let doc = parse("just some words\nacross lines");
        assert_eq!(doc.sections, vec![RawSection::new("paper.md", 5)]);
        assert_eq!(doc.text_content, "just some words\nacross lines");
    }

    #[test]
    fn cancelling_between_batches_stops_the_scan() {
        use crate::background::CancellationToken;
        use crate::config::ProgressConfig;
        use crate::error::ManuscriptError;
        use std::sync::Mutex;

        let token = CancellationToken::new();
        let stages = Mutex::new(Vec::new());
        let on_progress = |p: AnalysisProgress| {
            if p.stage == "Scanning markdown headings" {
                token.cancel();
            }
            stages.lock().unwrap().push(p.stage);
        };
        let batches = ProgressConfig {
            line_batch: 2,
            ..ProgressConfig::default()
        };
        let ctx = ParseContext::new()
            .with_cancellation(&token)
            .with_progress(&on_progress)
            .with_batches(&batches);

        let text = (0..10).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let input = ManuscriptInput::new("paper.md", text.into_bytes());
        let result = MarkdownPreprocessor::new().parse(&input, &ctx);

        assert!(matches!(result, Err(ManuscriptError::Cancelled)));
        assert_eq!(
            *stages.lock().unwrap(),
            vec!["Reading markdown".to_string(), "Scanning markdown headings".to_string()]
        );
    }
}
