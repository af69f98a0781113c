//! Word (.docx) Preprocessor
//!
//! Reads `word/document.xml` out of the zip container and walks its
//! paragraphs. A paragraph is a heading when its `w:pStyle` value starts with
//! "Heading"; the trailing number gives its level.

use super::preprocessor::{count_words, ParseContext, Preprocessor};
use super::section_stack::SectionStack;
use crate::error::{ManuscriptError, Result};
use crate::types::*;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::io::{Cursor, Read};
use std::sync::LazyLock;
use tracing::debug;

const DOCUMENT_PART: &str = "word/document.xml";

static HEADING_LEVEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)heading\s*([0-9]+)").expect("static pattern"));

/// One `w:p` element after text extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocxParagraph {
    pub text: String,
    pub heading_level: Option<usize>,
}

pub struct DocxPreprocessor;

impl DocxPreprocessor {
    pub fn new() -> Self {
        Self
    }

    fn read_document_xml(bytes: &[u8]) -> Result<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut entry = archive.by_name(DOCUMENT_PART).map_err(|_| {
            ManuscriptError::MalformedDocument(format!("missing {DOCUMENT_PART}"))
        })?;

        let mut xml = String::new();
        entry
            .read_to_string(&mut xml)
            .map_err(|e| ManuscriptError::MalformedDocument(format!("{DOCUMENT_PART}: {e}")))?;
        Ok(xml)
    }
}

impl Default for DocxPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

fn heading_level_from_style(style: &str) -> Option<usize> {
    if !style.starts_with("Heading") {
        return None;
    }
    let level = HEADING_LEVEL_REGEX
        .captures(style)
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .unwrap_or(1);
    Some(level.max(1))
}

fn style_value(element: &BytesStart<'_>) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"w:val")
        .and_then(|attr| attr.unescape_value().ok())
        .map(|v| v.into_owned())
}

/// Extract paragraphs from WordprocessingML in the order their `w:p` tags open.
pub fn extract_paragraphs(xml: &str) -> Result<Vec<DocxParagraph>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut paragraphs: Vec<DocxParagraph> = Vec::new();
    // Indices into `paragraphs` of currently open w:p elements (nesting happens in text boxes)
    let mut open: Vec<usize> = Vec::new();
    let mut text_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => {
                    open.push(paragraphs.len());
                    paragraphs.push(DocxParagraph::default());
                }
                b"w:t" => text_depth += 1,
                b"w:pStyle" => apply_style(&e, &open, &mut paragraphs),
                _ => {}
            },
            Event::Empty(e) => {
                if e.name().as_ref() == b"w:pStyle" {
                    apply_style(&e, &open, &mut paragraphs);
                }
            }
            Event::Text(t) => {
                if text_depth > 0 {
                    if let Some(&idx) = open.last() {
                        paragraphs[idx].text.push_str(&t.unescape()?);
                    }
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:p" => {
                    open.pop();
                }
                b"w:t" => text_depth = text_depth.saturating_sub(1),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    for paragraph in &mut paragraphs {
        paragraph.text = paragraph.text.trim().to_string();
    }
    Ok(paragraphs)
}

fn apply_style(element: &BytesStart<'_>, open: &[usize], paragraphs: &mut [DocxParagraph]) {
    let Some(&idx) = open.last() else {
        return;
    };
    if let Some(level) = style_value(element).as_deref().and_then(heading_level_from_style) {
        paragraphs[idx].heading_level = Some(level);
    }
}

impl Preprocessor for DocxPreprocessor {
    fn parse(&self, input: &ManuscriptInput, ctx: &ParseContext<'_>) -> Result<ParsedDocument> {
        ctx.ensure_not_cancelled()?;
        ctx.report("Reading .docx file", 0.05);

        ctx.ensure_not_cancelled()?;
        ctx.report("Extracting document", 0.15);
        let xml = Self::read_document_xml(&input.bytes)?;

        ctx.ensure_not_cancelled()?;
        ctx.report("Parsing document XML", 0.25);
        let paragraphs = extract_paragraphs(&xml)?;

        let total = paragraphs.len().max(1);
        let mut stack = SectionStack::new();
        let mut text_content = Vec::new();

        for (idx, paragraph) in paragraphs.iter().enumerate() {
            ctx.checkpoint(idx, ctx.paragraph_batch, "Analyzing document structure", || {
                (0.25 + (idx as f32 / total as f32) * 0.65).min(0.9)
            })?;

            if paragraph.text.is_empty() {
                continue;
            }
            text_content.push(paragraph.text.as_str());

            match paragraph.heading_level {
                Some(level) => stack.open_heading(level, paragraph.text.clone()),
                None => stack.add_words(count_words(&paragraph.text)),
            }
        }
        ctx.ensure_not_cancelled()?;

        debug!(
            "📄 {}: {} paragraphs, {} headings",
            input.file_name,
            paragraphs.len(),
            stack.heading_count()
        );

        let text_content = text_content.join("\n");
        let sections = stack.finish(&input.file_name);
        ctx.report("Finishing analysis", 0.95);

        Ok(ParsedDocument {
            sections,
            text_content,
        })
    }

    fn name(&self) -> &str {
        "DocxPreprocessor"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["docx"]
    }
}
