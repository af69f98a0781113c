use super::preprocessor::{count_words, ParseContext, Preprocessor};
use crate::error::Result;
use crate::types::*;

/// Plain text: the whole file is one section named after the file.
pub struct PlainTextPreprocessor;

impl PlainTextPreprocessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainTextPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor for PlainTextPreprocessor {
    fn parse(&self, input: &ManuscriptInput, ctx: &ParseContext<'_>) -> Result<ParsedDocument> {
        ctx.ensure_not_cancelled()?;
        ctx.report("Reading text file", 0.1);
        let text = String::from_utf8_lossy(&input.bytes).into_owned();
        ctx.ensure_not_cancelled()?;

        let words = count_words(&text);
        ctx.report("Finishing analysis", 0.95);

        Ok(ParsedDocument {
            sections: vec![RawSection::new(input.file_name.clone(), words)],
            text_content: text,
        })
    }

    fn name(&self) -> &str {
        "PlainTextPreprocessor"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["txt"]
    }
}
