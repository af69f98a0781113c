use crate::types::RawSection;

#[derive(Debug, Clone, Copy)]
struct OpenSection {
    level: usize,
    slot: usize,
}

/// Tracks open sections by heading level while a document is scanned.
///
/// A heading at level L closes every open section at depth L or deeper, then
/// opens itself. Body words go to the innermost open section, or to the
/// preamble before the first heading. Sections keep the slot reserved when
/// their heading was seen, so output is always in document order.
#[derive(Debug, Default)]
pub struct SectionStack {
    open: Vec<OpenSection>,
    sections: Vec<RawSection>,
    preamble_words: usize,
}

impl SectionStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_heading(&mut self, level: usize, title: impl Into<String>) {
        let level = level.max(1);
        while self.open.last().is_some_and(|top| top.level >= level) {
            self.open.pop();
        }

        let slot = self.sections.len();
        self.sections.push(RawSection::new(title, 0));
        self.open.push(OpenSection { level, slot });
    }

    pub fn add_words(&mut self, words: usize) {
        match self.open.last() {
            Some(top) => self.sections[top.slot].word_count += words,
            None => self.preamble_words += words,
        }
    }

    pub fn heading_count(&self) -> usize {
        self.sections.len()
    }

    /// Current nesting depth (number of open sections).
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Close everything still open and return the sections.
    ///
    /// Without any heading the whole document becomes one section named
    /// `fallback_title`. Preamble words are dropped once headings exist.
    pub fn finish(mut self, fallback_title: &str) -> Vec<RawSection> {
        self.open.clear();
        if self.sections.is_empty() {
            return vec![RawSection::new(fallback_title, self.preamble_words)];
        }
        self.sections
    }
}
