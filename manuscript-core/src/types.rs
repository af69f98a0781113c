use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ===== SECTION TAXONOMY =====
// Declaration order is the classifier's rule order; `Ord` follows it, so any
// BTreeMap/BTreeSet keyed by Category iterates most-specific-first.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Abstract,
    #[serde(rename = "Significance Statement")]
    SignificanceStatement,
    Introduction,
    Methods,
    Results,
    Discussion,
    Conclusion,
    Other,
}

impl Category {
    /// Categories a journal expects when its structure text names none.
    pub const DEFAULT_EXPECTED: [Category; 6] = [
        Category::Abstract,
        Category::Introduction,
        Category::Methods,
        Category::Results,
        Category::Discussion,
        Category::Conclusion,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Abstract => "Abstract",
            Category::SignificanceStatement => "Significance Statement",
            Category::Introduction => "Introduction",
            Category::Methods => "Methods",
            Category::Results => "Results",
            Category::Discussion => "Discussion",
            Category::Conclusion => "Conclusion",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ===== PARSER OUTPUT =====

/// A titled block as produced by a format parser, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSection {
    pub title: String,
    pub word_count: usize,
}

impl RawSection {
    pub fn new(title: impl Into<String>, word_count: usize) -> Self {
        Self {
            title: title.into(),
            word_count,
        }
    }
}

/// Unified output of every format parser: sections in document order plus the raw text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub sections: Vec<RawSection>,
    pub text_content: String,
}

// ===== ANALYSIS RESULT =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub word_count: usize,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedManuscript {
    pub file_name: String,
    pub sections: Vec<Section>,
    pub total_words: usize,
    pub figure_reference_count: usize,
    pub raw_text: String,
}

impl ParsedManuscript {
    /// Build from classified sections; totals are always derived, never supplied.
    pub fn new(file_name: impl Into<String>, sections: Vec<Section>, raw_text: String) -> Self {
        let total_words = sections.iter().map(|s| s.word_count).sum();
        let figure_reference_count = crate::figures::count_figure_mentions_from_text(&raw_text);
        Self {
            file_name: file_name.into(),
            sections,
            total_words,
            figure_reference_count,
            raw_text,
        }
    }

    /// Word count per category, summed over every section sharing it.
    pub fn words_by_category(&self) -> std::collections::BTreeMap<Category, usize> {
        let mut totals = std::collections::BTreeMap::new();
        for section in &self.sections {
            *totals.entry(section.category).or_insert(0) += section.word_count;
        }
        totals
    }

    /// Categories used by at least one section, excluding `Other`.
    pub fn present_categories(&self) -> std::collections::BTreeSet<Category> {
        self.sections
            .iter()
            .map(|s| s.category)
            .filter(|c| *c != Category::Other)
            .collect()
    }

    pub fn has_sections(&self) -> bool {
        !self.sections.is_empty()
    }
}

// ===== INPUTS =====

/// A manuscript file handed to the analyzer: its name (for dispatch and
/// fallback titles) and its full contents.
#[derive(Debug, Clone)]
pub struct ManuscriptInput {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ManuscriptInput {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { file_name, bytes })
    }

    /// Lowercased extension after the last dot, empty when there is none.
    pub fn extension(&self) -> String {
        match self.file_name.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => String::new(),
        }
    }
}

/// Counts the manuscript file itself cannot provide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManuscriptMetrics {
    /// Number of figure files uploaded alongside the manuscript
    pub figure_uploads: Option<usize>,
    /// Number of references, when the caller knows it
    pub reference_count: Option<u64>,
}

/// Progress notification: a stage label and a completion fraction in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisProgress {
    pub stage: String,
    pub fraction: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_with_display_names() {
        let json = serde_json::to_string(&Category::SignificanceStatement).unwrap();
        assert_eq!(json, "\"Significance Statement\"");
        let back: Category = serde_json::from_str("\"Methods\"").unwrap();
        assert_eq!(back, Category::Methods);
    }

    #[test]
    fn extension_is_lowercased_and_taken_after_last_dot() {
        assert_eq!(ManuscriptInput::new("Paper.v2.DOCX", vec![]).extension(), "docx");
        assert_eq!(ManuscriptInput::new("README", vec![]).extension(), "");
    }

    #[test]
    fn manuscript_totals_are_derived() {
        let sections = vec![
            Section {
                title: "Results".into(),
                word_count: 10,
                category: Category::Results,
            },
            Section {
                title: "More results".into(),
                word_count: 5,
                category: Category::Results,
            },
            Section {
                title: "Acknowledgements".into(),
                word_count: 3,
                category: Category::Other,
            },
        ];
        let manuscript = ParsedManuscript::new("m.md", sections, "See Figure 1.".into());
        assert_eq!(manuscript.total_words, 18);
        assert_eq!(manuscript.figure_reference_count, 1);
        assert_eq!(manuscript.words_by_category()[&Category::Results], 15);
        assert!(!manuscript.present_categories().contains(&Category::Other));
    }
}
