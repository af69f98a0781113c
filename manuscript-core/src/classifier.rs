//! Section classification
//!
//! Maps free-text section titles onto the fixed [`Category`] taxonomy using an
//! ordered rule table. The first rule with a matching pattern wins, so more
//! specific categories must stay above looser ones.

use crate::types::*;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// One row of the dispatch table: a category and the patterns that select it.
pub struct SectionRule {
    pub category: Category,
    pub patterns: Vec<Regex>,
}

fn rule(category: Category, patterns: &[&str]) -> SectionRule {
    SectionRule {
        category,
        patterns: patterns
            .iter()
            .map(|p| Regex::new(p).expect("static section pattern"))
            .collect(),
    }
}

// Patterns run against normalized (lowercase, single-spaced) titles.
static SECTION_RULES: LazyLock<Vec<SectionRule>> = LazyLock::new(|| {
    vec![
        rule(Category::Abstract, &[r"\babstract\b"]),
        rule(
            Category::SignificanceStatement,
            &[
                r"\bsignificance statement\b",
                r"\bimpact statement\b",
                r"\bsignificance\b",
            ],
        ),
        rule(Category::Introduction, &[r"\bintroduction\b", r"\bbackground\b"]),
        rule(
            Category::Methods,
            &[
                r"\bmaterials?\s*(?:&|and)\s*methods?\b",
                r"\bmethods?\b",
                r"\bmethodology\b",
                r"\bapproach\b",
            ],
        ),
        rule(Category::Results, &[r"\bresults?\b"]),
        rule(Category::Discussion, &[r"\bdiscussion\b"]),
        rule(Category::Conclusion, &[r"\bconclusions?\b"]),
    ]
});

static LEADING_JUNK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^A-Za-z0-9]+").expect("static pattern"));

static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9&]+").expect("static pattern"));

/// The ordered rule table, most specific category first.
pub fn section_rules() -> &'static [SectionRule] {
    &SECTION_RULES
}

/// Drop leading non-alphanumerics and collapse separators to single spaces, lowercased.
/// Section numbers are kept: `"1. Intro"` becomes `"1 intro"`.
pub fn normalize_section_title(title: &str) -> String {
    let stripped = LEADING_JUNK.replace(title, "");
    let spaced = SEPARATOR_RUN.replace_all(&stripped, " ");
    spaced.to_lowercase().trim().to_string()
}

/// Classify a section title; `Other` when no rule matches.
pub fn classify(title: &str) -> Category {
    let normalized = normalize_section_title(title);
    if normalized.is_empty() {
        return Category::Other;
    }

    section_rules()
        .iter()
        .find(|rule| rule.patterns.iter().any(|p| p.is_match(&normalized)))
        .map(|rule| rule.category)
        .unwrap_or(Category::Other)
}

/// Every category mentioned anywhere in `text`, e.g. a guideline's structure description.
pub fn find_categories_in_text(text: &str) -> BTreeSet<Category> {
    let normalized = normalize_section_title(text);

    section_rules()
        .iter()
        .filter(|rule| rule.patterns.iter().any(|p| p.is_match(&normalized)))
        .map(|rule| rule.category)
        .collect()
}

/// Attach a category to every raw section, keeping document order.
pub fn classify_sections(sections: Vec<RawSection>) -> Vec<Section> {
    sections
        .into_iter()
        .map(|raw| Section {
            category: classify(&raw.title),
            title: raw.title,
            word_count: raw.word_count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalization_strips_leading_punctuation_and_keeps_numbers() {
        assert_eq!(normalize_section_title("1. INTRODUCTION"), "1 introduction");
        assert_eq!(normalize_section_title("  --Materials & Methods:"), "materials & methods");
        assert_eq!(normalize_section_title("***"), "");
    }

    #[test]
    fn classification_is_case_and_punctuation_insensitive() {
        assert_eq!(classify("1. INTRODUCTION"), Category::Introduction);
        assert_eq!(classify("introduction"), Category::Introduction);
        assert_eq!(classify("Introduction:"), Category::Introduction);
    }

    #[test]
    fn known_headings_map_to_categories() {
        assert_eq!(classify("Abstract"), Category::Abstract);
        assert_eq!(classify("Significance Statement"), Category::SignificanceStatement);
        assert_eq!(classify("Impact statement"), Category::SignificanceStatement);
        assert_eq!(classify("Background"), Category::Introduction);
        assert_eq!(classify("Materials and Methods"), Category::Methods);
        assert_eq!(classify("2.1 Methodology"), Category::Methods);
        assert_eq!(classify("Our approach"), Category::Methods);
        assert_eq!(classify("Result"), Category::Results);
        assert_eq!(classify("Discussion"), Category::Discussion);
        assert_eq!(classify("Conclusions"), Category::Conclusion);
        assert_eq!(classify("Acknowledgements"), Category::Other);
        assert_eq!(classify(""), Category::Other);
    }

    #[test]
    fn word_boundaries_prevent_partial_matches() {
        assert_eq!(classify("Insults"), Category::Other);
        assert_eq!(classify("Methodological notes"), Category::Other);
    }

    #[test]
    fn earlier_rules_win() {
        // Mentions both results and discussion; Results comes first in the table.
        assert_eq!(classify("Results and Discussion"), Category::Results);
        assert_eq!(classify("Abstract of methods"), Category::Abstract);
    }

    #[test]
    fn structure_text_yields_all_mentioned_categories() {
        let found = find_categories_in_text("Abstract, Introduction, Methods, Results, Discussion");
        let expected: BTreeSet<Category> = [
            Category::Abstract,
            Category::Introduction,
            Category::Methods,
            Category::Results,
            Category::Discussion,
        ]
        .into_iter()
        .collect();
        assert_eq!(found, expected);
        assert!(find_categories_in_text("No particular structure").is_empty());
    }

    #[test]
    fn rule_order_matches_category_order() {
        let order: Vec<Category> = section_rules().iter().map(|r| r.category).collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
    }

    proptest! {
        #[test]
        fn classify_never_panics_and_is_case_insensitive(title in "\\PC{0,40}") {
            let lower = classify(&title.to_lowercase());
            let upper = classify(&title.to_uppercase());
            // ASCII keywords survive case mapping unchanged
            if title.is_ascii() {
                prop_assert_eq!(lower, upper);
            }
        }

        #[test]
        fn classified_category_is_found_in_text(title in "[A-Za-z0-9 .,:&-]{0,40}") {
            let category = classify(&title);
            if category != Category::Other {
                prop_assert!(find_categories_in_text(&title).contains(&category));
            }
        }
    }
}
