use super::evaluate;
use crate::guidelines::Guideline;
use crate::types::ParsedManuscript;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequiredChanges {
    /// "Journal — Article type"
    pub guideline: String,
    pub changes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScreeningResult {
    /// Guidelines the manuscript already satisfies
    pub accepted: Vec<String>,
    pub required_changes: Vec<RequiredChanges>,
}

/// Evaluate one manuscript against many guidelines at once.
pub fn screen_guidelines<'a, I>(manuscript: &ParsedManuscript, guidelines: I) -> ScreeningResult
where
    I: IntoIterator<Item = &'a Guideline>,
{
    let mut result = ScreeningResult::default();
    for guideline in guidelines {
        let report = evaluate(manuscript, guideline);
        if report.is_compliant() {
            result.accepted.push(guideline.display_name());
        } else {
            result.required_changes.push(RequiredChanges {
                guideline: guideline.display_name(),
                changes: report.violations,
            });
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Section};

    #[test]
    fn splits_accepted_from_required_changes() {
        let manuscript = ParsedManuscript::new(
            "m.md",
            vec![
                Section {
                    title: "Introduction".into(),
                    word_count: 800,
                    category: Category::Introduction,
                },
                Section {
                    title: "Results".into(),
                    word_count: 800,
                    category: Category::Results,
                },
            ],
            String::new(),
        );
        let roomy = Guideline {
            word_limit: Some("5000 words".into()),
            structure: Some("Introduction, Results".into()),
            ..Guideline::new("Roomy Journal", "Article")
        };
        let tight = Guideline {
            word_limit: Some("1000 words".into()),
            structure: Some("Introduction, Results".into()),
            ..Guideline::new("Tight Journal", "Letter")
        };

        let result = screen_guidelines(&manuscript, [&roomy, &tight]);
        assert_eq!(result.accepted, vec!["Roomy Journal — Article".to_string()]);
        assert_eq!(result.required_changes.len(), 1);
        assert_eq!(result.required_changes[0].guideline, "Tight Journal — Letter");
        assert_eq!(
            result.required_changes[0].changes,
            vec!["Total word count 1600 exceeds 1000 limit by 600 words".to_string()]
        );
    }
}
