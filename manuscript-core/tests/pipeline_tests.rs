//! End-to-end pipeline tests: bytes in, classified manuscript and compliance
//! report out.
//!
//! Word documents are assembled in memory with `zip::ZipWriter`, so there
//! are no binary fixtures to keep in sync.

use manuscript_core::compliance::{evaluate, evaluate_with_metrics, ComplianceStatus};
use manuscript_core::export::render_checklist_markdown;
use manuscript_core::{
    AnalysisOutcome, BackgroundAnalyzer, Category, Guideline, ManuscriptAnalyzer, ManuscriptError,
    ManuscriptInput, ManuscriptMetrics, ParsedManuscript, Section, Session,
};
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

// ============================================================================
// Fixture helpers
// ============================================================================

enum Para<'a> {
    Heading(u32, &'a str),
    Body(&'a str),
}

fn document_xml(paragraphs: &[Para<'_>]) -> String {
    let body: String = paragraphs
        .iter()
        .map(|p| match p {
            Para::Heading(level, text) => format!(
                r#"<w:p><w:pPr><w:pStyle w:val="Heading{level}"/></w:pPr><w:r><w:t>{text}</w:t></w:r></w:p>"#
            ),
            Para::Body(text) => format!(r#"<w:p><w:r><w:t>{text}</w:t></w:r></w:p>"#),
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    )
}

fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(*name, zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn docx(paragraphs: &[Para<'_>]) -> ManuscriptInput {
    let xml = document_xml(paragraphs);
    ManuscriptInput::new(
        "manuscript.docx",
        zip_with(&[("[Content_Types].xml", "<Types/>"), ("word/document.xml", &xml)]),
    )
}

fn words(n: usize) -> String {
    vec!["word"; n].join(" ")
}

fn section(title: &str, word_count: usize, category: Category) -> Section {
    Section {
        title: title.to_string(),
        word_count,
        category,
    }
}

// ============================================================================
// Parsing
// ============================================================================

mod parsing {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nested_docx_headings_yield_sections_in_document_order() {
        let intro = words(12);
        let context = words(7);
        let aims = words(5);
        let input = docx(&[
            Para::Heading(1, "1. Introduction"),
            Para::Body(&intro),
            Para::Heading(2, "Study context"),
            Para::Body(&context),
            Para::Heading(2, "Aims"),
            Para::Body(&aims),
        ]);

        let manuscript = ManuscriptAnalyzer::new().analyze(&input).unwrap();

        let summary: Vec<(&str, usize, Category)> = manuscript
            .sections
            .iter()
            .map(|s| (s.title.as_str(), s.word_count, s.category))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("1. Introduction", 12, Category::Introduction),
                ("Study context", 7, Category::Other),
                ("Aims", 5, Category::Other),
            ]
        );
        assert_eq!(manuscript.total_words, 24);
    }

    #[test]
    fn docx_figure_mentions_stop_at_first_gap() {
        let input = docx(&[
            Para::Heading(1, "Results"),
            Para::Body("Figure 1 shows growth. Figure 2 shows decay. Figure 4 is an appendix."),
        ]);
        let manuscript = ManuscriptAnalyzer::new().analyze(&input).unwrap();
        assert_eq!(manuscript.figure_reference_count, 2);
    }

    #[test]
    fn docx_without_document_part_is_malformed() {
        let input = ManuscriptInput::new("broken.docx", zip_with(&[("word/styles.xml", "<w:styles/>")]));
        let err = ManuscriptAnalyzer::new().analyze(&input).unwrap_err();
        assert!(matches!(err, ManuscriptError::MalformedDocument(_)), "{err:?}");
    }

    #[test]
    fn non_zip_bytes_are_malformed() {
        let input = ManuscriptInput::new("fake.docx", b"plain text pretending".to_vec());
        let err = ManuscriptAnalyzer::new().analyze(&input).unwrap_err();
        assert!(matches!(err, ManuscriptError::MalformedDocument(_)));
    }

    #[test]
    fn unsupported_extension_lists_accepted_formats() {
        let input = ManuscriptInput::new("paper.pdf", b"%PDF".to_vec());
        let err = ManuscriptAnalyzer::new().analyze(&input).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported file type: .pdf. Upload .docx, .txt, or .md/.markdown files."
        );
    }

    #[test]
    fn markdown_and_text_inputs() {
        let md = ManuscriptInput::new(
            "paper.md",
            b"# Abstract\none two three\n## Methods\nfour five\n".to_vec(),
        );
        let manuscript = ManuscriptAnalyzer::new().analyze(&md).unwrap();
        let categories: Vec<Category> = manuscript.sections.iter().map(|s| s.category).collect();
        assert_eq!(categories, vec![Category::Abstract, Category::Methods]);
        assert_eq!(manuscript.total_words, 5);

        let txt = ManuscriptInput::new("notes.txt", b"just some words here".to_vec());
        let manuscript = ManuscriptAnalyzer::new().analyze(&txt).unwrap();
        assert_eq!(manuscript.sections.len(), 1);
        assert_eq!(manuscript.sections[0].title, "notes.txt");
        assert_eq!(manuscript.total_words, 4);
    }

    #[test]
    fn background_analysis_reports_progress_and_resolves() {
        let body = words(30);
        let input = docx(&[Para::Heading(1, "Discussion"), Para::Body(&body)]);
        let stages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&stages);

        let mut background = BackgroundAnalyzer::new(ManuscriptAnalyzer::new());
        let handle = background.submit(
            input,
            Some(Arc::new(move |p: manuscript_core::AnalysisProgress| {
                sink.lock().unwrap().push(p.stage);
            })),
        );

        match handle.wait() {
            AnalysisOutcome::Parsed(manuscript) => assert_eq!(manuscript.total_words, 30),
            other => panic!("unexpected outcome: {other:?}"),
        }
        let stages = stages.lock().unwrap();
        assert_eq!(stages.first().map(String::as_str), Some("Starting analysis"));
        assert_eq!(stages.last().map(String::as_str), Some("Analysis complete"));
    }
}

// ============================================================================
// Compliance scenarios
// ============================================================================

mod compliance {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn over_limit_with_missing_discussion() {
        let manuscript = ParsedManuscript::new(
            "m.docx",
            vec![
                section("Abstract", 150, Category::Abstract),
                section("Introduction", 400, Category::Introduction),
                section("Methods", 600, Category::Methods),
                section("Results", 500, Category::Results),
            ],
            String::new(),
        );
        assert_eq!(manuscript.total_words, 1650);

        let guideline = Guideline {
            word_limit: Some("1500 words".into()),
            structure: Some("abstract, introduction, methods, results, discussion".into()),
            ..Guideline::new("Journal", "Article")
        };
        let report = evaluate(&manuscript, &guideline);

        assert_eq!(report.missing_categories, vec![Category::Discussion]);
        assert_eq!(
            report.violations,
            vec![
                "Add sections covering: Discussion".to_string(),
                "Total word count 1650 exceeds 1500 limit by 150 words".to_string(),
            ]
        );
        assert_eq!(report.constraints[0].status.status, ComplianceStatus::Over);
        // even share: round(1500 / 5)
        assert!(report.section_details.iter().all(|d| d.expected == Some(300)));
    }

    #[test]
    fn pnas_research_report_requires_significance_statement() {
        let manuscript = ParsedManuscript::new(
            "m.docx",
            vec![section("Abstract", 200, Category::Abstract)],
            String::new(),
        );
        let guideline = Guideline {
            significance_statement_limit: Some("120 words".into()),
            ..Guideline::new(
                "Proceedings of the National Academy of Sciences",
                "Research Report",
            )
        };
        let report = evaluate(&manuscript, &guideline);
        assert!(report
            .violations
            .contains(&"Add a Significance Statement (required for PNAS Research Reports)".to_string()));
    }

    #[test]
    fn parsed_docx_flows_into_checklist() {
        let abstract_body = words(120);
        let methods_body = words(300);
        let input = docx(&[
            Para::Heading(1, "Abstract"),
            Para::Body(&abstract_body),
            Para::Heading(1, "Materials and Methods"),
            Para::Body(&methods_body),
            Para::Body("See Figure 1."),
        ]);
        let guideline = Guideline {
            abstract_limit: Some("100 words".into()),
            figure_limit: Some("4 figures".into()),
            structure: Some("Abstract, Methods".into()),
            ..Guideline::new("Journal", "Letter")
        };

        let mut session = Session::new();
        let id = session.begin_analysis();
        let outcome = AnalysisOutcome::from_result(ManuscriptAnalyzer::new().analyze(&input));
        assert!(session.complete_analysis(id, outcome).is_applied());
        session.select_guideline(Some(guideline.clone()));
        session.set_figure_uploads(Some(1));

        let report = session.report().unwrap();
        assert_eq!(
            report.violations,
            vec![
                "Abstract 120/100 words (reduce by 20)".to_string(),
                "Abstract 120/100 words (reduce by 20)".to_string(),
            ]
        );

        let manuscript = session.manuscript().unwrap();
        let metrics = session.metrics();
        let markdown = render_checklist_markdown(&report, manuscript, &guideline, &metrics);
        assert!(markdown.starts_with("# Journal checklist: Journal — Letter\n"));
        assert!(markdown.contains("- Abstract: 120 (120/100 words)"));
        assert!(markdown.contains("- Methods: 303"));
        assert!(markdown.contains("- Under limit: Figures/Tables — 1 of 4 items (4 figures)"));
    }

    #[test]
    fn status_boundaries_through_constraint_tiles() {
        let guideline = Guideline {
            word_limit: Some("1000".into()),
            ..Guideline::new("J", "A")
        };
        let at = |total: usize| {
            let m = ParsedManuscript::new(
                "m.md",
                vec![section("Results", total, Category::Results)],
                String::new(),
            );
            evaluate_with_metrics(&m, &guideline, &ManuscriptMetrics::default()).constraints[0]
                .status
                .status
        };
        assert_eq!(at(900), ComplianceStatus::Warning);
        assert_eq!(at(899), ComplianceStatus::Ok);
        assert_eq!(at(1001), ComplianceStatus::Over);
    }
}
