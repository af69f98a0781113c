// Manuscript Fit Core Library
//
// Parses manuscripts (.docx, .md, .txt) into classified sections and checks
// them against journal submission guidelines.

pub mod background;
pub mod classifier;
pub mod compliance;
pub mod config;
pub mod error;
pub mod export;
pub mod figures;
pub mod guidelines;
pub mod limits;
pub mod preprocessors;
pub mod processor;
pub mod session;
pub mod types;

// Re-export main types and functions for easy use
pub use types::*;
pub use background::{AnalysisHandle, BackgroundAnalyzer, CancellationToken, ProgressCallback};
pub use classifier::{classify, find_categories_in_text};
pub use compliance::{
    compute_compliance_status, evaluate, evaluate_with_metrics, screen_guidelines,
    ComplianceReport, ComplianceStatus,
};
pub use config::AnalyzerConfig;
pub use error::{ManuscriptError, Result};
pub use export::{build_analysis_export, export_file_name, guideline_template, render_checklist_markdown};
pub use figures::{count_figure_mentions_from_text, inspect_figures, FigureFile};
pub use guidelines::{Guideline, GuidelineRepository, GuidelineSet};
pub use limits::{parse_numeric_limit, LimitSpec};
pub use preprocessors::Preprocessor;
pub use processor::{AnalysisOutcome, ManuscriptAnalyzer};
pub use session::Session;
