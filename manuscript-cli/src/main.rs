use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

// Import from manuscript-core
use manuscript_core::compliance::{ComplianceReport, ComplianceStatus};
use manuscript_core::export::{
    build_analysis_export, export_file_name, guideline_template, render_checklist_markdown,
};
use manuscript_core::figures::{inspect_figures, FigureFile};
use manuscript_core::guidelines::{GuidelineRepository, LoadedGuidelines};
use manuscript_core::session::Completion;
use manuscript_core::{
    screen_guidelines, AnalysisProgress, AnalyzerConfig, BackgroundAnalyzer, ManuscriptAnalyzer,
    ManuscriptInput, ParsedManuscript, Session,
};

// Import CLI utilities
use manuscript_fit::{logging, DataDirs};

#[derive(Parser)]
#[command(name = "manuscript-fit")]
#[command(about = "Check a manuscript's sections and word counts against journal guidelines")]
struct Args {
    /// Path to custom config file (YAML format)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Guideline source: JSON file path or http(s) URL (overrides config)
    #[arg(short, long, global = true)]
    guidelines: Option<String>,

    /// Skip the guideline cache and always fetch fresh
    #[arg(long, global = true)]
    no_cache: bool,

    /// Debug-level logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable detailed profiling of analysis steps
    #[arg(long, global = true)]
    profile: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a manuscript and optionally check it against one guideline
    Analyze(AnalyzeArgs),
    /// Check a manuscript against every known guideline
    Screen {
        /// Manuscript file (.docx, .md, .markdown, .txt)
        file: PathBuf,
    },
    /// List journals and article types
    Journals {
        /// Case-insensitive substring filter on "journal article type"
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Validate the guideline source structure
    Validate,
    /// Print the checklist items a guideline states
    Template {
        #[arg(short, long)]
        journal: String,
        #[arg(short, long)]
        article_type: Option<String>,
    },
}

#[derive(ClapArgs)]
struct AnalyzeArgs {
    /// Manuscript file (.docx, .md, .markdown, .txt)
    file: PathBuf,

    /// Journal to evaluate against
    #[arg(short, long)]
    journal: Option<String>,

    /// Article type within the journal (first match if omitted)
    #[arg(short, long, requires = "journal")]
    article_type: Option<String>,

    /// Figure files to count and inspect
    #[arg(long, num_args = 1..)]
    figures: Vec<PathBuf>,

    /// Write the Markdown checklist here (requires --journal)
    #[arg(long, requires = "journal")]
    markdown: Option<PathBuf>,

    /// Write the JSON analysis export here (a directory gets a generated file name)
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    println!("📚 Manuscript Fit");

    let config = load_config(&args);

    match &args.command {
        Command::Analyze(analyze) => run_analyze(analyze, &config),
        Command::Screen { file } => run_screen(file, &config),
        Command::Journals { filter } => run_journals(filter.as_deref(), &config),
        Command::Validate => run_validate(&config),
        Command::Template {
            journal,
            article_type,
        } => run_template(journal, article_type.as_deref(), &config),
    }
}

/// Config file (or defaults) with command-line overrides applied.
fn load_config(args: &Args) -> AnalyzerConfig {
    let mut config = AnalyzerConfig::load_with_fallback(args.config.as_deref());

    if let Some(config_path) = &args.config {
        println!("📋 Loaded config from: {}", config_path.display());
    } else {
        println!("📋 Using default config");
    }

    if let Some(source) = &args.guidelines {
        config.guidelines.source = source.clone();
    }
    if args.no_cache {
        config.guidelines.use_cache = false;
    }
    if args.profile {
        config.profile = true;
    }
    config
}

fn open_repository(config: &AnalyzerConfig) -> Result<GuidelineRepository> {
    let cache_dir = if config.guidelines.use_cache {
        match DataDirs::new().and_then(|dirs| dirs.ensure_cache_dir()) {
            Ok(dir) => Some(dir),
            Err(e) => {
                warn!("Guideline cache disabled: {e:#}");
                None
            }
        }
    } else {
        None
    };

    GuidelineRepository::from_config(&config.guidelines, cache_dir.as_deref())
        .context("Failed to set up guideline source")
}

fn load_guidelines(config: &AnalyzerConfig) -> Result<LoadedGuidelines> {
    let repository = open_repository(config)?;
    let loaded = repository
        .load()
        .with_context(|| format!("Failed to load guidelines from {}", repository.source_description()))?;

    if !loaded.validation.is_success() {
        println!("⚠️  {}", loaded.validation.message);
    }
    Ok(loaded)
}

/// Parse `path` on a background worker, applying the result through a session.
fn analyze_into_session(path: &Path, config: &AnalyzerConfig, session: &mut Session) -> Result<()> {
    let input = ManuscriptInput::from_path(path)
        .with_context(|| format!("Failed to read manuscript: {}", path.display()))?;
    println!("📄 Processing: {}", path.display());

    let mut background = BackgroundAnalyzer::new(ManuscriptAnalyzer::from_config(config));
    let request = session.begin_analysis();
    let handle = background.submit(
        input,
        Some(Arc::new(|p: AnalysisProgress| {
            debug!("{:>3.0}% {}", p.fraction * 100.0, p.stage);
        })),
    );

    match session.complete_analysis(request, handle.wait()) {
        Completion::Applied => Ok(()),
        Completion::Failed(e) => {
            eprintln!("❌ Processing failed: {e}");
            std::process::exit(1);
        }
        Completion::Cancelled | Completion::Stale => {
            eprintln!("⚠️  Analysis was superseded before it finished");
            std::process::exit(1);
        }
    }
}

fn run_analyze(analyze: &AnalyzeArgs, config: &AnalyzerConfig) -> Result<()> {
    let mut session = Session::new();
    analyze_into_session(&analyze.file, config, &mut session)?;

    if !analyze.figures.is_empty() {
        let files = analyze
            .figures
            .iter()
            .map(|p| FigureFile::from_path(p).with_context(|| format!("Failed to read figure: {}", p.display())))
            .collect::<Result<Vec<_>>>()?;
        print_figure_inspection(&files, config);
        session.set_figure_uploads(Some(files.len()));
    }

    if let Some(journal) = &analyze.journal {
        let loaded = load_guidelines(config)?;
        let guideline = loaded
            .guidelines
            .find(journal, analyze.article_type.as_deref())?
            .clone();
        session.select_guideline(Some(guideline));
    }

    let Some(manuscript) = session.manuscript() else {
        return Ok(());
    };
    print_manuscript(manuscript);

    let report = session.report();
    if let (Some(report), Some(guideline)) = (&report, session.guideline()) {
        println!("\n🎯 Guideline: {}", guideline.display_name());
        print_report(report);
    }

    let metrics = session.metrics();
    if let (Some(path), Some(report), Some(guideline)) = (&analyze.markdown, &report, session.guideline()) {
        let markdown = render_checklist_markdown(report, manuscript, guideline, &metrics);
        std::fs::write(path, markdown)
            .with_context(|| format!("Failed to write checklist: {}", path.display()))?;
        println!("💾 Checklist saved to: {}", path.display());
    }

    if let Some(path) = &analyze.json {
        let now = chrono::Utc::now();
        let export = build_analysis_export(manuscript, session.guideline(), report.as_ref(), &metrics, now);
        let path = if path.is_dir() {
            path.join(export_file_name(session.guideline(), now))
        } else {
            path.clone()
        };
        std::fs::write(&path, export.to_json_pretty()?)
            .with_context(|| format!("Failed to write export: {}", path.display()))?;
        println!("💾 Analysis export saved to: {}", path.display());
    }

    Ok(())
}

fn run_screen(file: &Path, config: &AnalyzerConfig) -> Result<()> {
    let mut session = Session::new();
    analyze_into_session(file, config, &mut session)?;
    let Some(manuscript) = session.manuscript() else {
        return Ok(());
    };
    print_manuscript(manuscript);

    let loaded = load_guidelines(config)?;
    let result = screen_guidelines(manuscript, &loaded.guidelines);

    println!("\n✅ Fits as-is ({}):", result.accepted.len());
    for name in &result.accepted {
        println!("   - {name}");
    }
    println!("\n✏️  Needs changes ({}):", result.required_changes.len());
    for entry in &result.required_changes {
        println!("   - {}", entry.guideline);
        for change in &entry.changes {
            println!("       • {change}");
        }
    }
    Ok(())
}

fn run_journals(filter: Option<&str>, config: &AnalyzerConfig) -> Result<()> {
    let loaded = load_guidelines(config)?;

    match filter {
        Some(query) => {
            let matches = loaded.guidelines.filter(query);
            println!("🔎 {} match(es) for \"{}\":", matches.len(), query);
            for guideline in matches {
                println!("   - {}", guideline.display_name());
            }
        }
        None => {
            println!("📖 {} guideline(s):", loaded.guidelines.len());
            for (journal, types) in loaded.guidelines.grouped_by_journal() {
                println!("   {journal}");
                for article_type in types {
                    println!("     - {article_type}");
                }
            }
        }
    }
    Ok(())
}

fn run_validate(config: &AnalyzerConfig) -> Result<()> {
    let repository = open_repository(config)?;
    let report = repository
        .validate()
        .with_context(|| format!("Failed to fetch guidelines from {}", repository.source_description()))?;

    if report.is_success() {
        println!("✅ {}", report.message);
        return Ok(());
    }

    println!("❌ {}", report.message);
    for detail in &report.details {
        println!("   - {detail}");
    }
    std::process::exit(1);
}

fn run_template(
    journal: &str,
    article_type: Option<&str>,
    config: &AnalyzerConfig,
) -> Result<()> {
    let loaded = load_guidelines(config)?;
    let guideline = loaded.guidelines.find(journal, article_type)?;

    println!("📝 {}", guideline.display_name());
    let items = guideline_template(guideline);
    if items.is_empty() {
        println!("   (no stated requirements)");
    }
    for item in items {
        println!("   [ ] {item}");
    }
    Ok(())
}

fn print_manuscript(manuscript: &ParsedManuscript) {
    println!("✅ Successfully analyzed {}", manuscript.file_name);
    println!("📊 Sections ({}):", manuscript.sections.len());
    for (i, section) in manuscript.sections.iter().enumerate() {
        println!(
            "   {:>2}. {:<40} {:>6} words  [{}]",
            i + 1,
            section.title,
            section.word_count,
            section.category
        );
    }
    println!("   - Total words: {}", manuscript.total_words);
    println!("   - Figure references: {}", manuscript.figure_reference_count);
}

fn print_figure_inspection(files: &[FigureFile], config: &AnalyzerConfig) {
    println!("🖼️  Figures ({}):", files.len());
    for inspection in inspect_figures(files, &config.figures) {
        if inspection.is_acceptable() {
            println!("   ✅ {} ({:.1} MB)", inspection.name, inspection.size_mb);
        } else {
            println!("   ⚠️  {}: {}", inspection.name, inspection.issues.join(" "));
        }
    }
}

fn status_icon(status: ComplianceStatus) -> &'static str {
    match status {
        ComplianceStatus::Ok => "✅",
        ComplianceStatus::Warning => "⚠️ ",
        ComplianceStatus::Over => "❌",
        ComplianceStatus::Na => "➖",
    }
}

fn print_report(report: &ComplianceReport) {
    println!("📏 Constraints:");
    for constraint in &report.constraints {
        println!(
            "   {} {}: {} ({})",
            status_icon(constraint.status.status),
            constraint.label,
            constraint.detail,
            constraint.status.label
        );
    }

    let budget_header = if report.has_section_limits() { "limit" } else { "expected" };
    println!("📑 Expected sections (actual / {budget_header}):");
    for detail in &report.section_details {
        let budget = detail
            .limit
            .or(detail.expected)
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   - {:<24} {:>6} / {:<6} ratio {}",
            detail.category.label(),
            detail.actual,
            budget,
            detail.ratio
        );
    }

    if report.is_compliant() {
        println!("🎉 No required changes");
    } else {
        println!("✏️  Required changes:");
        for change in &report.violations {
            println!("   - {change}");
        }
    }
}
