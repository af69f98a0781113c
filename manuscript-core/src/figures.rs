//! Figure handling: in-text mention counting and upload inspection.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Counts the gap-free run of "Figure 1", "Figure 2", ... labels in `text`.
///
/// Stops at the first missing number, so "Figure 1 ... Figure 2 ... Figure 4"
/// counts as 2. Figures cited out of sequence are undercounted.
pub fn count_figure_mentions_from_text(text: &str) -> usize {
    let mut count = 0;
    loop {
        let next = count + 1;
        let pattern = format!(r"\b[Ff]igure\s+{next}\b");
        let found = Regex::new(&pattern)
            .map(|re| re.is_match(text))
            .unwrap_or(false);
        if !found {
            break;
        }
        count = next;
    }
    count
}

/// Limits applied to uploaded figure files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FigureInspectionConfig {
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_mime_prefixes")]
    pub accepted_mime_prefixes: Vec<String>,
}

fn default_max_size_mb() -> u64 {
    15
}

fn default_max_concurrent() -> usize {
    4
}

fn default_mime_prefixes() -> Vec<String> {
    vec!["image/".to_string(), "application/pdf".to_string()]
}

impl Default for FigureInspectionConfig {
    fn default() -> Self {
        Self {
            max_size_mb: default_max_size_mb(),
            max_concurrent: default_max_concurrent(),
            accepted_mime_prefixes: default_mime_prefixes(),
        }
    }
}

/// Metadata of one uploaded figure. Contents are never read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: Option<String>,
}

impl FigureFile {
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, metadata.len()))
    }

    /// Declared MIME type, or one guessed from the extension.
    pub fn effective_mime_type(&self) -> String {
        if let Some(mime) = self.mime_type.as_deref().filter(|m| !m.is_empty()) {
            return mime.to_string();
        }
        let extension = self
            .name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        mime_from_extension(&extension).to_string()
    }
}

fn mime_from_extension(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "eps" => "application/postscript",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigureInspection {
    pub name: String,
    pub mime_type: String,
    pub size_mb: f64,
    pub issues: Vec<String>,
}

impl FigureInspection {
    pub fn is_acceptable(&self) -> bool {
        self.issues.is_empty()
    }
}

fn inspect_one(file: &FigureFile, config: &FigureInspectionConfig) -> FigureInspection {
    let mime_type = file.effective_mime_type();
    let size_mb = file.size_bytes as f64 / (1024.0 * 1024.0);
    let mut issues = Vec::new();

    if !config
        .accepted_mime_prefixes
        .iter()
        .any(|prefix| mime_type.starts_with(prefix.as_str()))
    {
        issues.push(format!("Unsupported type ({mime_type}). Use images or PDF."));
    }
    if file.size_bytes > config.max_size_mb.saturating_mul(1024 * 1024) {
        issues.push(format!(
            "Too large ({size_mb:.1} MB, limit {} MB).",
            config.max_size_mb
        ));
    }

    FigureInspection {
        name: file.name.clone(),
        mime_type,
        size_mb,
        issues,
    }
}

/// Check every upload against the type and size limits.
///
/// Work is spread over at most `max_concurrent` scoped threads; the result
/// keeps the input order.
pub fn inspect_figures(
    files: &[FigureFile],
    config: &FigureInspectionConfig,
) -> Vec<FigureInspection> {
    if files.is_empty() {
        return Vec::new();
    }

    let workers = config.max_concurrent.clamp(1, files.len());
    let chunk_size = files.len().div_ceil(workers);
    debug!(
        "Inspecting {} figure(s) on {} worker(s)",
        files.len(),
        workers
    );

    std::thread::scope(|scope| {
        let handles: Vec<_> = files
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|file| inspect_one(file, config))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .zip(files.chunks(chunk_size))
            .flat_map(|(handle, chunk)| {
                // A panicking worker only loses its own chunk; redo it inline.
                handle
                    .join()
                    .unwrap_or_else(|_| chunk.iter().map(|f| inspect_one(f, config)).collect())
            })
            .collect()
    })
}
