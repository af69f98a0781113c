use crate::figures::FigureInspectionConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_source() -> String {
    "journal_guidelines.json".to_string()
}

fn default_cache_ttl_hours() -> u64 {
    24
}

fn default_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_paragraph_batch() -> usize {
    25
}

fn default_line_batch() -> usize {
    50
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub guidelines: GuidelineSourceConfig,
    #[serde(default)]
    pub figures: FigureInspectionConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    /// Log per-stage timings
    #[serde(default)]
    pub profile: bool,
}

/// Where guideline records come from and how they are cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidelineSourceConfig {
    /// Local path or http(s) URL of the JSON array
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,
    /// Extra attempts after the first failed fetch
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Base delay, doubled after every failed attempt
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub use_cache: bool,
}

impl Default for GuidelineSourceConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            cache_ttl_hours: default_cache_ttl_hours(),
            retries: default_retries(),
            backoff_ms: default_backoff_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            use_cache: default_true(),
        }
    }
}

impl GuidelineSourceConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours.saturating_mul(60 * 60))
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn is_remote(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }
}

/// How often parsers check for cancellation and report progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    #[serde(default = "default_paragraph_batch")]
    pub paragraph_batch: usize,
    #[serde(default = "default_line_batch")]
    pub line_batch: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            paragraph_batch: default_paragraph_batch(),
            line_batch: default_line_batch(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: AnalyzerConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    pub fn load_with_fallback(path: Option<&Path>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                warn!("⚠️  Failed to load config from {}, using defaults: {:#}", p.display(), e);
                Self::default()
            }),
            None => Self::default(),
        }
    }
}
