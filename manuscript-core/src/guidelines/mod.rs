//! Journal guideline records and the repository that loads them.
//!
//! Loading is read-through: cache → source (with retry) → shape check →
//! structural validation → per-entry deserialization → cache write.

pub mod cache;
pub mod source;
pub mod validation;

pub use cache::{FileGuidelineCache, GuidelineStorage, NoOpGuidelineCache};
#[cfg(feature = "http-source")]
pub use source::HttpSource;
pub use source::{fetch_with_retry, FileSource, GuidelineSource, RetryPolicy};
pub use validation::{validate_guidelines, GuidelineSchema, ValidationReport, ValidationStatus};

use crate::config::GuidelineSourceConfig;
use crate::error::{ManuscriptError, Result};
use crate::limits::{parse_numeric_limit, LimitSpec};
use crate::types::Category;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Journal name fragment that turns on the Significance Statement rule.
pub const PNAS_JOURNAL: &str = "Proceedings of the National Academy of Sciences";
pub const RESEARCH_REPORT: &str = "Research Report";

/// Submission constraints for one journal and article type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Guideline {
    #[serde(default, deserialize_with = "lenient_name")]
    pub journal: String,
    #[serde(default, deserialize_with = "lenient_name")]
    pub article_type: String,
    #[serde(default, deserialize_with = "lenient_limit", skip_serializing_if = "Option::is_none")]
    pub title_limit: Option<LimitSpec>,
    #[serde(default, deserialize_with = "lenient_limit", skip_serializing_if = "Option::is_none")]
    pub abstract_limit: Option<LimitSpec>,
    #[serde(default, deserialize_with = "lenient_limit", skip_serializing_if = "Option::is_none")]
    pub word_limit: Option<LimitSpec>,
    #[serde(default, deserialize_with = "lenient_limit", skip_serializing_if = "Option::is_none")]
    pub figure_limit: Option<LimitSpec>,
    #[serde(default, deserialize_with = "lenient_limit", skip_serializing_if = "Option::is_none")]
    pub reference_limit: Option<LimitSpec>,
    /// Free text naming the required sections
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub other_requirements: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<String>,
    #[serde(default, deserialize_with = "lenient_limit", skip_serializing_if = "Option::is_none")]
    pub introduction_limit: Option<LimitSpec>,
    #[serde(default, deserialize_with = "lenient_limit", skip_serializing_if = "Option::is_none")]
    pub methods_limit: Option<LimitSpec>,
    #[serde(default, deserialize_with = "lenient_limit", skip_serializing_if = "Option::is_none")]
    pub results_limit: Option<LimitSpec>,
    #[serde(default, deserialize_with = "lenient_limit", skip_serializing_if = "Option::is_none")]
    pub discussion_limit: Option<LimitSpec>,
    #[serde(default, deserialize_with = "lenient_limit", skip_serializing_if = "Option::is_none")]
    pub conclusion_limit: Option<LimitSpec>,
    #[serde(default, deserialize_with = "lenient_limit", skip_serializing_if = "Option::is_none")]
    pub significance_statement_limit: Option<LimitSpec>,
}

// Oddly typed fields read as "not stated"; validation reports them.

fn lenient_limit<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<LimitSpec>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64().map(LimitSpec::Number),
        Value::String(text) => Some(LimitSpec::Text(text)),
        _ => None,
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(text) => Some(text),
        _ => None,
    })
}

fn lenient_name<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(lenient_text(d)?.unwrap_or_default())
}

impl Guideline {
    pub fn new(journal: impl Into<String>, article_type: impl Into<String>) -> Self {
        Self {
            journal: journal.into(),
            article_type: article_type.into(),
            ..Self::default()
        }
    }

    /// "Journal — Article type"
    pub fn display_name(&self) -> String {
        format!("{} — {}", self.journal, self.article_type)
    }

    pub fn word_limit_value(&self) -> Option<u64> {
        parse_numeric_limit(self.word_limit.as_ref())
    }

    pub fn abstract_limit_value(&self) -> Option<u64> {
        parse_numeric_limit(self.abstract_limit.as_ref())
    }

    pub fn figure_limit_value(&self) -> Option<u64> {
        parse_numeric_limit(self.figure_limit.as_ref())
    }

    pub fn reference_limit_value(&self) -> Option<u64> {
        parse_numeric_limit(self.reference_limit.as_ref())
    }

    /// Raw limit field for a category, if the record has one.
    pub fn category_limit_spec(&self, category: Category) -> Option<&LimitSpec> {
        match category {
            Category::Abstract => self.abstract_limit.as_ref(),
            Category::SignificanceStatement => self.significance_statement_limit.as_ref(),
            Category::Introduction => self.introduction_limit.as_ref(),
            Category::Methods => self.methods_limit.as_ref(),
            Category::Results => self.results_limit.as_ref(),
            Category::Discussion => self.discussion_limit.as_ref(),
            Category::Conclusion => self.conclusion_limit.as_ref(),
            Category::Other => None,
        }
    }

    /// Parsed word limits keyed by category; categories without a usable limit are absent.
    pub fn per_category_limits(&self) -> BTreeMap<Category, u64> {
        [
            Category::Abstract,
            Category::SignificanceStatement,
            Category::Introduction,
            Category::Methods,
            Category::Results,
            Category::Discussion,
            Category::Conclusion,
        ]
        .into_iter()
        .filter_map(|c| parse_numeric_limit(self.category_limit_spec(c)).map(|l| (c, l)))
        .collect()
    }

    /// PNAS Research Reports must carry a Significance Statement.
    pub fn enforces_significance_statement(&self) -> bool {
        self.journal.contains(PNAS_JOURNAL) && self.article_type == RESEARCH_REPORT
    }

    fn matches_query(&self, query: &str) -> bool {
        let haystack = format!("{} {}", self.journal, self.article_type).to_lowercase();
        haystack.contains(query)
    }
}

/// The loaded guideline list, in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GuidelineSet {
    entries: Vec<Guideline>,
}

impl GuidelineSet {
    pub fn new(entries: Vec<Guideline>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Guideline> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Guideline] {
        &self.entries
    }

    /// Case-insensitive exact lookup. Without an article type the journal's first entry wins.
    pub fn find(&self, journal: &str, article_type: Option<&str>) -> Result<&Guideline> {
        let journal_lc = journal.trim().to_lowercase();
        let type_lc = article_type.map(|t| t.trim().to_lowercase());

        self.entries
            .iter()
            .find(|g| {
                g.journal.to_lowercase() == journal_lc
                    && type_lc
                        .as_deref()
                        .map_or(true, |t| g.article_type.to_lowercase() == t)
            })
            .ok_or_else(|| ManuscriptError::GuidelineNotFound {
                journal: journal.to_string(),
                article_type: article_type.unwrap_or("(any)").to_string(),
            })
    }

    /// Entries whose "journal article_type" contains `query`, ignoring case.
    pub fn filter(&self, query: &str) -> Vec<&Guideline> {
        let query = query.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|g| query.is_empty() || g.matches_query(&query))
            .collect()
    }

    /// Journal → article types, both in first-seen order.
    pub fn grouped_by_journal(&self) -> Vec<(String, Vec<String>)> {
        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        for g in &self.entries {
            match groups.iter_mut().find(|(journal, _)| *journal == g.journal) {
                Some((_, types)) => {
                    if !types.contains(&g.article_type) {
                        types.push(g.article_type.clone());
                    }
                }
                None => groups.push((g.journal.clone(), vec![g.article_type.clone()])),
            }
        }
        groups
    }
}

impl<'a> IntoIterator for &'a GuidelineSet {
    type Item = &'a Guideline;
    type IntoIter = std::slice::Iter<'a, Guideline>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[derive(Debug, Clone)]
pub struct LoadedGuidelines {
    pub guidelines: GuidelineSet,
    /// Non-fatal structural findings about the payload
    pub validation: ValidationReport,
    pub from_cache: bool,
}

pub struct GuidelineRepository {
    source: Box<dyn GuidelineSource + Send + Sync>,
    storage: Box<dyn GuidelineStorage + Send + Sync>,
    retry: RetryPolicy,
    ttl: Duration,
    schema: GuidelineSchema,
}

impl GuidelineRepository {
    /// Create repository with full dependency injection
    pub fn new_with_dependencies(
        source: Box<dyn GuidelineSource + Send + Sync>,
        storage: Box<dyn GuidelineStorage + Send + Sync>,
        retry: RetryPolicy,
        ttl: Duration,
    ) -> Self {
        Self {
            source,
            storage,
            retry,
            ttl,
            schema: GuidelineSchema::default(),
        }
    }

    /// Build source and cache from configuration. `cache_dir: None` disables caching.
    pub fn from_config(config: &GuidelineSourceConfig, cache_dir: Option<&Path>) -> Result<Self> {
        let source: Box<dyn GuidelineSource + Send + Sync> = if config.is_remote() {
            remote_source(config)?
        } else {
            Box::new(FileSource::new(&config.source))
        };

        let storage: Box<dyn GuidelineStorage + Send + Sync> = match cache_dir {
            Some(dir) if config.use_cache => Box::new(FileGuidelineCache::new(dir)?),
            _ => Box::new(NoOpGuidelineCache::new()),
        };

        Ok(Self::new_with_dependencies(
            source,
            storage,
            RetryPolicy::new(config.retries, config.backoff()),
            config.cache_ttl(),
        ))
    }

    pub fn with_schema(mut self, schema: GuidelineSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    pub fn load(&self) -> Result<LoadedGuidelines> {
        let description = self.source.describe();

        let (payload, from_cache) = match self.storage.read(&description, self.ttl) {
            Some(data) => (Value::Array(data), true),
            None => (fetch_with_retry(self.source.as_ref(), &self.retry)?, false),
        };

        let Value::Array(raw_entries) = &payload else {
            return Err(ManuscriptError::UnexpectedGuidelineFormat);
        };

        let validation = validate_guidelines(&payload, &self.schema);
        if !validation.is_success() {
            warn!("⚠️  {}", validation.message);
        }

        let mut entries = Vec::with_capacity(raw_entries.len());
        for (index, raw) in raw_entries.iter().enumerate() {
            match serde_json::from_value::<Guideline>(raw.clone()) {
                Ok(guideline) => entries.push(guideline),
                Err(e) => warn!("⚠️  Skipping guideline entry {}: {}", index, e),
            }
        }

        if !from_cache {
            if let Err(e) = self.storage.write(&description, raw_entries) {
                warn!("⚠️  Failed to cache guidelines from {}: {}", description, e);
            }
        }

        info!(
            "📚 Loaded {} guideline(s) from {}{}",
            entries.len(),
            description,
            if from_cache { " (cached)" } else { "" }
        );

        Ok(LoadedGuidelines {
            guidelines: GuidelineSet::new(entries),
            validation,
            from_cache,
        })
    }

    /// Fetch fresh from the source and validate without deserializing or caching.
    pub fn validate(&self) -> Result<ValidationReport> {
        let payload = fetch_with_retry(self.source.as_ref(), &self.retry)?;
        Ok(validate_guidelines(&payload, &self.schema))
    }

    pub fn clear_cache(&self) -> Result<()> {
        self.storage.clear(&self.source.describe())
    }
}

#[cfg(feature = "http-source")]
fn remote_source(config: &GuidelineSourceConfig) -> Result<Box<dyn GuidelineSource + Send + Sync>> {
    Ok(Box::new(HttpSource::new(&config.source, config.request_timeout())))
}

#[cfg(not(feature = "http-source"))]
fn remote_source(config: &GuidelineSourceConfig) -> Result<Box<dyn GuidelineSource + Send + Sync>> {
    Err(ManuscriptError::Io(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        format!("{} needs the http-source feature", config.source),
    )))
}
