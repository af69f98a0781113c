use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Bumped whenever the on-disk entry layout changes; older entries become misses.
pub const CACHE_VERSION: u32 = 1;

/// One cached guideline payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidelineCacheEntry {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub data: Vec<Value>,
}

impl GuidelineCacheEntry {
    pub fn new(source: &str, data: Vec<Value>) -> Self {
        Self {
            version: CACHE_VERSION,
            timestamp: Utc::now(),
            source: source.to_string(),
            data,
        }
    }

    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return true;
        };
        self.timestamp + ttl >= now
    }
}

/// Compute cache key hash for a source description
pub fn cache_key(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(CACHE_VERSION.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Storage abstraction for the read-through guideline cache.
///
/// `read` returns `None` for anything unusable: missing, corrupt, wrong
/// version or expired entries are all plain misses.
pub trait GuidelineStorage {
    fn read(&self, source: &str, ttl: Duration) -> Option<Vec<Value>>;
    fn write(&self, source: &str, data: &[Value]) -> Result<()>;
    fn clear(&self, source: &str) -> Result<()>;
}

/// File-based storage, one JSON file per source under `cache_dir/guidelines`.
pub struct FileGuidelineCache {
    cache_dir: PathBuf,
}

impl FileGuidelineCache {
    pub fn new(cache_dir: impl AsRef<Path>) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().join("guidelines");
        fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    fn entry_path(&self, source: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", cache_key(source)))
    }

    fn read_entry(&self, path: &Path) -> Option<GuidelineCacheEntry> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str::<GuidelineCacheEntry>(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("⚠️  Ignoring corrupt guideline cache {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl GuidelineStorage for FileGuidelineCache {
    fn read(&self, source: &str, ttl: Duration) -> Option<Vec<Value>> {
        let path = self.entry_path(source);
        let entry = self.read_entry(&path)?;

        if entry.version != CACHE_VERSION {
            debug!("Guideline cache version {} != {}, refetching", entry.version, CACHE_VERSION);
            return None;
        }
        if !entry.is_fresh(ttl, Utc::now()) {
            debug!("Guideline cache for {} expired at {}", source, entry.timestamp);
            return None;
        }

        debug!("💾 Guideline cache hit for {} ({} entries)", source, entry.data.len());
        Some(entry.data)
    }

    fn write(&self, source: &str, data: &[Value]) -> Result<()> {
        let entry = GuidelineCacheEntry::new(source, data.to_vec());
        let json = serde_json::to_string_pretty(&entry)?;
        fs::write(self.entry_path(source), json)?;
        Ok(())
    }

    fn clear(&self, source: &str) -> Result<()> {
        let path = self.entry_path(source);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// No-op storage implementation that disables caching
pub struct NoOpGuidelineCache;

impl Default for NoOpGuidelineCache {
    fn default() -> Self {
        Self::new()
    }
}

impl NoOpGuidelineCache {
    pub fn new() -> Self {
        Self
    }
}

impl GuidelineStorage for NoOpGuidelineCache {
    fn read(&self, _source: &str, _ttl: Duration) -> Option<Vec<Value>> {
        None // Always cache miss
    }

    fn write(&self, _source: &str, _data: &[Value]) -> Result<()> {
        Ok(())
    }

    fn clear(&self, _source: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[test]
    fn cache_key_is_stable_and_distinct() {
        assert_eq!(cache_key("a"), cache_key("a"));
        assert_ne!(cache_key("a"), cache_key("b"));
    }

    #[test]
    fn write_then_read_hits() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileGuidelineCache::new(dir.path()).unwrap();
        let data = vec![json!({"journal": "J", "article_type": "A"})];

        cache.write("src", &data).unwrap();
        assert_eq!(cache.read("src", DAY), Some(data));
        assert_eq!(cache.read("other", DAY), None);

        cache.clear("src").unwrap();
        assert_eq!(cache.read("src", DAY), None);
    }

    #[test]
    fn corrupt_or_old_entries_are_misses() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileGuidelineCache::new(dir.path()).unwrap();

        fs::write(cache.entry_path("src"), "{not json").unwrap();
        assert_eq!(cache.read("src", DAY), None);

        let old_version = json!({
            "version": 0,
            "timestamp": Utc::now(),
            "source": "src",
            "data": []
        });
        fs::write(cache.entry_path("src"), old_version.to_string()).unwrap();
        assert_eq!(cache.read("src", DAY), None);

        let non_array = json!({
            "version": CACHE_VERSION,
            "timestamp": Utc::now(),
            "source": "src",
            "data": {"journal": "J"}
        });
        fs::write(cache.entry_path("src"), non_array.to_string()).unwrap();
        assert_eq!(cache.read("src", DAY), None);
    }

    #[test]
    fn expired_entries_are_misses() {
        let mut entry = GuidelineCacheEntry::new("src", vec![]);
        let now = Utc::now();
        assert!(entry.is_fresh(DAY, now));
        entry.timestamp = now - chrono::Duration::hours(25);
        assert!(!entry.is_fresh(DAY, now));
    }
}
