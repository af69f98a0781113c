use crate::error::{ManuscriptError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Where the guideline JSON array comes from.
pub trait GuidelineSource {
    /// Fetch and parse the payload once. Shape checks happen later.
    fn fetch(&self) -> Result<Value>;

    /// Stable description used in logs and as the cache key.
    fn describe(&self) -> String;
}

/// Guidelines stored in a local JSON file.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GuidelineSource for FileSource {
    fn fetch(&self) -> Result<Value> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Guidelines served over http(s).
#[cfg(feature = "http-source")]
pub struct HttpSource {
    url: String,
    agent: ureq::Agent,
}

#[cfg(feature = "http-source")]
impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

#[cfg(feature = "http-source")]
impl GuidelineSource for HttpSource {
    fn fetch(&self) -> Result<Value> {
        let response = self.agent.get(&self.url).call().map_err(|e| match e {
            ureq::Error::Status(code, _) => ManuscriptError::TransientFetch {
                attempts: 1,
                message: format!("Failed to fetch guidelines (status {code})"),
            },
            other => ManuscriptError::TransientFetch {
                attempts: 1,
                message: other.to_string(),
            },
        })?;

        let body = response.into_string()?;
        Ok(serde_json::from_str(&body)?)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Bounded retry with exponential backoff: `retries` extra attempts,
/// waiting `backoff × 2^attempt` after each failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32, backoff: Duration) -> Self {
        Self { retries, backoff }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

pub fn fetch_with_retry(source: &dyn GuidelineSource, policy: &RetryPolicy) -> Result<Value> {
    let mut attempt = 0u32;
    loop {
        match source.fetch() {
            Ok(value) => {
                debug!("📥 Fetched guidelines from {} (attempt {})", source.describe(), attempt + 1);
                return Ok(value);
            }
            Err(e) if attempt >= policy.retries => {
                return Err(ManuscriptError::TransientFetch {
                    attempts: attempt + 1,
                    message: match e {
                        ManuscriptError::TransientFetch { message, .. } => message,
                        other => other.to_string(),
                    },
                });
            }
            Err(e) => {
                let wait = policy.delay_for(attempt);
                warn!(
                    "⚠️  Guideline fetch from {} failed ({}), retrying in {}ms",
                    source.describe(),
                    e,
                    wait.as_millis()
                );
                std::thread::sleep(wait);
            }
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FlakySource {
        failures: u32,
        calls: Cell<u32>,
    }

    impl GuidelineSource for FlakySource {
        fn fetch(&self) -> Result<Value> {
            let n = self.calls.get();
            self.calls.set(n + 1);
            if n < self.failures {
                Err(ManuscriptError::TransientFetch {
                    attempts: 1,
                    message: "Failed to fetch guidelines (status 503)".into(),
                })
            } else {
                Ok(Value::Array(vec![]))
            }
        }

        fn describe(&self) -> String {
            "flaky".into()
        }
    }

    fn fast(retries: u32) -> RetryPolicy {
        RetryPolicy::new(retries, Duration::ZERO)
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_millis(300));
        assert_eq!(policy.delay_for(0), Duration::from_millis(300));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1200));
    }

    #[test]
    fn retries_until_success() {
        let source = FlakySource {
            failures: 2,
            calls: Cell::new(0),
        };
        assert!(fetch_with_retry(&source, &fast(3)).is_ok());
        assert_eq!(source.calls.get(), 3);
    }

    #[test]
    fn gives_up_after_retries_plus_one_attempts() {
        let source = FlakySource {
            failures: 10,
            calls: Cell::new(0),
        };
        let err = fetch_with_retry(&source, &fast(2)).unwrap_err();
        assert_eq!(source.calls.get(), 3);
        match err {
            ManuscriptError::TransientFetch { attempts, message } => {
                assert_eq!(attempts, 3);
                assert!(message.contains("503"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn file_source_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.json");
        std::fs::write(&path, r#"[{"journal":"J","article_type":"A"}]"#).unwrap();
        let value = FileSource::new(&path).fetch().unwrap();
        assert!(value.is_array());
        assert!(FileSource::new(dir.path().join("missing.json")).fetch().is_err());
    }
}
