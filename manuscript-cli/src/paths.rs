use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "manuscript-fit";

/// Per-user directories for the guideline cache.
#[derive(Debug, Clone)]
pub struct DataDirs {
    data_dir: PathBuf,
}

impl DataDirs {
    pub fn new() -> Result<Self> {
        let data_dir = Self::get_data_dir()?;
        Ok(Self { data_dir })
    }

    pub fn with_root(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// ~/.local/share/manuscript-fit on Unix, the local app data folder on Windows
    fn get_data_dir() -> Result<PathBuf> {
        #[cfg(windows)]
        {
            let base = dirs::data_local_dir()
                .ok_or_else(|| anyhow!("Could not determine local data directory"))?;
            Ok(base.join(APP_DIR))
        }

        #[cfg(not(windows))]
        {
            let home = dirs::home_dir()
                .ok_or_else(|| anyhow!("Could not determine home directory"))?;
            Ok(home.join(".local").join("share").join(APP_DIR))
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    /// Create the cache directory if needed and return it.
    pub fn ensure_cache_dir(&self) -> Result<PathBuf> {
        let dir = self.cache_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;
        Ok(dir)
    }
}
