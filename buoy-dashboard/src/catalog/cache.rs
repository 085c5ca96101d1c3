//! Disk cache for the station catalog.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::domain::Station;

use super::error::FetchError;

/// Default cache TTL: 24 hours.
const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Persisted catalog snapshot.
#[derive(Debug, Serialize, Deserialize)]
struct CachedCatalog {
    /// Unix timestamp when the cache was written.
    cached_at_secs: u64,
    stations: Vec<Station>,
}

/// Configuration for the catalog disk cache.
#[derive(Debug, Clone)]
pub struct CatalogCacheConfig {
    /// Path to the cache file.
    pub path: PathBuf,
    /// How long a snapshot counts as fresh.
    pub ttl: Duration,
}

impl CatalogCacheConfig {
    /// Create a config with the given path and the default TTL (24 hours).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: DEFAULT_TTL,
        }
    }

    /// Set a custom TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl Default for CatalogCacheConfig {
    fn default() -> Self {
        Self::new("activestations_cache.json")
    }
}

/// Disk cache holding the last successfully fetched catalog.
#[derive(Debug, Clone)]
pub struct CatalogCache {
    config: CatalogCacheConfig,
}

impl CatalogCache {
    pub fn new(config: CatalogCacheConfig) -> Self {
        Self { config }
    }

    /// Load the snapshot if it exists and is younger than the TTL.
    pub fn load(&self) -> Option<Vec<Station>> {
        let cached = self.read()?;
        let age_secs = unix_now()?.saturating_sub(cached.cached_at_secs);
        if age_secs >= self.config.ttl.as_secs() {
            return None;
        }
        Some(cached.stations)
    }

    /// Load the snapshot regardless of its age.
    pub fn load_stale(&self) -> Option<Vec<Station>> {
        self.read().map(|cached| cached.stations)
    }

    fn read(&self) -> Option<CachedCatalog> {
        let contents = std::fs::read_to_string(&self.config.path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    /// Write a snapshot, creating parent directories as needed.
    pub fn save(&self, stations: &[Station]) -> Result<(), FetchError> {
        let cached_at_secs = unix_now().ok_or_else(|| FetchError::Cache {
            message: "system time before unix epoch".to_string(),
        })?;

        let cached = CachedCatalog {
            cached_at_secs,
            stations: stations.to_vec(),
        };

        if let Some(parent) = self.config.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| FetchError::Cache {
                message: format!("failed to create cache directory: {}", e),
            })?;
        }

        let json = serde_json::to_string(&cached).map_err(|e| FetchError::Cache {
            message: format!("failed to serialize cache: {}", e),
        })?;

        std::fs::write(&self.config.path, json).map_err(|e| FetchError::Cache {
            message: format!("failed to write cache file: {}", e),
        })?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }
}

fn unix_now() -> Option<u64> {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs())
}
