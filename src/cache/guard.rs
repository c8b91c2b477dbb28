//! Scoped ownership of the cache with save-on-drop
//!
//! `PersistentCache` loads the cache when opened and writes it back when it
//! goes out of scope, so every exit path (normal return, `?`, interruption,
//! panic unwinding) persists the work done so far.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use super::store::{self, Cache, CacheError};

/// Owns the in-memory cache for the duration of a run
#[derive(Debug)]
pub struct PersistentCache {
    /// Location of the durable cache file
    path: PathBuf,
    /// In-memory cache
    cache: Cache,
}

impl PersistentCache {
    /// Loads the cache at `path`, starting empty if it is missing or corrupt
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = store::load(&path);
        Self { path, cache }
    }

    /// Path the cache is saved to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saves the cache now, returning any error
    ///
    /// The cache is saved again on drop.
    pub fn flush(&self) -> Result<(), CacheError> {
        store::save(&self.cache, &self.path)
    }
}

impl Deref for PersistentCache {
    type Target = Cache;

    fn deref(&self) -> &Cache {
        &self.cache
    }
}

impl DerefMut for PersistentCache {
    fn deref_mut(&mut self) -> &mut Cache {
        &mut self.cache
    }
}

impl Drop for PersistentCache {
    fn drop(&mut self) {
        if let Err(e) = store::save(&self.cache, &self.path) {
            tracing::error!(
                path = %self.path.display(),
                "Failed to save AQI cache: {}",
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEntry, CacheKey, CacheRecord};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_file_starts_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = PersistentCache::open(temp_dir.path().join("cache.json"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_drop_saves_cache() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("cache.json");

        {
            let mut cache = PersistentCache::open(&path);
            cache.insert(
                CacheKey::from("48.7,19.5"),
                CacheEntry::Current(CacheRecord::new(100.0, json!({"aqi": 42}))),
            );
        }

        let reloaded = store::load(&path);
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.contains_key(&CacheKey::from("48.7,19.5")));
    }

    #[test]
    fn test_drop_saves_during_panic_unwind() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("cache.json");
        let panic_path = path.clone();

        let result = std::panic::catch_unwind(move || {
            let mut cache = PersistentCache::open(&panic_path);
            cache.insert(
                CacheKey::from("1.0,2.0"),
                CacheEntry::Legacy(json!({"aqi": 5})),
            );
            panic!("processing aborted");
        });

        assert!(result.is_err());
        assert!(store::load(&path).contains_key(&CacheKey::from("1.0,2.0")));
    }

    #[test]
    fn test_flush_writes_without_consuming() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("cache.json");

        let mut cache = PersistentCache::open(&path);
        cache.insert(
            CacheKey::from("3.0,4.0"),
            CacheEntry::Legacy(json!({"aqi": 9})),
        );
        cache.flush().expect("Flush should succeed");

        assert!(path.exists());
        assert_eq!(store::load(&path).len(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_drop_with_unwritable_path_does_not_panic() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "file").unwrap();

        let cache = PersistentCache::open(blocker.join("cache.json"));
        drop(cache);
    }
}
