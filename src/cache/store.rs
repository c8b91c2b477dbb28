//! Durable storage for the response cache
//!
//! The whole cache lives in a single JSON document mapping keys to entries.
//! Loading never fails: a missing or unreadable file starts an empty cache.
//! Saving overwrites the file wholesale.

use std::collections::btree_map::{self, BTreeMap};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entry::CacheEntry;
use super::key::CacheKey;

/// Errors that can occur when persisting the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Directory creation or file write failed
    #[error("Failed to write cache file: {0}")]
    Io(#[from] std::io::Error),

    /// Cache could not be encoded as JSON
    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// In-memory view of the response cache
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cache {
    entries: BTreeMap<CacheKey, CacheEntry>,
}

impl Cache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry stored at `key`
    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Returns a mutable reference to the entry stored at `key`
    pub fn get_mut(&mut self, key: &CacheKey) -> Option<&mut CacheEntry> {
        self.entries.get_mut(key)
    }

    /// Stores `entry` at `key`, replacing any previous value
    pub fn insert(&mut self, key: CacheKey, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.insert(key, entry)
    }

    /// Whether an entry exists at `key`
    pub fn contains_key(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all entries in key order
    pub fn iter(&self) -> btree_map::Iter<'_, CacheKey, CacheEntry> {
        self.entries.iter()
    }
}

/// Loads the cache from `path`
///
/// Returns an empty cache if the file does not exist or cannot be read or
/// decoded. Failures are logged, never returned.
pub fn load(path: &Path) -> Cache {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(
                path = %path.display(),
                "Cache file not found, starting with an empty cache"
            );
            return Cache::new();
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                "Cache file is unreadable, starting with an empty cache: {}",
                e
            );
            return Cache::new();
        }
    };

    match serde_json::from_str::<Cache>(&content) {
        Ok(cache) => {
            tracing::info!(
                path = %path.display(),
                entries = cache.len(),
                "Loaded AQI cache"
            );
            cache
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                "Cache file is corrupt, starting with an empty cache: {}",
                e
            );
            Cache::new()
        }
    }
}

/// Writes the full cache to `path`, creating missing parent directories
///
/// The previous file content is replaced entirely.
pub fn save(cache: &Cache, path: &Path) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(cache)?;
    fs::write(path, json)?;

    tracing::info!(
        path = %path.display(),
        entries = cache.len(),
        "AQI cache saved"
    );
    Ok(())
}
