//! Cache-aware AQI lookups
//!
//! `AqiFetcher` resolves one coordinate pair at a time against the cache:
//!
//! | State       | Condition                         | Action                 |
//! |-------------|-----------------------------------|------------------------|
//! | Legacy hit  | entry without timestamp           | migrate, no request    |
//! | Fresh hit   | record younger than the TTL       | serve stored payload   |
//! | Stale hit   | record at least as old as the TTL | refetch                |
//! | Miss        | no entry                          | fetch                  |
//!
//! A failed fetch leaves the cache untouched and yields
//! [`FetchResult::Unavailable`]; the caller skips that location.

use std::time::Duration;

use chrono::Utc;
use serde_json::Value;

use crate::cache::{self, Cache, CacheEntry, CacheKey, CacheRecord};
use crate::data::{WaqiClient, WaqiError};

/// Maximum age of a cached record before it is refreshed (4 hours)
pub const CACHE_TTL_SECONDS: f64 = 4.0 * 3600.0;

/// Pause after each successful request
pub const DEFAULT_FETCH_DELAY: Duration = Duration::from_millis(250);

/// Outcome of resolving one location
#[derive(Debug)]
pub enum FetchResult {
    /// Payload served from the cache or fetched from the API
    Available(Value),
    /// No data for this location
    Unavailable(WaqiError),
}

impl FetchResult {
    /// Returns the payload, if any
    pub fn payload(&self) -> Option<&Value> {
        match self {
            FetchResult::Available(payload) => Some(payload),
            FetchResult::Unavailable(_) => None,
        }
    }

    /// Converts into the payload, discarding the failure reason
    pub fn into_payload(self) -> Option<Value> {
        match self {
            FetchResult::Available(payload) => Some(payload),
            FetchResult::Unavailable(_) => None,
        }
    }
}

/// Cache state of a key at lookup time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LookupState {
    /// Entry stored without a timestamp
    LegacyHit,
    /// Record younger than the TTL; carries its age in seconds
    FreshHit(f64),
    /// Record older than the TTL; carries its age in seconds
    StaleHit(f64),
    /// No entry for the key
    Miss,
}

/// Decides how a lookup of `key` at time `now` must be served
pub fn lookup_state(cache: &Cache, key: &CacheKey, now: f64) -> LookupState {
    match cache.get(key) {
        None => LookupState::Miss,
        Some(CacheEntry::Legacy(_)) => LookupState::LegacyHit,
        Some(CacheEntry::Current(record)) => {
            let age = record.age_secs(now);
            if age < CACHE_TTL_SECONDS {
                LookupState::FreshHit(age)
            } else {
                LookupState::StaleHit(age)
            }
        }
    }
}

/// Current time as epoch seconds
pub fn now_epoch_secs() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Resolves AQI payloads through the cache, fetching when needed
#[derive(Debug, Clone)]
pub struct AqiFetcher {
    /// API client used on misses and stale hits
    client: WaqiClient,
    /// Pause after each successful request
    delay: Duration,
}

impl AqiFetcher {
    /// Creates a fetcher with the default politeness delay
    pub fn new(client: WaqiClient) -> Self {
        Self {
            client,
            delay: DEFAULT_FETCH_DELAY,
        }
    }

    /// Sets the pause after each successful request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Resolves the payload for a location at the current time
    pub async fn lookup(&self, cache: &mut Cache, lat: f64, lon: f64) -> FetchResult {
        self.lookup_at(cache, lat, lon, now_epoch_secs()).await
    }

    /// Resolves the payload for a location as of `now` (epoch seconds)
    pub async fn lookup_at(&self, cache: &mut Cache, lat: f64, lon: f64, now: f64) -> FetchResult {
        let key = CacheKey::from_coords(lat, lon);

        match lookup_state(cache, &key, now) {
            LookupState::LegacyHit => {
                if let Some(payload) = cache::migrate(cache, &key, now) {
                    tracing::info!(key = %key, "Migrated old cache format");
                    return FetchResult::Available(payload);
                }
            }
            LookupState::FreshHit(age) => {
                if let Some(entry) = cache.get(&key) {
                    tracing::info!(
                        key = %key,
                        "Using cached AQI data (age: {:.1} min)",
                        age / 60.0
                    );
                    return FetchResult::Available(entry.payload().clone());
                }
            }
            LookupState::StaleHit(age) => {
                tracing::info!(
                    key = %key,
                    "Cache expired (age: {:.1} min), refreshing",
                    age / 60.0
                );
            }
            LookupState::Miss => {}
        }

        self.refetch(cache, key, lat, lon, now).await
    }

    /// Fetches from the API and stores the payload on success
    async fn refetch(
        &self,
        cache: &mut Cache,
        key: CacheKey,
        lat: f64,
        lon: f64,
        now: f64,
    ) -> FetchResult {
        tracing::info!(key = %key, "Fetching AQI data from API");

        match self.client.fetch_feed(lat, lon).await {
            Ok(payload) => {
                cache.insert(
                    key,
                    CacheEntry::Current(CacheRecord::new(now, payload.clone())),
                );
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                FetchResult::Available(payload)
            }
            Err(e @ WaqiError::Status(_)) | Err(e @ WaqiError::MissingData) => {
                tracing::warn!(key = %key, "{}", e);
                FetchResult::Unavailable(e)
            }
            Err(e) => {
                tracing::error!(key = %key, "Request failed: {}", e);
                FetchResult::Unavailable(e)
            }
        }
    }
}
