//! Processing run over all locations
//!
//! Locations are resolved strictly one after another: cache check, optional
//! request, cache write, then the next location. Results are appended to a
//! caller-owned list so that work done before an interruption is kept.

use std::collections::HashMap;

use serde_json::Value;

use crate::cache::Cache;
use crate::data::AqiReading;
use crate::fetcher::{AqiFetcher, FetchResult};
use crate::locations::{feature_description, Location};
use crate::report::Observation;

/// Counters for a processing run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Locations attempted
    pub processed: usize,
    /// Locations that yielded data
    pub available: usize,
    /// Locations skipped for lack of data
    pub unavailable: usize,
}

/// Drives AQI lookups for a list of locations
pub struct App {
    /// Cache-aware fetcher
    fetcher: AqiFetcher,
    /// Feature code descriptions keyed by "class.code"
    feature_codes: HashMap<String, String>,
}

impl App {
    /// Creates a new App
    pub fn new(fetcher: AqiFetcher, feature_codes: HashMap<String, String>) -> Self {
        Self {
            fetcher,
            feature_codes,
        }
    }

    /// Resolves every location in order
    ///
    /// Observations are pushed onto `observations` as soon as they are
    /// available. Locations without data are logged and skipped.
    pub async fn process(
        &self,
        cache: &mut Cache,
        locations: &[Location],
        observations: &mut Vec<Observation>,
    ) -> RunSummary {
        let total = locations.len();
        let mut summary = RunSummary::default();

        for (idx, location) in locations.iter().enumerate() {
            let position = idx + 1;
            let percent = position as f64 / total as f64 * 100.0;
            tracing::info!(
                "[{}/{}] [{:.1}%] Processing: {}",
                position,
                total,
                percent,
                location.name
            );

            summary.processed += 1;
            let result = self
                .fetcher
                .lookup(cache, location.latitude, location.longitude)
                .await;

            match result {
                FetchResult::Available(payload) if !has_data(&payload) => {
                    tracing::debug!(location = %location.name, "Payload is empty");
                    summary.unavailable += 1;
                }
                FetchResult::Available(payload) => {
                    let observation = self.observe(location, AqiReading::from_payload(&payload));
                    observation.log_summary();
                    observations.push(observation);
                    summary.available += 1;
                }
                FetchResult::Unavailable(reason) => {
                    tracing::debug!(location = %location.name, "No data: {}", reason);
                    summary.unavailable += 1;
                }
            }
        }

        summary
    }

    /// Builds the observation for a location
    fn observe(&self, location: &Location, reading: AqiReading) -> Observation {
        Observation {
            location: location.clone(),
            reading,
            feature_description: feature_description(
                &location.feature_class,
                &location.feature_code,
                &self.feature_codes,
            )
            .to_string(),
        }
    }
}

/// Whether a payload carries anything to report
///
/// Legacy entries can hold `null` or an empty document.
fn has_data(payload: &Value) -> bool {
    match payload {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
