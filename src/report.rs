//! Reporting of per-location results
//!
//! Each location that yielded data becomes an [`Observation`]. Observations
//! are logged as they arrive and exported together as a GeoJSON
//! `FeatureCollection` that any map viewer can display.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::data::{AqiLevel, AqiReading};
use crate::locations::Location;

/// Errors that can occur when writing the export
#[derive(Debug, Error)]
pub enum ReportError {
    /// Directory creation or file write failed
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    /// Export could not be encoded as JSON
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// AQI result for one location
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// The location queried
    pub location: Location,
    /// Fields read from the provider payload
    pub reading: AqiReading,
    /// Description of the location's feature code
    pub feature_description: String,
}

impl Observation {
    /// Severity level of the reading
    pub fn level(&self) -> AqiLevel {
        self.reading.level()
    }

    /// Logs a one-line summary of this observation
    pub fn log_summary(&self) {
        let level = self.level();
        tracing::info!(
            "{} {} | AQI={} | Category={} | Dominant={} | Feature={}",
            level.emoji(),
            self.location.name,
            self.reading.aqi,
            level.label(),
            self.reading.dominant_pollutant.to_uppercase(),
            self.feature_description
        );
    }
}

#[derive(Debug, Serialize)]
struct FeatureCollection<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    features: Vec<Feature<'a>>,
}

#[derive(Debug, Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    geometry: Point,
    properties: Properties<'a>,
}

#[derive(Debug, Serialize)]
struct Point {
    #[serde(rename = "type")]
    kind: &'static str,
    /// GeoJSON order: longitude, latitude
    coordinates: [f64; 2],
}

#[derive(Debug, Serialize)]
struct Properties<'a> {
    name: &'a str,
    aqi: i64,
    category: &'static str,
    color: &'static str,
    dominant_pollutant: String,
    feature: &'a str,
    iaqi: &'a BTreeMap<String, f64>,
}

impl<'a> From<&'a Observation> for Feature<'a> {
    fn from(observation: &'a Observation) -> Self {
        let level = observation.level();
        Feature {
            kind: "Feature",
            geometry: Point {
                kind: "Point",
                coordinates: [observation.location.longitude, observation.location.latitude],
            },
            properties: Properties {
                name: &observation.location.name,
                aqi: observation.reading.aqi,
                category: level.label(),
                color: level.color(),
                dominant_pollutant: observation.reading.dominant_pollutant.to_uppercase(),
                feature: &observation.feature_description,
                iaqi: &observation.reading.iaqi,
            },
        }
    }
}

/// Renders observations as a GeoJSON document
pub fn to_geojson(observations: &[Observation]) -> Result<String, ReportError> {
    let collection = FeatureCollection {
        kind: "FeatureCollection",
        features: observations.iter().map(Feature::from).collect(),
    };
    Ok(serde_json::to_string_pretty(&collection)?)
}

/// Writes observations to `path` as GeoJSON, creating parent directories
pub fn write_geojson(observations: &[Observation], path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(path, to_geojson(observations)?)?;
    tracing::info!(
        path = %path.display(),
        features = observations.len(),
        "Results saved"
    );
    Ok(())
}
