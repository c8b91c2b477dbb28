//! Air quality data models
//!
//! Payloads returned by the provider are kept as opaque JSON documents in the
//! cache. This module reads the fields consumers care about defensively and
//! maps AQI values onto the standard severity scale.

pub mod waqi;

pub use waqi::{WaqiClient, WaqiError};

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Placeholder for a missing dominant pollutant
const UNKNOWN_POLLUTANT: &str = "N/A";

/// Fields of an AQI payload used for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AqiReading {
    /// Air Quality Index, 0 when missing or not a number
    pub aqi: i64,
    /// Dominant pollutant code (e.g. "pm25")
    pub dominant_pollutant: String,
    /// Individual pollutant readings keyed by pollutant code
    pub iaqi: BTreeMap<String, f64>,
}

impl AqiReading {
    /// Reads the reporting fields from a payload
    ///
    /// Absent or malformed fields fall back to defaults rather than failing.
    /// WAQI reports `"-"` for stations without a current reading, which is
    /// treated as 0.
    pub fn from_payload(payload: &Value) -> Self {
        let aqi = payload
            .get("aqi")
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f.round() as i64)))
            .unwrap_or(0);

        let dominant_pollutant = payload
            .get("dominentpol")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_POLLUTANT)
            .to_string();

        let iaqi: BTreeMap<String, f64> = payload
            .get("iaqi")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(code, reading)| {
                        let value = reading.get("v").and_then(Value::as_f64)?;
                        Some((code.clone(), value))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            aqi,
            dominant_pollutant,
            iaqi,
        }
    }

    /// Severity level of this reading
    pub fn level(&self) -> AqiLevel {
        AqiLevel::from_aqi(self.aqi)
    }
}

/// US EPA AQI severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum AqiLevel {
    /// 0-50
    Good,
    /// 51-100
    Moderate,
    /// 101-150
    UnhealthyForSensitiveGroups,
    /// 151-200
    Unhealthy,
    /// 201-300
    VeryUnhealthy,
    /// Above 300
    Hazardous,
}

impl AqiLevel {
    /// Maps an AQI value onto its level
    pub fn from_aqi(aqi: i64) -> Self {
        match aqi {
            i64::MIN..=50 => AqiLevel::Good,
            51..=100 => AqiLevel::Moderate,
            101..=150 => AqiLevel::UnhealthyForSensitiveGroups,
            151..=200 => AqiLevel::Unhealthy,
            201..=300 => AqiLevel::VeryUnhealthy,
            _ => AqiLevel::Hazardous,
        }
    }

    /// Human-readable category name
    pub fn label(&self) -> &'static str {
        match self {
            AqiLevel::Good => "Good",
            AqiLevel::Moderate => "Moderate",
            AqiLevel::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiLevel::Unhealthy => "Unhealthy",
            AqiLevel::VeryUnhealthy => "Very Unhealthy",
            AqiLevel::Hazardous => "Hazardous",
        }
    }

    /// Marker color name
    pub fn color(&self) -> &'static str {
        match self {
            AqiLevel::Good => "blue",
            AqiLevel::Moderate => "green",
            AqiLevel::UnhealthyForSensitiveGroups => "yellow",
            AqiLevel::Unhealthy => "orange",
            AqiLevel::VeryUnhealthy => "red",
            AqiLevel::Hazardous => "purple",
        }
    }

    /// Colored circle emoji
    pub fn emoji(&self) -> &'static str {
        match self {
            AqiLevel::Good => "🔵",
            AqiLevel::Moderate => "🟢",
            AqiLevel::UnhealthyForSensitiveGroups => "🟡",
            AqiLevel::Unhealthy => "🟠",
            AqiLevel::VeryUnhealthy => "🔴",
            AqiLevel::Hazardous => "🟣",
        }
    }
}
