//! Location source backed by GeoNames exports
//!
//! Reads the tab-separated GeoNames country dump (no header, 19 columns) and
//! the feature-code description table.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

/// Number of columns in a GeoNames dump row
const GEONAMES_COLUMNS: usize = 19;

/// Column indices in a GeoNames dump row
const COL_NAME: usize = 1;
const COL_LATITUDE: usize = 4;
const COL_LONGITUDE: usize = 5;
const COL_FEATURE_CLASS: usize = 6;
const COL_FEATURE_CODE: usize = 7;
const COL_POPULATION: usize = 14;

/// Description used when a feature code is not in the table
pub const UNKNOWN_FEATURE: &str = "Unknown feature code";

/// Errors that can occur when reading the location file
#[derive(Debug, Error)]
pub enum LocationError {
    /// File could not be read
    #[error("Failed to read location file: {0}")]
    Io(#[from] std::io::Error),

    /// A row could not be parsed
    #[error("Malformed row {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// A named place to query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    /// Place name
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// GeoNames feature class (e.g. "P")
    pub feature_class: String,
    /// GeoNames feature code (e.g. "PPL")
    pub feature_code: String,
    /// Population count
    pub population: u64,
}

/// Reads locations with population above `population_threshold`
///
/// Rows without a feature class are dropped. Malformed rows are skipped with
/// a warning; file order is preserved.
pub fn read_locations(
    path: &Path,
    population_threshold: u64,
) -> Result<Vec<Location>, LocationError> {
    let content = fs::read_to_string(path)?;
    let mut total = 0usize;
    let mut locations = Vec::new();

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        total += 1;

        match parse_row(index + 1, line) {
            Ok(location) => {
                if location.population > population_threshold
                    && !location.feature_class.is_empty()
                {
                    locations.push(location);
                }
            }
            Err(e) => tracing::warn!(path = %path.display(), "Skipping row: {}", e),
        }
    }

    tracing::info!(rows = total, path = %path.display(), "Loaded location rows");
    tracing::info!(
        "Filtered down to {} locations with population > {}",
        locations.len(),
        population_threshold
    );
    Ok(locations)
}

/// Parses one GeoNames row
fn parse_row(line: usize, row: &str) -> Result<Location, LocationError> {
    let fields: Vec<&str> = row.split('\t').collect();
    if fields.len() < GEONAMES_COLUMNS {
        return Err(LocationError::Malformed {
            line,
            reason: format!("expected {} columns, found {}", GEONAMES_COLUMNS, fields.len()),
        });
    }

    let number = |col: usize, what: &str| -> Result<f64, LocationError> {
        fields[col]
            .trim()
            .parse::<f64>()
            .map_err(|e| LocationError::Malformed {
                line,
                reason: format!("invalid {} '{}': {}", what, fields[col], e),
            })
    };

    let latitude = number(COL_LATITUDE, "latitude")?;
    let longitude = number(COL_LONGITUDE, "longitude")?;
    let population = fields[COL_POPULATION]
        .trim()
        .parse::<u64>()
        .map_err(|e| LocationError::Malformed {
            line,
            reason: format!("invalid population '{}': {}", fields[COL_POPULATION], e),
        })?;

    Ok(Location {
        name: fields[COL_NAME].trim().to_string(),
        latitude,
        longitude,
        feature_class: fields[COL_FEATURE_CLASS].trim().to_string(),
        feature_code: fields[COL_FEATURE_CODE].trim().to_string(),
        population,
    })
}

/// Loads feature-code descriptions keyed by `"{class}.{code}"`
///
/// Expects a tab-separated file with a header row naming `Code` and
/// `Description` columns. Returns an empty map if the file is missing or
/// unreadable.
pub fn load_feature_codes(path: &Path) -> HashMap<String, String> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %path.display(), "Feature codes file not loaded: {}", e);
            return HashMap::new();
        }
    };

    let mut lines = content.lines();
    let Some(header) = lines.next() else {
        return HashMap::new();
    };
    let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
    let code_col = columns.iter().position(|c| *c == "Code");
    let desc_col = columns.iter().position(|c| *c == "Description");

    let (Some(code_col), Some(desc_col)) = (code_col, desc_col) else {
        tracing::error!(
            path = %path.display(),
            "Feature codes file has no Code/Description header"
        );
        return HashMap::new();
    };

    let codes: HashMap<String, String> = lines
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            let code = fields.get(code_col)?.trim();
            if code.is_empty() {
                return None;
            }
            let description = fields.get(desc_col).map(|d| d.trim()).unwrap_or_default();
            Some((code.to_string(), description.to_string()))
        })
        .collect();

    tracing::info!("Loaded {} feature codes", codes.len());
    codes
}

/// Looks up the description of a feature class/code pair
pub fn feature_description<'a>(
    feature_class: &str,
    feature_code: &str,
    feature_codes: &'a HashMap<String, String>,
) -> &'a str {
    feature_codes
        .get(&format!("{}.{}", feature_class, feature_code))
        .map(String::as_str)
        .unwrap_or(UNKNOWN_FEATURE)
}
