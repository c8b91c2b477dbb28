//! Command-line interface parsing for the AQI map CLI
//!
//! This module handles parsing of CLI arguments using clap and resolves them
//! into a validated [`RunConfig`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use directories::ProjectDirs;
use thiserror::Error;

/// File name of the cache inside the cache directory
const CACHE_FILE_NAME: &str = "aqi_cache.json";

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The delay is negative, not a finite number, or too large
    #[error("Invalid delay: {0}. Expected a non-negative number of seconds")]
    InvalidDelay(f64),

    /// The output file name is empty
    #[error("Output file name must not be empty")]
    EmptyOutputFile,
}

/// AQI map CLI - Collect air quality readings for a list of places
#[derive(Parser, Debug)]
#[command(name = "aqimap")]
#[command(about = "Collect WAQI air quality readings for GeoNames locations, with a persistent cache")]
#[command(version)]
pub struct Cli {
    /// File containing the WAQI API token
    #[arg(long, value_name = "PATH", default_value = "api_key.secret")]
    pub token_file: PathBuf,

    /// WAQI API token (takes precedence over --token-file)
    #[arg(long, env = "WAQI_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Tab-separated file with feature code descriptions
    #[arg(long, value_name = "PATH", default_value = "featureCodes_en.csv")]
    pub feature_codes: PathBuf,

    /// GeoNames tab-separated file with the locations to query
    #[arg(long, value_name = "PATH", default_value = "sk.txt")]
    pub input_file: PathBuf,

    /// JSON file caching API responses [default: ./aqi_cache.json when it
    /// exists, otherwise the user cache dir]
    #[arg(long, value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// Directory for the results export
    #[arg(long, value_name = "DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// File name of the results export (GeoJSON)
    #[arg(long, value_name = "NAME", default_value = "AQI_map_Slovakia.geojson")]
    pub output_file: String,

    /// Only include locations with a population above this value
    #[arg(long, value_name = "N", default_value_t = 1000)]
    pub population_threshold: u64,

    /// Seconds to pause after each successful API request
    #[arg(long, value_name = "SECONDS", default_value_t = 0.25)]
    pub delay: f64,

    /// Log file path
    #[arg(long, value_name = "PATH", default_value = "aqimap.log")]
    pub log_file: PathBuf,
}

/// Settings for one run, derived from CLI arguments
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Token given on the command line or in the environment
    pub token: Option<String>,
    /// Token file to read (or create)
    pub token_file: PathBuf,
    /// Feature code description table
    pub feature_codes: PathBuf,
    /// Location file
    pub input_file: PathBuf,
    /// Durable cache file
    pub cache_file: PathBuf,
    /// Full path of the results export
    pub output_path: PathBuf,
    /// Population filter
    pub population_threshold: u64,
    /// Pause after each successful API request
    pub delay: Duration,
    /// Log file path
    pub log_file: PathBuf,
}

/// Returns the default cache file location
///
/// An existing `aqi_cache.json` in the working directory is used as is, so
/// caches left by earlier versions of the tool are picked up and migrated.
/// Otherwise the XDG cache directory (`~/.cache/aqimap/` on Linux) is used,
/// falling back to the working directory when no home directory is available.
pub fn default_cache_file() -> PathBuf {
    default_cache_file_in(Path::new("."))
}

fn default_cache_file_in(working_dir: &Path) -> PathBuf {
    let local = working_dir.join(CACHE_FILE_NAME);
    if local.is_file() {
        return local;
    }

    ProjectDirs::from("", "", "aqimap")
        .map(|dirs| dirs.cache_dir().join(CACHE_FILE_NAME))
        .unwrap_or(local)
}

impl RunConfig {
    /// Creates a RunConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(RunConfig)` with resolved paths
    /// * `Err(CliError)` if the delay or output file name is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if !cli.delay.is_finite() || cli.delay < 0.0 {
            return Err(CliError::InvalidDelay(cli.delay));
        }
        if cli.output_file.trim().is_empty() {
            return Err(CliError::EmptyOutputFile);
        }

        Ok(RunConfig {
            token: cli.token.clone(),
            token_file: cli.token_file.clone(),
            feature_codes: cli.feature_codes.clone(),
            input_file: cli.input_file.clone(),
            cache_file: cli.cache_file.clone().unwrap_or_else(default_cache_file),
            output_path: cli.output_dir.join(&cli.output_file),
            population_threshold: cli.population_threshold,
            delay: Duration::try_from_secs_f64(cli.delay)
                .map_err(|_| CliError::InvalidDelay(cli.delay))?,
            log_file: cli.log_file.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["aqimap"]);
        assert_eq!(cli.token_file, PathBuf::from("api_key.secret"));
        assert_eq!(cli.input_file, PathBuf::from("sk.txt"));
        assert_eq!(cli.feature_codes, PathBuf::from("featureCodes_en.csv"));
        assert_eq!(cli.output_dir, PathBuf::from("output"));
        assert_eq!(cli.population_threshold, 1000);
        assert!((cli.delay - 0.25).abs() < f64::EPSILON);
        assert!(cli.cache_file.is_none());
    }

    #[test]
    fn test_cli_parse_overrides() {
        let cli = Cli::parse_from([
            "aqimap",
            "--input-file",
            "cz.txt",
            "--cache-file",
            "/tmp/cache.json",
            "--population-threshold",
            "5000",
            "--delay",
            "0",
        ]);
        assert_eq!(cli.input_file, PathBuf::from("cz.txt"));
        assert_eq!(cli.cache_file, Some(PathBuf::from("/tmp/cache.json")));
        assert_eq!(cli.population_threshold, 5000);
        assert_eq!(cli.delay, 0.0);
    }

    #[test]
    fn test_run_config_resolves_output_path() {
        let cli = Cli::parse_from(["aqimap", "--output-dir", "out", "--output-file", "map.geojson"]);
        let config = RunConfig::from_cli(&cli).unwrap();
        assert_eq!(config.output_path, PathBuf::from("out").join("map.geojson"));
    }

    #[test]
    fn test_run_config_explicit_cache_file() {
        let cli = Cli::parse_from(["aqimap", "--cache-file", "aqi_cache.json"]);
        let config = RunConfig::from_cli(&cli).unwrap();
        assert_eq!(config.cache_file, PathBuf::from("aqi_cache.json"));
    }

    #[test]
    fn test_run_config_default_cache_file_name() {
        let cli = Cli::parse_from(["aqimap"]);
        let config = RunConfig::from_cli(&cli).unwrap();
        assert!(config.cache_file.ends_with(CACHE_FILE_NAME));
    }

    #[test]
    fn test_run_config_delay_duration() {
        let cli = Cli::parse_from(["aqimap", "--delay", "1.5"]);
        let config = RunConfig::from_cli(&cli).unwrap();
        assert_eq!(config.delay, Duration::from_millis(1500));
    }

    #[test]
    fn test_run_config_rejects_negative_delay() {
        let cli = Cli::parse_from(["aqimap", "--delay=-1"]);
        let result = RunConfig::from_cli(&cli);
        assert!(matches!(result, Err(CliError::InvalidDelay(_))));
    }

    #[test]
    fn test_run_config_rejects_oversized_delay() {
        let cli = Cli::parse_from(["aqimap", "--delay", "1e20"]);
        let result = RunConfig::from_cli(&cli);
        assert!(matches!(result, Err(CliError::InvalidDelay(d)) if d == 1e20));
    }

    #[test]
    fn test_default_cache_file_prefers_existing_local_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let local = temp_dir.path().join(CACHE_FILE_NAME);
        std::fs::write(&local, "{}").unwrap();

        assert_eq!(default_cache_file_in(temp_dir.path()), local);
    }

    #[test]
    fn test_default_cache_file_without_local_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();

        let path = default_cache_file_in(temp_dir.path());

        assert!(path.ends_with(CACHE_FILE_NAME));
        if ProjectDirs::from("", "", "aqimap").is_some() {
            assert!(!path.starts_with(temp_dir.path()));
        }
    }

    #[test]
    fn test_run_config_rejects_empty_output_file() {
        let cli = Cli::parse_from(["aqimap", "--output-file", ""]);
        let err = RunConfig::from_cli(&cli).unwrap_err();
        assert!(err.to_string().contains("Output file"));
    }
}
