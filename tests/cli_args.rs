//! Integration tests for CLI argument handling
//!
//! Runs the binary with flags that exit before any network access.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_aqimap"))
        .args(args)
        .env_remove("WAQI_TOKEN")
        .output()
        .expect("Failed to execute aqimap")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("aqimap"), "Help should mention aqimap");
    assert!(stdout.contains("--cache-file"), "Help should mention --cache-file");
    assert!(stdout.contains("--token-file"), "Help should mention --token-file");
}

#[test]
fn test_version_flag_exits_successfully() {
    let output = run_cli(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("aqimap"));
}

#[test]
fn test_negative_delay_prints_error_and_exits() {
    let output = run_cli(&["--delay=-2"]);
    assert!(!output.status.success(), "Expected negative delay to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Delay") || stderr.contains("delay"),
        "Should print error message about the delay: {}",
        stderr
    );
}

#[test]
fn test_non_numeric_threshold_is_rejected() {
    let output = run_cli(&["--population-threshold", "many"]);
    assert!(!output.status.success());
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use aqimap::cli::{Cli, CliError, RunConfig};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_cli_defaults_resolve_to_run_config() {
        let cli = Cli::parse_from(["aqimap", "--cache-file", "aqi_cache.json"]);
        let config = RunConfig::from_cli(&cli).unwrap();

        assert_eq!(config.cache_file, PathBuf::from("aqi_cache.json"));
        assert_eq!(
            config.output_path,
            PathBuf::from("output").join("AQI_map_Slovakia.geojson")
        );
        assert_eq!(config.population_threshold, 1000);
    }

    #[test]
    fn test_cli_token_flag() {
        let cli = Cli::parse_from(["aqimap", "--token", "abc"]);
        let config = RunConfig::from_cli(&cli).unwrap();
        assert_eq!(config.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_cli_nan_delay_is_invalid() {
        let cli = Cli::parse_from(["aqimap", "--delay", "NaN"]);
        assert!(matches!(
            RunConfig::from_cli(&cli),
            Err(CliError::InvalidDelay(_))
        ));
    }
}
