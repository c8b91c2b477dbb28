//! AQI Map CLI - Collect air quality readings for GeoNames locations
//!
//! Reads a list of places, looks up each one through the response cache or
//! the WAQI API, and exports the results as GeoJSON. The cache is saved on
//! every exit path, including Ctrl+C.

use clap::Parser;

use aqimap::app::App;
use aqimap::cache::PersistentCache;
use aqimap::cli::{Cli, RunConfig};
use aqimap::data::WaqiClient;
use aqimap::fetcher::AqiFetcher;
use aqimap::{locations, logging, report, token};

/// Resolves when the user presses Ctrl+C
///
/// Never resolves if the signal handler cannot be installed, so processing
/// is not cut short.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = RunConfig::from_cli(&cli)?;

    // Held until the end of main so the log file is flushed
    let _logging = logging::init_logging(&config.log_file)?;

    tracing::info!("Starting AQI map generation");

    let token = token::load_token(config.token.as_deref(), &config.token_file)?;
    let feature_codes = locations::load_feature_codes(&config.feature_codes);
    let client = WaqiClient::new(token)?;
    let app = App::new(
        AqiFetcher::new(client).with_delay(config.delay),
        feature_codes,
    );

    // Saved when dropped, whichever way this function exits
    let mut cache = PersistentCache::open(&config.cache_file);

    let locations = match locations::read_locations(&config.input_file, config.population_threshold)
    {
        Ok(locations) => locations,
        Err(e) => {
            tracing::error!(path = %config.input_file.display(), "{}", e);
            Vec::new()
        }
    };
    if locations.is_empty() {
        tracing::error!("No locations to process. Exiting.");
        return Ok(());
    }

    let mut observations = Vec::new();
    tokio::select! {
        summary = app.process(&mut cache, &locations, &mut observations) => {
            tracing::info!(
                processed = summary.processed,
                available = summary.available,
                unavailable = summary.unavailable,
                "Processing complete"
            );
        }
        _ = interrupted() => {
            tracing::info!(
                completed = observations.len(),
                "Interrupted by user during processing"
            );
        }
    }

    if observations.is_empty() {
        tracing::warn!("No AQI data available. Skipping results export.");
    } else if let Err(e) = report::write_geojson(&observations, &config.output_path) {
        tracing::error!(path = %config.output_path.display(), "{}", e);
    }

    drop(cache);
    tracing::info!("AQI map generation terminated; cache saved");

    Ok(())
}
