//! AQI Map CLI Library
//!
//! Collects air quality readings for a list of places through a persistent,
//! time-expiring response cache. Modules are exposed for integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod data;
pub mod fetcher;
pub mod locations;
pub mod logging;
pub mod report;
pub mod token;
