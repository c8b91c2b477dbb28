//! World Air Quality Index (WAQI) API client
//!
//! Fetches the geo-located feed for a coordinate pair and returns the `data`
//! document of a successful response.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Base URL for the WAQI API
const WAQI_BASE_URL: &str = "https://api.waqi.info";

/// Per-request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Status marker of a successful response
const STATUS_OK: &str = "ok";

/// Errors that can occur when fetching AQI data
#[derive(Debug, Error)]
pub enum WaqiError {
    /// HTTP request failed, timed out, or returned an error status
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body is not valid JSON
    #[error("Failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),

    /// API answered with a status other than "ok"
    #[error("API response not OK: {0}")]
    Status(String),

    /// API answered "ok" without a data document
    #[error("API response is missing the data field")]
    MissingData,
}

/// Envelope of every WAQI response
#[derive(Debug, Deserialize)]
struct FeedResponse {
    /// "ok" on success, "error" otherwise
    #[serde(default)]
    status: Option<String>,
    /// Payload on success, error message otherwise
    #[serde(default)]
    data: Option<Value>,
}

/// Client for the WAQI geo feed
#[derive(Debug, Clone)]
pub struct WaqiClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Access token appended to every request
    token: String,
    /// Base URL for the API (allows override for testing)
    base_url: String,
}

impl WaqiClient {
    /// Creates a new WaqiClient for the public API
    pub fn new(token: impl Into<String>) -> Result<Self, WaqiError> {
        Self::with_base_url(token, WAQI_BASE_URL)
    }

    /// Creates a new WaqiClient against a custom base URL
    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, WaqiError> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http_client,
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Builds the feed URL for a coordinate pair
    fn feed_url(&self, lat: f64, lon: f64) -> String {
        format!("{}/feed/geo:{};{}/", self.base_url, lat, lon)
    }

    /// Fetches the AQI document for the given coordinates
    ///
    /// # Returns
    /// * `Ok(Value)` - The `data` object of an "ok" response
    /// * `Err(WaqiError)` - On network failure, timeout, HTTP error status,
    ///   non-JSON body, or a status other than "ok"
    pub async fn fetch_feed(&self, lat: f64, lon: f64) -> Result<Value, WaqiError> {
        let response = self
            .http_client
            .get(self.feed_url(lat, lon))
            .query(&[("token", self.token.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let text = response.text().await?;
        let feed: FeedResponse = serde_json::from_str(&text)?;

        parse_feed(feed)
    }
}

/// Extracts the payload from a decoded response envelope
fn parse_feed(feed: FeedResponse) -> Result<Value, WaqiError> {
    match feed.status.as_deref() {
        Some(STATUS_OK) => feed.data.ok_or(WaqiError::MissingData),
        _ => {
            let detail = match feed.data {
                Some(Value::String(message)) => message,
                Some(other) => other.to_string(),
                None => feed.status.unwrap_or_else(|| "missing status".to_string()),
            };
            Err(WaqiError::Status(detail))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn decode(body: Value) -> FeedResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_parse_feed_ok_returns_data() {
        let data = parse_feed(decode(json!({"status": "ok", "data": {"aqi": 42}}))).unwrap();
        assert_eq!(data, json!({"aqi": 42}));
    }

    #[test]
    fn test_parse_feed_error_status_carries_message() {
        let err = parse_feed(decode(json!({"status": "error", "data": "Invalid key"})))
            .unwrap_err();
        assert!(matches!(err, WaqiError::Status(ref msg) if msg == "Invalid key"));
    }

    #[test]
    fn test_parse_feed_missing_status_is_error() {
        let err = parse_feed(decode(json!({"data": {"aqi": 1}}))).unwrap_err();
        assert!(matches!(err, WaqiError::Status(_)));
    }

    #[test]
    fn test_parse_feed_ok_without_data_is_error() {
        let err = parse_feed(decode(json!({"status": "ok"}))).unwrap_err();
        assert!(matches!(err, WaqiError::MissingData));
    }

    #[test]
    fn test_feed_url_embeds_coordinates() {
        let client = WaqiClient::with_base_url("t", "http://localhost:1234/").unwrap();
        assert_eq!(
            client.feed_url(48.7, 19.5),
            "http://localhost:1234/feed/geo:48.7;19.5/"
        );
    }

    #[tokio::test]
    async fn test_fetch_feed_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/feed/geo:48\.7;19\.5/$"))
            .and(query_param("token", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "data": {"aqi": 42, "dominentpol": "pm25"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = WaqiClient::with_base_url("test-token", mock_server.uri()).unwrap();
        let data = client.fetch_feed(48.7, 19.5).await.unwrap();

        assert_eq!(data["aqi"], 42);
        assert_eq!(data["dominentpol"], "pm25");
    }

    #[tokio::test]
    async fn test_fetch_feed_non_json_body_is_parse_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .mount(&mock_server)
            .await;

        let client = WaqiClient::with_base_url("test-token", mock_server.uri()).unwrap();
        let err = client.fetch_feed(48.7, 19.5).await.unwrap_err();

        assert!(matches!(err, WaqiError::Parse(_)));
    }

    #[tokio::test]
    async fn test_fetch_feed_server_error_is_http_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = WaqiClient::with_base_url("test-token", mock_server.uri()).unwrap();
        let err = client.fetch_feed(48.7, 19.5).await.unwrap_err();

        assert!(matches!(err, WaqiError::Http(_)));
    }

    #[tokio::test]
    async fn test_fetch_feed_connection_refused_is_http_error() {
        // Nothing listens on the discard port
        let client = WaqiClient::with_base_url("test-token", "http://127.0.0.1:9").unwrap();
        let err = client.fetch_feed(48.7, 19.5).await.unwrap_err();

        assert!(matches!(err, WaqiError::Http(_)));
    }
}
