//! Nominatim search client.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::domain::LatLon;

use super::error::GeocodeError;

/// Default Nominatim endpoint.
const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim's usage policy requires an identifying `User-Agent`.
const DEFAULT_USER_AGENT: &str = "BuoyDashboard/0.1";

/// Turns a free-form address into a position.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, address: &str) -> impl Future<Output = Result<LatLon, GeocodeError>> + Send;
}

/// Configuration for the Nominatim client.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    /// Base URL; `/search` is appended
    pub base_url: String,
    /// `User-Agent` header value
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl GeocoderConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 15,
        }
    }

    /// Set the `User-Agent` header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// HTTP client for Nominatim's `/search` endpoint.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    http: reqwest::Client,
    search_url: String,
}

impl NominatimClient {
    pub fn new(config: GeocoderConfig) -> Result<Self, GeocodeError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            search_url: format!("{}/search", config.base_url.trim_end_matches('/')),
        })
    }
}

impl Geocoder for NominatimClient {
    async fn geocode(&self, address: &str) -> Result<LatLon, GeocodeError> {
        let response = self
            .http
            .get(&self.search_url)
            .query(&[("q", address), ("format", "json")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let position = decode_search_results(&body)?;
        debug!(address, lat = position.lat(), lon = position.lon(), "geocoded address");
        Ok(position)
    }
}

/// One search hit. Nominatim sends coordinates as decimal strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

/// Decode a `/search?format=json` body into the first hit's position.
pub fn decode_search_results(body: &str) -> Result<LatLon, GeocodeError> {
    let places: Vec<Place> =
        serde_json::from_str(body).map_err(|e| GeocodeError::malformed(e.to_string()))?;
    let first = places.into_iter().next().ok_or(GeocodeError::NoResults)?;

    let lat: f64 = first
        .lat
        .trim()
        .parse()
        .map_err(|_| GeocodeError::malformed(format!("latitude {:?} is not a number", first.lat)))?;
    let lon: f64 = first
        .lon
        .trim()
        .parse()
        .map_err(|_| GeocodeError::malformed(format!("longitude {:?} is not a number", first.lon)))?;

    LatLon::new(lat, lon).map_err(|e| GeocodeError::malformed(e.to_string()))
}
