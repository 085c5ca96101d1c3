//! Caching layer for geocoder lookups.
//!
//! Addresses are normalized (trimmed, lower-cased, inner whitespace
//! collapsed) before lookup, so "Honolulu, HI" and " honolulu,  hi " share an
//! entry. Only successful lookups are cached.

use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::trace;

use crate::domain::LatLon;

use super::client::Geocoder;
use super::error::GeocodeError;

/// Configuration for the geocode cache.
#[derive(Debug, Clone)]
pub struct GeocodeCacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for GeocodeCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
            max_capacity: 512,
        }
    }
}

/// Geocoder with caching.
///
/// Wraps any [`Geocoder`] and remembers its answers for a while.
pub struct CachedGeocoder<G> {
    inner: G,
    cache: MokaCache<String, LatLon>,
}

impl<G: Geocoder> CachedGeocoder<G> {
    pub fn new(inner: G, config: &GeocodeCacheConfig) -> Self {
        let cache = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, cache }
    }
}

impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    async fn geocode(&self, address: &str) -> Result<LatLon, GeocodeError> {
        let key = normalize(address);

        if let Some(hit) = self.cache.get(&key).await {
            trace!(address = %key, "geocode cache hit");
            return Ok(hit);
        }

        let position = self.inner.geocode(address).await?;
        self.cache.insert(key, position).await;
        Ok(position)
    }
}

fn normalize(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
