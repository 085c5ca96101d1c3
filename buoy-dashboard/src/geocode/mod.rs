//! Address lookup.
//!
//! Turns the free-form address a user types into a search center, using
//! Nominatim over HTTP with a short-lived in-memory cache in front.

mod cache;
mod client;
mod error;
mod local;

pub use cache::{CachedGeocoder, GeocodeCacheConfig};
pub use client::{Geocoder, GeocoderConfig, NominatimClient, decode_search_results};
pub use error::GeocodeError;
pub use local::StaticGeocoder;
