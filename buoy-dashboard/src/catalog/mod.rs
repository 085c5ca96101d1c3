//! Active-station catalog.
//!
//! Fetches the NDBC active-station list, keeps it in memory for
//! bounding-box queries and persists it to a local cache file so a restart
//! (or an upstream outage) still has stations to show.

mod cache;
mod client;
mod error;
mod local;
mod store;

pub use cache::{CatalogCache, CatalogCacheConfig};
pub use client::{CatalogClient, CatalogClientConfig, CatalogSource, parse_catalog};
pub use error::FetchError;
pub use local::{FileCatalogSource, StaticCatalogSource};
pub use store::StationCatalog;
