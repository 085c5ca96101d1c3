//! In-memory station catalog.

use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::domain::{BoundingBox, Station, StationId};

use super::cache::CatalogCache;
use super::client::CatalogSource;
use super::error::FetchError;

/// Thread-safe station catalog with wholesale refresh.
///
/// The station list is held behind an `Arc` snapshot: a refresh builds the
/// new list completely and then swaps the pointer, so readers see either the
/// old catalog or the new one, never a mixture.
#[derive(Clone)]
pub struct StationCatalog<S> {
    source: S,
    cache: Option<CatalogCache>,
    stations: Arc<RwLock<Arc<Vec<Station>>>>,
}

impl<S: CatalogSource> StationCatalog<S> {
    /// Create an empty catalog backed by `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: None,
            stations: Arc::new(RwLock::new(Arc::new(Vec::new()))),
        }
    }

    /// Persist every successful refresh to `cache`.
    pub fn with_cache(mut self, cache: CatalogCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Load a fresh cache snapshot, if one exists.
    ///
    /// Returns the number of stations loaded (zero when nothing usable was
    /// found, in which case the catalog is left untouched).
    pub fn warm_from_cache(&self) -> usize {
        let Some(stations) = self.cache.as_ref().and_then(CatalogCache::load) else {
            return 0;
        };
        let count = stations.len();
        self.replace(stations);
        debug!(count, "loaded station catalog from cache");
        count
    }

    /// Load the cache snapshot regardless of age.
    ///
    /// Used when a refresh fails and nothing is loaded yet.
    pub fn fallback_to_cache(&self) -> usize {
        let Some(stations) = self.cache.as_ref().and_then(CatalogCache::load_stale) else {
            return 0;
        };
        let count = stations.len();
        self.replace(stations);
        warn!(count, "serving stale station catalog from cache");
        count
    }

    /// Fetch the station list from the source and replace the catalog.
    ///
    /// On failure the previous catalog stays in place and the error is
    /// returned.
    pub async fn refresh(&self) -> Result<usize, FetchError> {
        let stations = self.source.fetch_stations().await?;
        let count = stations.len();

        if let Some(cache) = &self.cache
            && let Err(e) = cache.save(&stations)
        {
            warn!(error = %e, path = %cache.path().display(), "failed to persist station catalog");
        }

        self.replace(stations);
        info!(count, "refreshed station catalog");
        Ok(count)
    }

    /// Stations inside `bbox` (edges included), in catalog order.
    pub fn query(&self, bbox: &BoundingBox) -> Vec<Station> {
        self.snapshot()
            .iter()
            .filter(|s| bbox.contains(&s.position))
            .cloned()
            .collect()
    }

    /// Look up a station by id.
    pub fn get(&self, id: &StationId) -> Option<Station> {
        self.snapshot().iter().find(|s| &s.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// The current catalog as a shared snapshot.
    pub fn snapshot(&self) -> Arc<Vec<Station>> {
        let guard = self.stations.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    fn replace(&self, stations: Vec<Station>) {
        let next = Arc::new(stations);
        let mut guard = self.stations.write().unwrap_or_else(|e| e.into_inner());
        *guard = next;
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::catalog::StaticCatalogSource;
    use crate::domain::{LatLon, SearchQuery};
    use proptest::prelude::*;

    fn stations_strategy() -> impl Strategy<Value = Vec<Station>> {
        prop::collection::vec((-20.0f64..20.0, -20.0f64..20.0), 0..40).prop_map(|coords| {
            coords
                .into_iter()
                .enumerate()
                .map(|(i, (lat, lon))| {
                    Station::new(
                        StationId::parse(&format!("S{i}")).unwrap(),
                        LatLon::new(lat, lon).unwrap(),
                    )
                })
                .collect()
        })
    }

    fn run_query(stations: Vec<Station>, query: &SearchQuery) -> Vec<Station> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let catalog = StationCatalog::new(StaticCatalogSource::new(stations));
        runtime.block_on(catalog.refresh()).unwrap();
        catalog.query(&query.bounding_box())
    }

    proptest! {
        /// The result is exactly the stations inside the inclusive box.
        #[test]
        fn query_matches_box_predicate(
            stations in stations_strategy(),
            lat in -10.0f64..10.0,
            lon in -10.0f64..10.0,
            radius in 1.0f64..700.0,
        ) {
            let query = SearchQuery::from_degrees(lat, lon, radius).unwrap();
            let bbox = query.bounding_box();
            let found = run_query(stations.clone(), &query);

            let expected: Vec<Station> = stations
                .into_iter()
                .filter(|s| {
                    s.lat() >= bbox.min_lat && s.lat() <= bbox.max_lat
                        && s.lon() >= bbox.min_lon && s.lon() <= bbox.max_lon
                })
                .collect();
            prop_assert_eq!(found, expected);
        }

        /// Reversing load order yields the same set of stations.
        #[test]
        fn query_set_is_independent_of_load_order(
            stations in stations_strategy(),
            radius in 1.0f64..700.0,
        ) {
            let query = SearchQuery::from_degrees(0.0, 0.0, radius).unwrap();
            let mut reversed = stations.clone();
            reversed.reverse();

            let mut forward: Vec<String> =
                run_query(stations, &query).into_iter().map(|s| s.id.to_string()).collect();
            let mut backward: Vec<String> =
                run_query(reversed, &query).into_iter().map(|s| s.id.to_string()).collect();
            forward.sort();
            backward.sort();
            prop_assert_eq!(forward, backward);
        }
    }
}
