//! Offline geocoder.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::LatLon;

use super::client::Geocoder;
use super::error::GeocodeError;

/// Answers from a fixed address table; unknown addresses have no results.
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    places: Arc<Mutex<HashMap<String, Result<LatLon, GeocodeError>>>>,
    calls: Arc<AtomicUsize>,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `address` to `position`.
    pub fn insert(&self, address: impl Into<String>, position: LatLon) {
        self.places
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(address.into(), Ok(position));
    }

    /// Fail lookups of `address` with `err`.
    pub fn fail(&self, address: impl Into<String>, err: GeocodeError) {
        self.places
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(address.into(), Err(err));
    }

    /// Number of lookups served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Geocoder for StaticGeocoder {
    async fn geocode(&self, address: &str) -> Result<LatLon, GeocodeError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.places
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(address.trim())
            .cloned()
            .unwrap_or(Err(GeocodeError::NoResults))
    }
}
