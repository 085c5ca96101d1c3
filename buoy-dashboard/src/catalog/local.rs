//! Catalog sources that do not touch the network.
//!
//! `FileCatalogSource` reads a previously downloaded `activestations.xml`,
//! which is handy for offline development. `StaticCatalogSource` serves an
//! in-memory list and can be switched into a failing state for tests.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::domain::Station;

use super::client::{CatalogSource, parse_catalog};
use super::error::FetchError;

/// Reads the station list from a local XML file on every refresh.
#[derive(Debug, Clone)]
pub struct FileCatalogSource {
    path: PathBuf,
}

impl FileCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogSource for FileCatalogSource {
    async fn fetch_stations(&self) -> Result<Vec<Station>, FetchError> {
        let xml = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FetchError::Network {
                message: format!("failed to read {}: {}", self.path.display(), e),
            })?;
        parse_catalog(&xml)
    }
}

/// Serves a fixed station list, or a fixed error.
#[derive(Debug, Clone)]
pub struct StaticCatalogSource {
    state: Arc<Mutex<Result<Vec<Station>, FetchError>>>,
}

impl StaticCatalogSource {
    pub fn new(stations: Vec<Station>) -> Self {
        Self {
            state: Arc::new(Mutex::new(Ok(stations))),
        }
    }

    /// A source whose every fetch fails with `err`.
    pub fn failing(err: FetchError) -> Self {
        Self {
            state: Arc::new(Mutex::new(Err(err))),
        }
    }

    /// Serve `stations` from the next fetch on.
    pub fn set_stations(&self, stations: Vec<Station>) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = Ok(stations);
    }

    /// Fail every fetch from now on.
    pub fn fail_with(&self, err: FetchError) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = Err(err);
    }
}

impl CatalogSource for StaticCatalogSource {
    async fn fetch_stations(&self) -> Result<Vec<Station>, FetchError> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
