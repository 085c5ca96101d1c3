//! Application state for the web layer.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::coordinator::SearchCoordinator;

/// Shared application state.
///
/// The dashboard has one session; requests take turns on its coordinator.
pub struct AppState<G, C, T> {
    pub coordinator: Arc<Mutex<SearchCoordinator<G, C, T>>>,
}

impl<G, C, T> AppState<G, C, T> {
    pub fn new(coordinator: SearchCoordinator<G, C, T>) -> Self {
        Self {
            coordinator: Arc::new(Mutex::new(coordinator)),
        }
    }
}

impl<G, C, T> Clone for AppState<G, C, T> {
    fn clone(&self) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
        }
    }
}
