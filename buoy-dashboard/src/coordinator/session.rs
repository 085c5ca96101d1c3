//! Per-user dashboard state.

use std::sync::Arc;

use crate::broker::{BrokerFailure, FetchHandle, FetchState};
use crate::domain::{LatLon, SearchQuery, Station, StationId};
use crate::observation::StationReading;

/// What the dashboard currently shows.
///
/// Owned by [`SearchCoordinator`](super::SearchCoordinator), which is the
/// only writer; everything else reads through the accessors.
#[derive(Debug, Default)]
pub struct SessionState {
    pub(super) address: Option<String>,
    pub(super) location: Option<LatLon>,
    pub(super) last_query: Option<SearchQuery>,
    pub(super) stations: Vec<Station>,
    pub(super) selected: Option<StationId>,
    pub(super) pending: Option<FetchHandle>,
    pub(super) reading: Option<Arc<StationReading>>,
    pub(super) last_failure: Option<BrokerFailure>,
}

impl SessionState {
    /// Last address that geocoded successfully.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn location(&self) -> Option<LatLon> {
        self.location
    }

    pub fn last_query(&self) -> Option<&SearchQuery> {
        self.last_query.as_ref()
    }

    /// Stations found by the last search.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn selected_station(&self) -> Option<&StationId> {
        self.selected.as_ref()
    }

    /// The fetch the session is waiting on.
    pub fn pending(&self) -> Option<&FetchHandle> {
        self.pending.as_ref()
    }

    pub fn pending_state(&self) -> Option<FetchState> {
        self.pending.as_ref().map(FetchHandle::state)
    }

    /// The reading on display. Replaced, never modified.
    pub fn reading(&self) -> Option<Arc<StationReading>> {
        self.reading.clone()
    }

    /// Why the most recent fetch failed, until the next one succeeds.
    pub fn last_failure(&self) -> Option<&BrokerFailure> {
        self.last_failure.as_ref()
    }
}
