//! Domain types for the buoy dashboard.
//!
//! Types here validate at construction, so code receiving a `StationId`,
//! `LatLon` or `SearchQuery` can rely on it being well-formed.

mod geo;
mod station;

pub use geo::{BoundingBox, InvalidQuery, LatLon, MILES_PER_DEGREE, SearchQuery};
pub use station::{InvalidStationId, Station, StationId};
