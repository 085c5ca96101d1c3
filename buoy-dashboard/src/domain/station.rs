//! Station identity types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::geo::LatLon;

/// Error returned when parsing an invalid station id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station id: {reason}")]
pub struct InvalidStationId {
    reason: &'static str,
}

/// A catalog station identifier (e.g. `41001`, `0y2w3`).
///
/// NDBC ids are short ASCII alphanumeric strings. Surrounding whitespace is
/// trimmed; the id is otherwise kept as published so it round-trips through
/// the message queue unchanged.
///
/// # Examples
///
/// ```
/// use buoy_dashboard::domain::StationId;
///
/// let id = StationId::parse(" 41001 ").unwrap();
/// assert_eq!(id.as_str(), "41001");
///
/// assert!(StationId::parse("").is_err());
/// assert!(StationId::parse("41 001").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StationId(String);

impl StationId {
    /// Parse a station id, trimming surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, InvalidStationId> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(InvalidStationId {
                reason: "must not be empty",
            });
        }

        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(InvalidStationId {
                reason: "must be ASCII letters, digits, '-' or '_'",
            });
        }

        Ok(StationId(trimmed.to_string()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StationId {
    type Error = InvalidStationId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        StationId::parse(&value)
    }
}

impl From<StationId> for String {
    fn from(id: StationId) -> Self {
        id.0
    }
}

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationId({})", self.0)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fixed-location buoy or platform from the active-station catalog.
///
/// Immutable once loaded; a catalog refresh replaces stations wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub position: LatLon,
    /// Human-readable name, if the catalog provides one.
    #[serde(default)]
    pub name: Option<String>,
    /// Operating agency.
    #[serde(default)]
    pub owner: Option<String>,
    /// Platform kind as published (`buoy`, `fixed`, `dart`, ...).
    #[serde(default)]
    pub station_type: Option<String>,
    /// Reports meteorological data.
    #[serde(default)]
    pub has_met: bool,
    /// Reports DART water-column height data.
    #[serde(default)]
    pub has_dart: bool,
}

impl Station {
    /// Create a station with only identity and position.
    pub fn new(id: StationId, position: LatLon) -> Self {
        Self {
            id,
            position,
            name: None,
            owner: None,
            station_type: None,
            has_met: false,
            has_dart: false,
        }
    }

    pub fn lat(&self) -> f64 {
        self.position.lat()
    }

    pub fn lon(&self) -> f64 {
        self.position.lon()
    }
}
