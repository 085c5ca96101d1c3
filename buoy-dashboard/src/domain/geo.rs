//! Coordinates, search queries and bounding boxes.

use serde::{Deserialize, Serialize};

/// Miles per degree of latitude, used as a flat conversion for both axes.
pub const MILES_PER_DEGREE: f64 = 69.0;

/// Errors from constructing coordinates or queries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidQuery {
    #[error("latitude {0} is outside -90..=90")]
    Latitude(f64),

    #[error("longitude {0} is outside -180..=180")]
    Longitude(f64),

    #[error("search radius must be a positive number of miles, got {0}")]
    Radius(f64),
}

/// A WGS84 position in decimal degrees, always stored latitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLatLon")]
pub struct LatLon {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct RawLatLon {
    lat: f64,
    lon: f64,
}

impl TryFrom<RawLatLon> for LatLon {
    type Error = InvalidQuery;

    fn try_from(raw: RawLatLon) -> Result<Self, Self::Error> {
        LatLon::new(raw.lat, raw.lon)
    }
}

impl LatLon {
    /// Create a position, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lon: f64) -> Result<Self, InvalidQuery> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidQuery::Latitude(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(InvalidQuery::Longitude(lon));
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

/// An inclusive latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// A box extending `half_width_deg` degrees from `center` on both axes.
    ///
    /// The box is not clamped or wrapped at the poles or the antimeridian.
    pub fn around(center: LatLon, half_width_deg: f64) -> Self {
        Self {
            min_lat: center.lat - half_width_deg,
            max_lat: center.lat + half_width_deg,
            min_lon: center.lon - half_width_deg,
            max_lon: center.lon + half_width_deg,
        }
    }

    /// Whether `pos` lies inside the box, edges included.
    pub fn contains(&self, pos: &LatLon) -> bool {
        (self.min_lat..=self.max_lat).contains(&pos.lat)
            && (self.min_lon..=self.max_lon).contains(&pos.lon)
    }
}

/// A station search around a point.
///
/// The radius is converted to degrees with [`MILES_PER_DEGREE`] and the same
/// degree offset is applied to longitude. Longitude is deliberately not
/// scaled by `cos(lat)`, so boxes get narrower in ground distance towards the
/// poles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchQuery {
    center: LatLon,
    radius_miles: f64,
}

impl SearchQuery {
    pub fn new(center: LatLon, radius_miles: f64) -> Result<Self, InvalidQuery> {
        if !radius_miles.is_finite() || radius_miles <= 0.0 {
            return Err(InvalidQuery::Radius(radius_miles));
        }
        Ok(Self {
            center,
            radius_miles,
        })
    }

    /// Build a query from raw degrees and miles.
    pub fn from_degrees(lat: f64, lon: f64, radius_miles: f64) -> Result<Self, InvalidQuery> {
        Self::new(LatLon::new(lat, lon)?, radius_miles)
    }

    pub fn center(&self) -> LatLon {
        self.center
    }

    pub fn radius_miles(&self) -> f64 {
        self.radius_miles
    }

    /// Radius in degrees of latitude.
    pub fn radius_degrees(&self) -> f64 {
        self.radius_miles / MILES_PER_DEGREE
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::around(self.center, self.radius_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latlon_rejects_out_of_range() {
        assert_eq!(LatLon::new(90.5, 0.0), Err(InvalidQuery::Latitude(90.5)));
        assert_eq!(
            LatLon::new(0.0, -180.5),
            Err(InvalidQuery::Longitude(-180.5))
        );
        assert!(LatLon::new(f64::NAN, 0.0).is_err());
        assert!(LatLon::new(0.0, f64::INFINITY).is_err());
        assert!(LatLon::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn radius_must_be_positive() {
        let center = LatLon::new(10.0, 20.0).unwrap();
        assert!(SearchQuery::new(center, 0.0).is_err());
        assert!(SearchQuery::new(center, -5.0).is_err());
        assert!(SearchQuery::new(center, f64::NAN).is_err());
        assert!(SearchQuery::new(center, 1.0).is_ok());
    }

    #[test]
    fn sixty_nine_miles_is_one_degree_on_both_axes() {
        let query = SearchQuery::from_degrees(10.0, 20.0, 69.0).unwrap();
        assert_eq!(query.radius_degrees(), 1.0);

        let bbox = query.bounding_box();
        assert_eq!(bbox.min_lat, 9.0);
        assert_eq!(bbox.max_lat, 11.0);
        assert_eq!(bbox.min_lon, 19.0);
        assert_eq!(bbox.max_lon, 21.0);
    }

    #[test]
    fn longitude_is_not_scaled_by_latitude() {
        let query = SearchQuery::from_degrees(60.0, 0.0, 138.0).unwrap();
        let bbox = query.bounding_box();
        assert_eq!(bbox.max_lat - bbox.min_lat, bbox.max_lon - bbox.min_lon);
    }

    #[test]
    fn contains_is_inclusive() {
        let bbox = BoundingBox::around(LatLon::new(10.0, 20.0).unwrap(), 1.0);
        assert!(bbox.contains(&LatLon::new(9.0, 19.0).unwrap()));
        assert!(bbox.contains(&LatLon::new(11.0, 21.0).unwrap()));
        assert!(!bbox.contains(&LatLon::new(11.0001, 20.0).unwrap()));
        assert!(!bbox.contains(&LatLon::new(10.0, 18.9999).unwrap()));
    }

    #[test]
    fn latlon_deserialize_validates() {
        let ok: LatLon = serde_json::from_str(r#"{"lat": 19.6, "lon": -155.9}"#).unwrap();
        assert_eq!(ok.lat(), 19.6);
        assert!(serde_json::from_str::<LatLon>(r#"{"lat": 120.0, "lon": 0.0}"#).is_err());
    }
}
