//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::broker::FetchState;
use crate::domain::{BoundingBox, LatLon, Station};
use crate::observation::{Measurement, ReadingIssue, StationReading, TidePoint, WeatherSummary};

/// Query for `/api/locate`.
#[derive(Debug, Deserialize)]
pub struct LocateRequest {
    /// Free-form address
    pub address: String,
}

/// A geocoded address.
#[derive(Debug, Serialize, Deserialize)]
pub struct LocateResponse {
    pub address: String,
    pub lat: f64,
    pub lon: f64,
}

/// Query for `/api/stations`.
///
/// Without `lat`/`lon` the search is centered on the last located address.
#[derive(Debug, Deserialize)]
pub struct StationSearchRequest {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius_miles: f64,
}

/// A station marker.
#[derive(Debug, Serialize, Deserialize)]
pub struct StationResult {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub name: Option<String>,
    pub owner: Option<String>,
    pub station_type: Option<String>,
    pub has_met: bool,
    pub has_dart: bool,
}

impl From<&Station> for StationResult {
    fn from(station: &Station) -> Self {
        Self {
            id: station.id.to_string(),
            lat: station.lat(),
            lon: station.lon(),
            name: station.name.clone(),
            owner: station.owner.clone(),
            station_type: station.station_type.clone(),
            has_met: station.has_met,
            has_dart: station.has_dart,
        }
    }
}

/// Stations inside the search box.
#[derive(Debug, Serialize)]
pub struct StationSearchResponse {
    pub center: LatLonResult,
    pub radius_miles: f64,
    pub bounding_box: BoundingBox,
    pub stations: Vec<StationResult>,
}

/// A position, latitude first.
#[derive(Debug, Serialize, Deserialize)]
pub struct LatLonResult {
    pub lat: f64,
    pub lon: f64,
}

impl From<LatLon> for LatLonResult {
    fn from(position: LatLon) -> Self {
        Self {
            lat: position.lat(),
            lon: position.lon(),
        }
    }
}

/// Body of `POST /api/readings`.
#[derive(Debug, Deserialize)]
pub struct FetchReadingRequest {
    pub station: String,
}

/// A submitted fetch.
#[derive(Debug, Serialize, Deserialize)]
pub struct FetchReadingResponse {
    /// Correlation token of the request
    pub token: String,
    pub station: String,
    pub state: String,
}

/// A value with its display form; `display` is `"N/A"` when missing.
#[derive(Debug, Serialize, Deserialize)]
pub struct MeasurementResult {
    pub value: Option<f64>,
    pub display: String,
}

impl From<Measurement> for MeasurementResult {
    fn from(measurement: Measurement) -> Self {
        Self {
            value: measurement.value(),
            display: measurement.to_string(),
        }
    }
}

/// Latest conditions.
#[derive(Debug, Serialize, Deserialize)]
pub struct WeatherResult {
    pub air_temperature: MeasurementResult,
    pub air_temperature_unit: String,
    pub water_temperature: MeasurementResult,
    pub water_temperature_unit: String,
    pub wave_height: MeasurementResult,
    pub wave_height_unit: String,
    pub swell_period_s: MeasurementResult,
    pub swell_direction_deg: MeasurementResult,
    pub wind_speed: MeasurementResult,
    pub wind_speed_unit: String,
    pub wind_direction_deg: MeasurementResult,
}

impl From<&WeatherSummary> for WeatherResult {
    fn from(w: &WeatherSummary) -> Self {
        Self {
            air_temperature: w.air_temperature.into(),
            air_temperature_unit: w.air_temperature_unit.clone(),
            water_temperature: w.water_temperature.into(),
            water_temperature_unit: w.water_temperature_unit.clone(),
            wave_height: w.wave_height.into(),
            wave_height_unit: w.wave_height_unit.clone(),
            swell_period_s: w.swell_period_s.into(),
            swell_direction_deg: w.swell_direction_deg.into(),
            wind_speed: w.wind_speed.into(),
            wind_speed_unit: w.wind_speed_unit.clone(),
            wind_direction_deg: w.wind_direction_deg.into(),
        }
    }
}

/// One point of the tide plot.
#[derive(Debug, Serialize, Deserialize)]
pub struct TidePointResult {
    /// `YYYY-MM-DDTHH:MM:SS`, station-reported UTC
    pub timestamp: String,
    pub height_m: f64,
}

impl From<&TidePoint> for TidePointResult {
    fn from(point: &TidePoint) -> Self {
        Self {
            timestamp: point.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
            height_m: point.height_m,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IssueResult {
    pub file: String,
    pub message: String,
}

impl From<&ReadingIssue> for IssueResult {
    fn from(issue: &ReadingIssue) -> Self {
        Self {
            file: issue.file.display().to_string(),
            message: issue.message.clone(),
        }
    }
}

/// A parsed station reading.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadingResult {
    /// True when the worker delivered nothing usable
    pub is_empty: bool,
    /// Tide points, oldest first
    pub tide: Option<Vec<TidePointResult>>,
    pub weather: Option<WeatherResult>,
    pub issues: Vec<IssueResult>,
}

impl From<&StationReading> for ReadingResult {
    fn from(reading: &StationReading) -> Self {
        Self {
            is_empty: reading.is_empty(),
            tide: reading
                .tide
                .as_ref()
                .map(|series| series.chronological().iter().map(Into::into).collect()),
            weather: reading.weather.as_ref().map(Into::into),
            issues: reading.issues.iter().map(Into::into).collect(),
        }
    }
}

/// Answer to a reading poll.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadingStatusResponse {
    /// `idle`, `pending`, `ready`, `failed`, `superseded` or `cancelled`
    pub status: String,
    /// Fetch state while pending
    pub state: Option<String>,
    pub station: Option<String>,
    pub error: Option<String>,
    /// The reading on display, if any
    pub reading: Option<ReadingResult>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

/// Snapshot of the dashboard session.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub address: Option<String>,
    pub location: Option<LatLonResult>,
    pub radius_miles: Option<f64>,
    pub stations: Vec<StationResult>,
    pub selected_station: Option<String>,
    pub pending: Option<String>,
    pub last_error: Option<String>,
    pub has_reading: bool,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Wire name of a fetch state.
pub fn state_label(state: &FetchState) -> &'static str {
    match state {
        FetchState::Sent => "sent",
        FetchState::AwaitingResponse => "awaiting_response",
        FetchState::Delivered(_) => "delivered",
        FetchState::Failed(_) => "failed",
        FetchState::Superseded => "superseded",
        FetchState::Cancelled => "cancelled",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::{TideSeries, parse_weather_summary};
    use chrono::NaiveDate;

    #[test]
    fn measurement_serializes_gap_as_null() {
        let json = serde_json::to_value(MeasurementResult::from(Measurement::NotAvailable)).unwrap();
        assert_eq!(json, serde_json::json!({ "value": null, "display": "N/A" }));

        let json = serde_json::to_value(MeasurementResult::from(Measurement::Value(1.5))).unwrap();
        assert_eq!(json, serde_json::json!({ "value": 1.5, "display": "1.5" }));
    }

    #[test]
    fn reading_tide_is_chronological() {
        let at = |h| {
            NaiveDate::from_ymd_opt(2024, 3, 15)
                .unwrap()
                .and_hms_opt(h, 0, 0)
                .unwrap()
        };
        let reading = StationReading {
            tide: Some(TideSeries {
                points: vec![
                    TidePoint {
                        timestamp: at(12),
                        height_m: 2.0,
                    },
                    TidePoint {
                        timestamp: at(11),
                        height_m: 1.0,
                    },
                ],
                rejected: Vec::new(),
            }),
            ..StationReading::default()
        };

        let result = ReadingResult::from(&reading);
        let tide = result.tide.unwrap();
        assert_eq!(tide[0].timestamp, "2024-03-15T11:00:00");
        assert_eq!(tide[1].height_m, 2.0);
        assert!(!result.is_empty);
    }

    #[test]
    fn weather_units_are_carried() {
        let met = "\
#YY  MM DD hh mm WDIR WSPD GST  WVHT   DPD   APD MWD   PRES  ATMP  WTMP  DEWP  VIS PTDY  TIDE
#yr  mo dy hr mn degT m/s  m/s     m   sec   sec degT   hPa  degC  degC  degC  nmi  hPa    ft
2024 03 15 12 00  80  6.0  7.0    MM    MM    MM  MM 1016.2    MM  25.3  19.0   MM   MM    MM
";
        let summary = parse_weather_summary(met).unwrap();
        let result = WeatherResult::from(&summary);
        assert_eq!(result.air_temperature.display, "N/A");
        assert_eq!(result.air_temperature_unit, "degC");
        assert_eq!(result.wave_height.value, None);
        assert_eq!(result.wind_speed.value, Some(6.0));
    }

    #[test]
    fn state_labels() {
        assert_eq!(state_label(&FetchState::AwaitingResponse), "awaiting_response");
        assert_eq!(state_label(&FetchState::Delivered(Vec::new())), "delivered");
    }
}
