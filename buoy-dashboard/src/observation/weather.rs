//! Standard meteorological (`.txt`) files.

use std::fmt;

use tracing::trace;

use super::error::ParseError;
use super::table::{MISSING, Row, Table};

/// Row the wind fields are read from.
///
/// Upstream reports wind from the first observation (the most recent one)
/// instead of searching for the latest non-missing value like the other
/// fields.
pub const WIND_ROW: usize = 1;

/// A reported value or an explicit gap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    Value(f64),
    NotAvailable,
}

impl Measurement {
    pub fn value(&self) -> Option<f64> {
        match self {
            Measurement::Value(v) => Some(*v),
            Measurement::NotAvailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Measurement::Value(_))
    }

    /// Decode a single table token. `MM`, absent and non-numeric tokens are
    /// all gaps.
    fn from_token(token: Option<&str>) -> Self {
        match token {
            None | Some(MISSING) => Measurement::NotAvailable,
            Some(raw) => match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => Measurement::Value(v),
                _ => {
                    trace!(token = raw, "treating unparseable token as missing");
                    Measurement::NotAvailable
                }
            },
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measurement::Value(v) => write!(f, "{v}"),
            Measurement::NotAvailable => f.write_str("N/A"),
        }
    }
}

/// Latest conditions summarized from a meteorological file.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSummary {
    pub air_temperature: Measurement,
    pub air_temperature_unit: String,
    pub water_temperature: Measurement,
    pub water_temperature_unit: String,
    pub wave_height: Measurement,
    pub wave_height_unit: String,
    pub swell_period_s: Measurement,
    pub swell_direction_deg: Measurement,
    pub wind_speed: Measurement,
    pub wind_speed_unit: String,
    pub wind_direction_deg: Measurement,
    /// Row the wave height, period and direction were taken from.
    pub wave_row: Option<usize>,
}

/// Parse a meteorological file into a summary.
///
/// * Air and water temperature each come from the first row where that field
///   is present.
/// * Wave height (`WVHT`), dominant period (`DPD`) and mean direction (`MWD`)
///   come together from the first row where all three are present, so they
///   describe the same observation.
/// * Wind speed and direction come from [`WIND_ROW`].
///
/// A file whose values are all `MM` yields `NotAvailable` fields, not an
/// error. Missing columns or a missing units row are schema errors.
pub fn parse_weather_summary(contents: &str) -> Result<WeatherSummary, ParseError> {
    let table = Table::parse(contents)?;
    let [atmp, wtmp, wvht, dpd, mwd, wspd, wdir] =
        table.require(["ATMP", "WTMP", "WVHT", "DPD", "MWD", "WSPD", "WDIR"])?;

    if !table.has_units() {
        return Err(ParseError::schema("file has no units row"));
    }
    let unit = |column: usize| table.unit(column).unwrap_or_default().to_string();

    let wave = table.rows().iter().find_map(|row| {
        match [wvht, dpd, mwd].map(|c| measure(row, c)) {
            [Measurement::Value(h), Measurement::Value(p), Measurement::Value(d)] => {
                Some((row.number, h, p, d))
            }
            _ => None,
        }
    });

    let wind = table.row(WIND_ROW);
    let wind_field = |column: usize| wind.map_or(Measurement::NotAvailable, |r| measure(r, column));

    Ok(WeatherSummary {
        air_temperature: first_available(&table, atmp),
        air_temperature_unit: unit(atmp),
        water_temperature: first_available(&table, wtmp),
        water_temperature_unit: unit(wtmp),
        wave_height: wave.map_or(Measurement::NotAvailable, |w| Measurement::Value(w.1)),
        wave_height_unit: unit(wvht),
        swell_period_s: wave.map_or(Measurement::NotAvailable, |w| Measurement::Value(w.2)),
        swell_direction_deg: wave.map_or(Measurement::NotAvailable, |w| Measurement::Value(w.3)),
        wind_speed: wind_field(wspd),
        wind_speed_unit: unit(wspd),
        wind_direction_deg: wind_field(wdir),
        wave_row: wave.map(|w| w.0),
    })
}

fn measure(row: &Row<'_>, column: usize) -> Measurement {
    Measurement::from_token(row.get(column))
}

fn first_available(table: &Table<'_>, column: usize) -> Measurement {
    table
        .rows()
        .iter()
        .map(|row| measure(row, column))
        .find(Measurement::is_available)
        .unwrap_or(Measurement::NotAvailable)
}
