//! Parsers for NDBC realtime observation files.
//!
//! Parsing is pure: callers hand in file contents and get typed records
//! back. Reading the files from disk is the caller's job.

mod error;
mod reading;
mod table;
mod tide;
mod weather;

pub use error::ParseError;
pub use reading::{FileKind, ReadingBuilder, ReadingIssue, StationReading, SwellSeries};
pub use table::MISSING;
pub use tide::{TidePoint, TideSeries, parse_tide};
pub use weather::{Measurement, WIND_ROW, WeatherSummary, parse_weather_summary};
