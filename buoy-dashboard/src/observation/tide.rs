//! Water-column height (`.dart`) files.

use chrono::{NaiveDate, NaiveDateTime};

use super::error::ParseError;
use super::table::{Row, Table};

/// One water-column height observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TidePoint {
    pub timestamp: NaiveDateTime,
    pub height_m: f64,
}

/// Parsed tide series.
///
/// Points keep the order they appear in the file. Rows that could not be
/// parsed are listed in `rejected` rather than failing the whole series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TideSeries {
    pub points: Vec<TidePoint>,
    pub rejected: Vec<ParseError>,
}

impl TideSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points sorted oldest-first; equal timestamps keep file order.
    pub fn chronological(&self) -> Vec<TidePoint> {
        let mut points = self.points.clone();
        points.sort_by_key(|p| p.timestamp);
        points
    }
}

/// Parse a tide file.
///
/// Requires the `YY MM DD hh mm HEIGHT` columns. The seconds and
/// measurement-type columns (`ss`, `T`) are ignored.
pub fn parse_tide(contents: &str) -> Result<TideSeries, ParseError> {
    let table = Table::parse(contents)?;
    let columns = table.require(["YY", "MM", "DD", "hh", "mm", "HEIGHT"])?;

    let mut series = TideSeries::default();
    for row in table.rows() {
        match tide_point(row, &columns) {
            Ok(point) => series.points.push(point),
            Err(e) => series.rejected.push(e),
        }
    }

    Ok(series)
}

fn tide_point(row: &Row<'_>, columns: &[usize; 6]) -> Result<TidePoint, ParseError> {
    let [yy, mo, dd, hh, mi, height] = *columns;

    let field = |col: usize, name: &str| {
        row.get(col)
            .ok_or_else(|| ParseError::value(row.number, format!("{name} is missing")))
    };
    let int = |col: usize, name: &str| -> Result<u32, ParseError> {
        let raw = field(col, name)?;
        raw.parse::<u32>().map_err(|_| {
            ParseError::value(row.number, format!("{name} is not an integer: {raw:?}"))
        })
    };

    let year = int(yy, "YY")?;
    let date = NaiveDate::from_ymd_opt(year as i32, int(mo, "MM")?, int(dd, "DD")?)
        .ok_or_else(|| ParseError::value(row.number, "invalid date"))?;
    let timestamp = date
        .and_hms_opt(int(hh, "hh")?, int(mi, "mm")?, 0)
        .ok_or_else(|| ParseError::value(row.number, "invalid time"))?;

    let raw = field(height, "HEIGHT")?;
    let height_m = raw
        .parse::<f64>()
        .ok()
        .filter(|h| h.is_finite())
        .ok_or_else(|| {
            ParseError::value(row.number, format!("HEIGHT is not a number: {raw:?}"))
        })?;

    Ok(TidePoint {
        timestamp,
        height_m,
    })
}
