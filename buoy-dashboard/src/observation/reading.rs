//! Assembling parsed files into a station reading.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::tide::{TideSeries, parse_tide};
use super::weather::{WeatherSummary, parse_weather_summary};

/// Kind of observation file, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `.dart` water-column height
    Tide,
    /// `.txt` standard meteorological data
    WeatherSummary,
    /// `.spec` spectral wave summary
    SpectralSwell,
}

impl FileKind {
    /// Classify a delivered file; `None` for types the dashboard does not use.
    pub fn classify(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "dart" => Some(FileKind::Tide),
            "txt" => Some(FileKind::WeatherSummary),
            "spec" => Some(FileKind::SpectralSwell),
            _ => None,
        }
    }
}

/// Spectral swell data. Not parsed yet, so readings never carry one.
#[derive(Debug, Clone, PartialEq)]
pub struct SwellSeries {}

/// A problem met while building a reading.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingIssue {
    pub file: PathBuf,
    pub message: String,
}

/// Everything parsed for one station at request time.
///
/// Every sub-record is optional. A reading with none of them is a valid
/// "no data" answer, distinct from a failed request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StationReading {
    pub tide: Option<TideSeries>,
    pub weather: Option<WeatherSummary>,
    pub swell: Option<SwellSeries>,
    pub issues: Vec<ReadingIssue>,
}

impl StationReading {
    /// Whether no sub-record is present. Issues do not count.
    pub fn is_empty(&self) -> bool {
        self.tide.is_none() && self.weather.is_none() && self.swell.is_none()
    }
}

/// Routes file contents to the matching parser.
#[derive(Debug, Default)]
pub struct ReadingBuilder {
    reading: StationReading,
}

impl ReadingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `contents` according to the kind of `path`.
    ///
    /// Unknown file types are skipped. When several files of one kind are
    /// delivered the first one wins.
    pub fn add_file(&mut self, path: &Path, contents: &str) {
        let Some(kind) = FileKind::classify(path) else {
            debug!(file = %path.display(), "ignoring unrecognized file type");
            return;
        };

        match kind {
            FileKind::Tide if self.reading.tide.is_some() => self.duplicate(path),
            FileKind::Tide => match parse_tide(contents) {
                Ok(series) => {
                    for rejected in &series.rejected {
                        self.add_issue(path, rejected.to_string());
                    }
                    self.reading.tide = Some(series);
                }
                Err(e) => self.add_issue(path, e.to_string()),
            },
            FileKind::WeatherSummary if self.reading.weather.is_some() => self.duplicate(path),
            FileKind::WeatherSummary => match parse_weather_summary(contents) {
                Ok(summary) => self.reading.weather = Some(summary),
                Err(e) => self.add_issue(path, e.to_string()),
            },
            FileKind::SpectralSwell => {
                debug!(file = %path.display(), "spectral swell files are not parsed");
            }
        }
    }

    /// Record a problem with a file that produced no sub-record.
    pub fn add_issue(&mut self, path: &Path, message: impl Into<String>) {
        let message = message.into();
        warn!(file = %path.display(), %message, "observation file problem");
        self.reading.issues.push(ReadingIssue {
            file: path.to_path_buf(),
            message,
        });
    }

    fn duplicate(&mut self, path: &Path) {
        self.add_issue(path, "ignored: another file of the same kind was delivered first");
    }

    pub fn finish(self) -> StationReading {
        self.reading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::Measurement;

    const DART: &str = "\
#YY  MM DD hh mm ss T   HEIGHT
#yr  mo dy hr mn  s -      m
2024 03 15 12 00 00 1 5792.345
2024 03 15 11 45 00 1 oops
";

    const MET: &str = "\
#YY  MM DD hh mm WDIR WSPD GST  WVHT   DPD   APD MWD   PRES  ATMP  WTMP  DEWP  VIS PTDY  TIDE
#yr  mo dy hr mn degT m/s  m/s     m   sec   sec degT   hPa  degC  degC  degC  nmi  hPa    ft
2024 03 15 12 00  80  6.0  7.0   1.8  12.0   6.1  95 1016.2  24.1  25.3  19.0   MM   MM    MM
";

    #[test]
    fn classify_by_extension() {
        assert_eq!(
            FileKind::classify(Path::new("/tmp/21413.dart")),
            Some(FileKind::Tide)
        );
        assert_eq!(
            FileKind::classify(Path::new("51002.TXT")),
            Some(FileKind::WeatherSummary)
        );
        assert_eq!(
            FileKind::classify(Path::new("51002.spec")),
            Some(FileKind::SpectralSwell)
        );
        assert_eq!(FileKind::classify(Path::new("51002.ocean")), None);
        assert_eq!(FileKind::classify(Path::new("51002")), None);
    }

    #[test]
    fn empty_builder_is_no_data() {
        let reading = ReadingBuilder::new().finish();
        assert!(reading.is_empty());
        assert!(reading.issues.is_empty());
    }

    #[test]
    fn routes_files_to_parsers() {
        let mut builder = ReadingBuilder::new();
        builder.add_file(Path::new("21413.dart"), DART);
        builder.add_file(Path::new("51002.txt"), MET);
        builder.add_file(Path::new("51002.spec"), "whatever");
        builder.add_file(Path::new("51002.drift"), "whatever");
        let reading = builder.finish();

        assert!(!reading.is_empty());
        assert_eq!(reading.tide.as_ref().unwrap().len(), 1);
        assert_eq!(
            reading.weather.as_ref().unwrap().air_temperature,
            Measurement::Value(24.1)
        );
        assert!(reading.swell.is_none());
        // The rejected tide row is surfaced as an issue.
        assert_eq!(reading.issues.len(), 1);
        assert!(reading.issues[0].message.contains("HEIGHT"));
    }

    #[test]
    fn schema_error_leaves_sub_record_absent() {
        let mut builder = ReadingBuilder::new();
        builder.add_file(Path::new("51002.txt"), "#YY MM DD\n#yr mo dy\n");
        let reading = builder.finish();

        assert!(reading.is_empty());
        assert_eq!(reading.issues.len(), 1);
        assert!(reading.issues[0].message.starts_with("schema error"));
    }

    #[test]
    fn first_file_of_a_kind_wins() {
        let mut builder = ReadingBuilder::new();
        builder.add_file(Path::new("a.txt"), MET);
        builder.add_file(Path::new("b.txt"), "#YY\n#yr\n");
        let reading = builder.finish();

        assert!(reading.weather.is_some());
        assert_eq!(reading.issues[0].file, PathBuf::from("b.txt"));
    }
}
