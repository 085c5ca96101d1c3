//! Queue payloads exchanged with the download worker.

use std::fmt;
use std::path::PathBuf;

use crate::domain::StationId;

/// Body the worker sends when it found nothing to download.
pub const NO_FILES: &str = "No files downloaded";

/// Identifies one `submit` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationToken(pub u64);

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buoy-req-{}", self.0)
    }
}

/// Outbound request: the body is the bare station id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuoyRequest {
    pub station: StationId,
    pub correlation: CorrelationToken,
}

impl BuoyRequest {
    pub fn body(&self) -> &[u8] {
        self.station.as_str().as_bytes()
    }
}

/// What the worker reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseStatus {
    /// Paths of the downloaded files
    Files(Vec<PathBuf>),
    /// The worker ran but found no files
    NoFiles,
    /// The body could not be understood
    Error(String),
}

/// Inbound response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuoyResponse {
    pub status: ResponseStatus,
}

impl BuoyResponse {
    /// Decode a raw response body.
    ///
    /// The body is either [`NO_FILES`] or a `", "`-separated list of paths.
    /// Non-UTF-8 and empty bodies are worker errors.
    pub fn decode(body: &[u8]) -> Self {
        let status = match std::str::from_utf8(body) {
            Err(_) => ResponseStatus::Error("response is not valid UTF-8".to_string()),
            Ok(text) => {
                let text = text.trim();
                if text == NO_FILES {
                    ResponseStatus::NoFiles
                } else {
                    let files: Vec<PathBuf> = text
                        .split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(PathBuf::from)
                        .collect();
                    if files.is_empty() {
                        ResponseStatus::Error("empty response".to_string())
                    } else {
                        ResponseStatus::Files(files)
                    }
                }
            }
        };
        Self { status }
    }
}
