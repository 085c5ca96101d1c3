//! NDBC active-station catalog client.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::{debug, warn};

use crate::domain::{LatLon, Station, StationId};

use super::error::FetchError;

/// Default URL of the NDBC active-station list.
const DEFAULT_CATALOG_URL: &str = "https://www.ndbc.noaa.gov/activestations.xml";

/// Default `User-Agent` sent with catalog requests.
const DEFAULT_USER_AGENT: &str = "BuoyDashboard/0.1";

/// Something that can produce the current list of active stations.
pub trait CatalogSource: Send + Sync {
    /// Fetch and decode the full station list, in document order.
    fn fetch_stations(&self) -> impl Future<Output = Result<Vec<Station>, FetchError>> + Send;
}

/// Configuration for the catalog HTTP client.
#[derive(Debug, Clone)]
pub struct CatalogClientConfig {
    /// URL of the XML station list
    pub url: String,
    /// `User-Agent` header value
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl CatalogClientConfig {
    /// Create a config pointing at the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }

    /// Set the `User-Agent` header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for CatalogClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CATALOG_URL)
    }
}

/// HTTP client for the active-station XML document.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    url: String,
}

impl CatalogClient {
    /// Create a new catalog client.
    pub fn new(config: CatalogClientConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: config.url,
        })
    }
}

impl CatalogSource for CatalogClient {
    async fn fetch_stations(&self) -> Result<Vec<Station>, FetchError> {
        let response = self.http.get(&self.url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Network {
                message: format!("catalog source returned HTTP {}", status.as_u16()),
            });
        }

        let body = response.text().await?;
        let stations = parse_catalog(&body)?;
        debug!(count = stations.len(), url = %self.url, "fetched station catalog");
        Ok(stations)
    }
}

/// Decode the active-station XML document.
///
/// Every immediate child of the root element describes one station through
/// its attributes. Children without a usable `id`, `lat` or `lon` are skipped,
/// as are repeated ids; a document that is not well-formed XML is rejected
/// as a whole.
pub fn parse_catalog(xml: &str) -> Result<Vec<Station>, FetchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut saw_root = false;
    let mut seen = HashSet::new();
    let mut stations = Vec::new();
    let mut skipped = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| FetchError::Format {
            message: format!("at byte {}: {}", reader.buffer_position(), e),
        })?;

        match event {
            Event::Start(element) => {
                if depth == 1 {
                    collect_station(&element, &mut seen, &mut stations, &mut skipped)?;
                }
                saw_root = true;
                depth += 1;
            }
            Event::Empty(element) => {
                if depth == 1 {
                    collect_station(&element, &mut seen, &mut stations, &mut skipped)?;
                }
                saw_root = true;
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(FetchError::Format {
            message: "document has no root element".to_string(),
        });
    }
    if depth != 0 {
        return Err(FetchError::Format {
            message: "document ended inside an element".to_string(),
        });
    }

    if skipped > 0 {
        warn!(skipped, "skipped unusable catalog entries");
    }

    Ok(stations)
}

fn collect_station(
    element: &BytesStart<'_>,
    seen: &mut HashSet<StationId>,
    stations: &mut Vec<Station>,
    skipped: &mut usize,
) -> Result<(), FetchError> {
    let attrs = attributes(element)?;

    match station_from_attributes(&attrs) {
        Some(station) if seen.insert(station.id.clone()) => stations.push(station),
        Some(station) => {
            debug!(station = %station.id, "duplicate station id in catalog");
            *skipped += 1;
        }
        None => *skipped += 1,
    }

    Ok(())
}

fn attributes(element: &BytesStart<'_>) -> Result<HashMap<String, String>, FetchError> {
    let mut out = HashMap::new();

    for attr in element.attributes() {
        let attr = attr.map_err(|e| FetchError::Format {
            message: e.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| FetchError::Format {
                message: e.to_string(),
            })?
            .into_owned();
        out.insert(key, value);
    }

    Ok(out)
}

fn station_from_attributes(attrs: &HashMap<String, String>) -> Option<Station> {
    let id = StationId::parse(attrs.get("id")?).ok()?;
    let lat = attrs.get("lat")?.trim().parse::<f64>().ok()?;
    let lon = attrs.get("lon")?.trim().parse::<f64>().ok()?;
    let position = LatLon::new(lat, lon).ok()?;

    let text = |key: &str| {
        attrs
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    let flag = |key: &str| attrs.get(key).is_some_and(|v| v.trim() == "y");

    Some(Station {
        id,
        position,
        name: text("name"),
        owner: text("owner"),
        station_type: text("type"),
        has_met: flag("met"),
        has_dart: flag("dart"),
    })
}
