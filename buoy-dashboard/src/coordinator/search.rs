//! Geocode → catalog → broker → parser orchestration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::broker::{BrokerFailure, FetchHandle, FetchState, QueueTransport, RequestBroker};
use crate::catalog::{CatalogSource, FetchError, StationCatalog};
use crate::domain::{LatLon, SearchQuery, Station, StationId};
use crate::geocode::{GeocodeError, Geocoder};
use crate::observation::{FileKind, ReadingBuilder, ReadingIssue, StationReading};

use super::session::SessionState;

/// Where a reading request stands, as seen by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingOutcome {
    /// Nothing has been requested
    Idle,
    /// The worker has not answered yet
    Pending(FetchState),
    /// A new reading is on display
    Ready(Arc<StationReading>),
    /// The fetch failed; the previous reading stays on display
    Failed(BrokerFailure),
    /// The fetch was superseded or cancelled and its result dropped
    Discarded(FetchState),
}

/// The seam a UI calls into.
///
/// Owns the [`SessionState`]; every operation that changes what the user
/// sees goes through `&mut self`.
pub struct SearchCoordinator<G, C, T> {
    geocoder: G,
    catalog: StationCatalog<C>,
    broker: RequestBroker<T>,
    session: SessionState,
}

impl<G, C, T> SearchCoordinator<G, C, T>
where
    G: Geocoder,
    C: CatalogSource,
    T: QueueTransport,
{
    pub fn new(geocoder: G, catalog: StationCatalog<C>, broker: RequestBroker<T>) -> Self {
        Self {
            geocoder,
            catalog,
            broker,
            session: SessionState::default(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn catalog(&self) -> &StationCatalog<C> {
        &self.catalog
    }

    pub fn broker(&self) -> &RequestBroker<T> {
        &self.broker
    }

    /// Geocode `address` and remember it as the search center.
    ///
    /// On failure the session keeps its previous address and location.
    pub async fn locate(&mut self, address: &str) -> Result<LatLon, GeocodeError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(GeocodeError::NoResults);
        }

        let position = self.geocoder.geocode(address).await?;
        info!(address, lat = position.lat(), lon = position.lon(), "located address");
        self.session.address = Some(address.to_string());
        self.session.location = Some(position);
        Ok(position)
    }

    /// Refresh the catalog and return the stations inside `query`'s box.
    ///
    /// A failed refresh is served from whatever catalog is already loaded,
    /// then from the cache file regardless of age. The error is returned
    /// only when neither has any stations.
    pub async fn find_stations(&mut self, query: SearchQuery) -> Result<Vec<Station>, FetchError> {
        if let Err(e) = self.catalog.refresh().await {
            if self.catalog.is_empty() && self.catalog.fallback_to_cache() == 0 {
                return Err(e);
            }
            warn!(error = %e, stations = self.catalog.len(), "catalog refresh failed, serving stale catalog");
        }

        let stations = self.catalog.query(&query.bounding_box());
        debug!(
            lat = query.center().lat(),
            lon = query.center().lon(),
            radius_miles = query.radius_miles(),
            count = stations.len(),
            "station search"
        );
        self.session.last_query = Some(query);
        self.session.stations = stations.clone();
        Ok(stations)
    }

    /// Ask the worker for `station`'s latest files.
    ///
    /// Replaces any fetch the session was still waiting on.
    pub fn fetch_reading(&mut self, station: StationId) -> FetchHandle {
        let handle = self.broker.submit(station.clone());
        self.session.selected = Some(station);
        self.session.pending = Some(handle.clone());
        handle
    }

    /// Check the pending fetch without waiting.
    pub async fn poll_reading(&mut self) -> ReadingOutcome {
        let Some(handle) = self.session.pending.clone() else {
            return ReadingOutcome::Idle;
        };
        let state = handle.state();
        self.settle(&handle, state).await
    }

    /// Wait for `handle` to finish.
    ///
    /// Only the session's latest fetch can change the reading; an older
    /// handle comes back as `Discarded`.
    pub async fn await_reading(&mut self, mut handle: FetchHandle) -> ReadingOutcome {
        let state = handle.outcome().await;
        self.settle(&handle, state).await
    }

    /// Give up on the pending fetch. Returns `false` if there was none.
    pub fn cancel_reading(&mut self) -> bool {
        match self.session.pending.take() {
            Some(handle) => self.broker.cancel(&handle),
            None => false,
        }
    }

    async fn settle(&mut self, handle: &FetchHandle, state: FetchState) -> ReadingOutcome {
        let is_current = self
            .session
            .pending
            .as_ref()
            .is_some_and(|pending| pending.token() == handle.token());

        match state {
            FetchState::Sent | FetchState::AwaitingResponse => ReadingOutcome::Pending(state),
            _ if !is_current => {
                debug!(token = %handle.token(), "ignoring result of an outdated fetch");
                ReadingOutcome::Discarded(match state {
                    FetchState::Cancelled => FetchState::Cancelled,
                    _ => FetchState::Superseded,
                })
            }
            FetchState::Delivered(files) => {
                self.session.pending = None;
                let (own, foreign): (Vec<_>, Vec<_>) = files
                    .into_iter()
                    .partition(|path| names_station(path, handle.station()));
                let mut reading = build_reading(&own).await;
                if !foreign.is_empty() {
                    warn!(
                        station = %handle.station(),
                        ignored = foreign.len(),
                        "response listed files for another station"
                    );
                    reading.issues.extend(foreign.into_iter().map(|file| ReadingIssue {
                        file,
                        message: format!("ignored: not a file of station {}", handle.station()),
                    }));
                }
                let reading = Arc::new(reading);
                info!(
                    station = %handle.station(),
                    files = own.len(),
                    empty = reading.is_empty(),
                    "reading updated"
                );
                self.session.reading = Some(Arc::clone(&reading));
                self.session.last_failure = None;
                ReadingOutcome::Ready(reading)
            }
            FetchState::Failed(failure) => {
                self.session.pending = None;
                self.session.last_failure = Some(failure.clone());
                ReadingOutcome::Failed(failure)
            }
            FetchState::Superseded | FetchState::Cancelled => {
                self.session.pending = None;
                ReadingOutcome::Discarded(state)
            }
        }
    }
}

/// Whether the file name carries `station`'s id, ignoring case.
fn names_station(path: &Path, station: &StationId) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            name.to_ascii_lowercase()
                .contains(&station.as_str().to_ascii_lowercase())
        })
}

/// Read and parse the delivered files.
///
/// Files are classified by extension; unknown types are skipped without
/// being read. Unreadable files become issues on the reading. No files
/// means a reading with every sub-record absent.
pub async fn build_reading(files: &[PathBuf]) -> StationReading {
    let mut builder = ReadingBuilder::new();

    for path in files {
        match FileKind::classify(path) {
            Some(FileKind::Tide | FileKind::WeatherSummary) => {
                match tokio::fs::read_to_string(path).await {
                    Ok(contents) => builder.add_file(path, &contents),
                    Err(e) => builder.add_issue(path, format!("failed to read file: {e}")),
                }
            }
            Some(FileKind::SpectralSwell) | None => builder.add_file(path, ""),
        }
    }

    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{BrokerConfig, MockReply, MockTransport, NO_FILES, TransportError};
    use crate::catalog::{CatalogCache, CatalogCacheConfig, StaticCatalogSource};
    use crate::geocode::StaticGeocoder;
    use crate::observation::Measurement;
    use std::time::Duration;
    use tempfile::tempdir;

    const MET: &str = "\
#YY  MM DD hh mm WDIR WSPD GST  WVHT   DPD   APD MWD   PRES  ATMP  WTMP  DEWP  VIS PTDY  TIDE
#yr  mo dy hr mn degT m/s  m/s     m   sec   sec degT   hPa  degC  degC  degC  nmi  hPa    ft
2024 03 15 12 00  80  6.0  7.0   1.8  12.0   6.1  95 1016.2  24.1  25.3  19.0   MM   MM    MM
";

    const DART: &str = "\
#YY  MM DD hh mm ss T   HEIGHT
#yr  mo dy hr mn  s -      m
2024 03 15 12 00 00 1 5792.345
2024 03 15 11 45 00 1 5792.350
";

    type Coordinator = SearchCoordinator<StaticGeocoder, StaticCatalogSource, MockTransport>;

    fn id(s: &str) -> StationId {
        StationId::parse(s).unwrap()
    }

    fn station(s: &str, lat: f64, lon: f64) -> Station {
        Station::new(id(s), LatLon::new(lat, lon).unwrap())
    }

    fn abc() -> Vec<Station> {
        vec![
            station("A", 10.0, 20.0),
            station("B", 10.5, 20.5),
            station("C", 30.0, 30.0),
        ]
    }

    fn coordinator(source: StaticCatalogSource, transport: MockTransport) -> Coordinator {
        let config = BrokerConfig::default()
            .with_response_timeout(Duration::from_millis(200))
            .with_connect_timeout(Duration::from_millis(200));
        SearchCoordinator::new(
            StaticGeocoder::new(),
            StationCatalog::new(source),
            RequestBroker::new(transport, config),
        )
    }

    fn ids(stations: &[Station]) -> Vec<&str> {
        stations.iter().map(|s| s.id.as_str()).collect()
    }

    #[tokio::test]
    async fn locate_then_find_stations() {
        let geocoder = StaticGeocoder::new();
        geocoder.insert("Somewhere at sea", LatLon::new(10.0, 20.0).unwrap());
        let mut coordinator = SearchCoordinator::new(
            geocoder,
            StationCatalog::new(StaticCatalogSource::new(abc())),
            RequestBroker::new(MockTransport::new(), BrokerConfig::default()),
        );

        let center = coordinator.locate("  Somewhere at sea ").await.unwrap();
        assert_eq!(coordinator.session().address(), Some("Somewhere at sea"));
        assert_eq!(coordinator.session().location(), Some(center));

        let query = SearchQuery::new(center, 69.0).unwrap();
        let found = coordinator.find_stations(query).await.unwrap();
        assert_eq!(ids(&found), vec!["A", "B"]);
        assert_eq!(ids(coordinator.session().stations()), vec!["A", "B"]);
        assert_eq!(coordinator.session().last_query(), Some(&query));
    }

    #[tokio::test]
    async fn failed_locate_leaves_session_untouched() {
        let geocoder = StaticGeocoder::new();
        geocoder.insert("Hilo", LatLon::new(19.7, -155.1).unwrap());
        geocoder.fail("Atlantis", GeocodeError::Status { status: 503 });
        let mut coordinator = SearchCoordinator::new(
            geocoder,
            StationCatalog::new(StaticCatalogSource::new(abc())),
            RequestBroker::new(MockTransport::new(), BrokerConfig::default()),
        );

        coordinator.locate("Hilo").await.unwrap();
        assert_eq!(
            coordinator.locate("Atlantis").await,
            Err(GeocodeError::Status { status: 503 })
        );
        assert_eq!(coordinator.locate("   ").await, Err(GeocodeError::NoResults));
        assert_eq!(coordinator.session().address(), Some("Hilo"));
        assert_eq!(
            coordinator.session().location(),
            Some(LatLon::new(19.7, -155.1).unwrap())
        );
    }

    #[tokio::test]
    async fn find_stations_serves_stale_catalog_after_failed_refresh() {
        let source = StaticCatalogSource::new(abc());
        let mut coordinator = coordinator(source.clone(), MockTransport::new());
        let query = SearchQuery::from_degrees(10.0, 20.0, 69.0).unwrap();
        coordinator.find_stations(query).await.unwrap();

        source.fail_with(FetchError::Network {
            message: "HTTP 503".into(),
        });
        let found = coordinator.find_stations(query).await.unwrap();
        assert_eq!(ids(&found), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn find_stations_falls_back_to_cache_file() {
        let dir = tempdir().unwrap();
        let config = CatalogCacheConfig::new(dir.path().join("catalog.json"))
            .with_ttl(Duration::from_secs(0));
        let cache = CatalogCache::new(config);
        cache.save(&abc()).unwrap();

        let source = StaticCatalogSource::failing(FetchError::Format {
            message: "no root element".into(),
        });
        let mut coordinator = SearchCoordinator::new(
            StaticGeocoder::new(),
            StationCatalog::new(source).with_cache(cache),
            RequestBroker::new(MockTransport::new(), BrokerConfig::default()),
        );

        let query = SearchQuery::from_degrees(10.0, 20.0, 69.0).unwrap();
        let found = coordinator.find_stations(query).await.unwrap();
        assert_eq!(ids(&found), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn find_stations_without_any_catalog_is_an_error() {
        let source = StaticCatalogSource::failing(FetchError::Network {
            message: "offline".into(),
        });
        let mut coordinator = coordinator(source, MockTransport::new());

        let query = SearchQuery::from_degrees(10.0, 20.0, 69.0).unwrap();
        assert_eq!(
            coordinator.find_stations(query).await,
            Err(FetchError::Network {
                message: "offline".into()
            })
        );
        assert!(coordinator.session().last_query().is_none());
    }

    #[tokio::test]
    async fn delivered_files_become_the_reading() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("51002.txt"), MET).unwrap();
        std::fs::write(dir.path().join("51002.dart"), DART).unwrap();
        std::fs::write(dir.path().join("51002.spec"), "spectral").unwrap();

        let mut coordinator =
            coordinator(StaticCatalogSource::new(abc()), MockTransport::from_dir(dir.path()));
        let handle = coordinator.fetch_reading(id("51002"));
        assert_eq!(coordinator.session().selected_station(), Some(&id("51002")));

        let ReadingOutcome::Ready(reading) = coordinator.await_reading(handle).await else {
            panic!("expected a reading");
        };
        assert_eq!(reading.tide.as_ref().unwrap().len(), 2);
        let weather = reading.weather.as_ref().unwrap();
        assert_eq!(weather.air_temperature, Measurement::Value(24.1));
        assert_eq!(weather.wind_speed, Measurement::Value(6.0));
        assert!(reading.swell.is_none());
        assert!(reading.issues.is_empty());

        assert_eq!(coordinator.session().reading(), Some(reading));
        assert!(coordinator.session().pending().is_none());
        assert_eq!(coordinator.poll_reading().await, ReadingOutcome::Idle);
    }

    #[tokio::test]
    async fn no_files_is_an_empty_reading() {
        let transport = MockTransport::new();
        transport.reply(id("51002"), MockReply::body(NO_FILES));
        let mut coordinator = coordinator(StaticCatalogSource::new(abc()), transport);

        let handle = coordinator.fetch_reading(id("51002"));
        let ReadingOutcome::Ready(reading) = coordinator.await_reading(handle).await else {
            panic!("expected a reading");
        };
        assert!(reading.is_empty());
        assert_eq!(*reading, StationReading::default());
    }

    #[tokio::test]
    async fn only_latest_fetch_reaches_the_reading() {
        let dir = tempdir().unwrap();
        let first_file = dir.path().join("AAAAA.txt");
        std::fs::write(&first_file, MET).unwrap();

        let transport = MockTransport::new();
        transport.reply(
            id("AAAAA"),
            MockReply::body(first_file.display().to_string()).after(Duration::from_millis(30)),
        );
        transport.reply(id("BBBBB"), MockReply::body(NO_FILES));
        let mut coordinator = coordinator(StaticCatalogSource::new(abc()), transport);

        let first = coordinator.fetch_reading(id("AAAAA"));
        let second = coordinator.fetch_reading(id("BBBBB"));

        assert_eq!(
            coordinator.await_reading(first).await,
            ReadingOutcome::Discarded(FetchState::Superseded)
        );
        assert!(coordinator.session().reading().is_none());
        assert!(coordinator.session().pending().is_some());

        let ReadingOutcome::Ready(reading) = coordinator.await_reading(second).await else {
            panic!("expected a reading");
        };
        // The weather file belonged to the superseded fetch.
        assert!(reading.weather.is_none());
        assert!(reading.is_empty());
        assert_eq!(coordinator.session().selected_station(), Some(&id("BBBBB")));
    }

    #[tokio::test]
    async fn poll_reports_pending_then_ready() {
        let transport = MockTransport::new();
        transport.reply(
            id("51002"),
            MockReply::body(NO_FILES).after(Duration::from_millis(50)),
        );
        let mut coordinator = coordinator(StaticCatalogSource::new(abc()), transport);

        assert_eq!(coordinator.poll_reading().await, ReadingOutcome::Idle);
        let mut handle = coordinator.fetch_reading(id("51002"));
        assert!(matches!(
            coordinator.poll_reading().await,
            ReadingOutcome::Pending(_)
        ));

        handle.outcome().await;
        assert!(matches!(
            coordinator.poll_reading().await,
            ReadingOutcome::Ready(_)
        ));
    }

    #[tokio::test]
    async fn failure_keeps_previous_reading() {
        let transport = MockTransport::new();
        transport.reply(id("51002"), MockReply::body(NO_FILES));
        let mut coordinator = coordinator(StaticCatalogSource::new(abc()), transport.clone());

        let handle = coordinator.fetch_reading(id("51002"));
        coordinator.await_reading(handle).await;
        let before = coordinator.session().reading();
        assert!(before.is_some());

        transport.fail_open("connection refused");
        let handle = coordinator.fetch_reading(id("51002"));
        let outcome = coordinator.await_reading(handle).await;
        assert_eq!(
            outcome,
            ReadingOutcome::Failed(BrokerFailure::Transport(TransportError::Connect(
                "connection refused".into()
            )))
        );
        assert_eq!(coordinator.session().reading(), before);
        assert!(coordinator.session().last_failure().is_some());
    }

    #[tokio::test]
    async fn cancel_drops_the_pending_fetch() {
        let transport = MockTransport::new();
        transport.reply(
            id("51002"),
            MockReply::body(NO_FILES).after(Duration::from_millis(30)),
        );
        let mut coordinator = coordinator(StaticCatalogSource::new(abc()), transport);

        let handle = coordinator.fetch_reading(id("51002"));
        assert!(coordinator.cancel_reading());
        assert!(!coordinator.cancel_reading());
        assert_eq!(
            coordinator.await_reading(handle).await,
            ReadingOutcome::Discarded(FetchState::Cancelled)
        );
        assert!(coordinator.session().reading().is_none());
    }

    #[tokio::test]
    async fn files_for_another_station_are_ignored() {
        let dir = tempdir().unwrap();
        let late = dir.path().join("46042.txt");
        std::fs::write(&late, MET).unwrap();

        let transport = MockTransport::new();
        transport.reply(id("51002"), MockReply::body(late.display().to_string()));
        let mut coordinator = coordinator(StaticCatalogSource::new(abc()), transport);

        let handle = coordinator.fetch_reading(id("51002"));
        let ReadingOutcome::Ready(reading) = coordinator.await_reading(handle).await else {
            panic!("expected a reading");
        };
        assert!(reading.weather.is_none());
        assert!(reading.is_empty());
        assert_eq!(reading.issues.len(), 1);
        assert_eq!(reading.issues[0].file, late);
        assert!(reading.issues[0].message.contains("51002"));
    }

    #[test]
    fn station_match_ignores_case_and_directory() {
        let station = id("TPLM2");
        assert!(names_station(Path::new("/data/51002/tplm2.txt"), &station));
        assert!(names_station(Path::new("TPLM2h2024.dart"), &station));
        assert!(!names_station(Path::new("/data/tplm2/46042.txt"), &station));
    }

    #[tokio::test]
    async fn build_reading_records_unreadable_files() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone.txt");
        let reading = build_reading(&[missing.clone(), dir.path().join("x.drift")]).await;

        assert!(reading.is_empty());
        assert_eq!(reading.issues.len(), 1);
        assert_eq!(reading.issues[0].file, missing);
        assert!(reading.issues[0].message.starts_with("failed to read file"));
    }
}
