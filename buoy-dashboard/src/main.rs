use std::error::Error;
use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use buoy_dashboard::broker::{AmqpTransport, MockTransport, QueueTransport, RequestBroker};
use buoy_dashboard::catalog::{
    CatalogCache, CatalogClient, CatalogSource, FileCatalogSource, StationCatalog,
};
use buoy_dashboard::config::AppConfig;
use buoy_dashboard::coordinator::SearchCoordinator;
use buoy_dashboard::geocode::{CachedGeocoder, GeocodeCacheConfig, NominatimClient};
use buoy_dashboard::web::{AppState, create_router};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info,buoy_dashboard=debug";

type AppGeocoder = CachedGeocoder<NominatimClient>;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "buoy dashboard stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;

    let geocoder = CachedGeocoder::new(
        NominatimClient::new(config.geocoder.clone())?,
        &GeocodeCacheConfig::default(),
    );

    if let Some(path) = config.catalog_file.clone() {
        info!(path = %path.display(), "reading station catalog from file");
        with_transport(config, geocoder, FileCatalogSource::new(path)).await
    } else {
        let source = CatalogClient::new(config.catalog.clone())?;
        with_transport(config, geocoder, source).await
    }
}

async fn with_transport<C>(
    config: AppConfig,
    geocoder: AppGeocoder,
    source: C,
) -> Result<(), Box<dyn Error>>
where
    C: CatalogSource + 'static,
{
    if let Some(dir) = config.mock_data_dir.clone() {
        warn!(dir = %dir.display(), "answering buoy requests from local files, not the queue");
        serve(config, geocoder, source, MockTransport::from_dir(dir)).await
    } else {
        let transport = AmqpTransport::new(config.amqp.clone());
        serve(config, geocoder, source, transport).await
    }
}

async fn serve<C, T>(
    config: AppConfig,
    geocoder: AppGeocoder,
    source: C,
    transport: T,
) -> Result<(), Box<dyn Error>>
where
    C: CatalogSource + 'static,
    T: QueueTransport,
{
    let catalog =
        StationCatalog::new(source).with_cache(CatalogCache::new(config.catalog_cache.clone()));

    // A fresh cache spares the first search a slow download.
    if catalog.warm_from_cache() == 0 {
        match catalog.refresh().await {
            Ok(count) => info!(count, "loaded station catalog"),
            Err(e) => {
                let stale = catalog.fallback_to_cache();
                warn!(error = %e, stale, "station catalog unavailable at startup");
            }
        }
    }

    let broker = RequestBroker::new(transport, config.broker.clone());
    let coordinator = SearchCoordinator::new(geocoder, catalog, broker);
    let app = create_router(AppState::new(coordinator));

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, "buoy dashboard listening");
    info!("  GET    /health                 - health check");
    info!("  GET    /api/locate             - geocode an address");
    info!("  GET    /api/stations           - stations within a radius");
    info!("  POST   /api/readings           - request a station reading");
    info!("  GET    /api/readings/current   - poll the reading");
    info!("  DELETE /api/readings/current   - cancel the pending request");
    info!("  GET    /api/session            - session snapshot");

    axum::serve(listener, app).await?;
    Ok(())
}
