//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::warn;

use crate::broker::QueueTransport;
use crate::catalog::{CatalogSource, FetchError};
use crate::coordinator::ReadingOutcome;
use crate::domain::{InvalidQuery, InvalidStationId, LatLon, SearchQuery, StationId};
use crate::geocode::{GeocodeError, Geocoder};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<G, C, T>(state: AppState<G, C, T>) -> Router
where
    G: Geocoder + 'static,
    C: CatalogSource + 'static,
    T: QueueTransport,
{
    Router::new()
        .route("/health", get(health))
        .route("/api/locate", get(locate::<G, C, T>))
        .route("/api/stations", get(find_stations::<G, C, T>))
        .route("/api/readings", post(fetch_reading::<G, C, T>))
        .route(
            "/api/readings/current",
            get(current_reading::<G, C, T>).delete(cancel_reading::<G, C, T>),
        )
        .route("/api/session", get(session::<G, C, T>))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Geocode an address and make it the search center.
async fn locate<G, C, T>(
    State(state): State<AppState<G, C, T>>,
    Query(req): Query<LocateRequest>,
) -> Result<Json<LocateResponse>, AppError>
where
    G: Geocoder + 'static,
    C: CatalogSource + 'static,
    T: QueueTransport,
{
    let mut coordinator = state.coordinator.lock().await;
    let position = coordinator.locate(&req.address).await?;

    Ok(Json(LocateResponse {
        address: req.address.trim().to_string(),
        lat: position.lat(),
        lon: position.lon(),
    }))
}

/// Stations within a radius of the given point, or of the located address.
async fn find_stations<G, C, T>(
    State(state): State<AppState<G, C, T>>,
    Query(req): Query<StationSearchRequest>,
) -> Result<Json<StationSearchResponse>, AppError>
where
    G: Geocoder + 'static,
    C: CatalogSource + 'static,
    T: QueueTransport,
{
    let mut coordinator = state.coordinator.lock().await;

    let center = match (req.lat, req.lon) {
        (Some(lat), Some(lon)) => LatLon::new(lat, lon)?,
        (None, None) => coordinator
            .session()
            .location()
            .ok_or_else(|| AppError::BadRequest {
                message: "no search center: pass lat and lon, or locate an address first".into(),
            })?,
        _ => {
            return Err(AppError::BadRequest {
                message: "lat and lon must be given together".into(),
            });
        }
    };
    let query = SearchQuery::new(center, req.radius_miles)?;
    let stations = coordinator.find_stations(query).await?;

    Ok(Json(StationSearchResponse {
        center: center.into(),
        radius_miles: query.radius_miles(),
        bounding_box: query.bounding_box(),
        stations: stations.iter().map(Into::into).collect(),
    }))
}

/// Ask the worker for a station's latest files.
async fn fetch_reading<G, C, T>(
    State(state): State<AppState<G, C, T>>,
    Json(req): Json<FetchReadingRequest>,
) -> Result<impl IntoResponse, AppError>
where
    G: Geocoder + 'static,
    C: CatalogSource + 'static,
    T: QueueTransport,
{
    let station = StationId::parse(&req.station)?;
    let mut coordinator = state.coordinator.lock().await;
    let handle = coordinator.fetch_reading(station);

    Ok((
        StatusCode::ACCEPTED,
        Json(FetchReadingResponse {
            token: handle.token().to_string(),
            station: handle.station().to_string(),
            state: state_label(&handle.state()).to_string(),
        }),
    ))
}

/// Poll the pending fetch and return the reading on display.
async fn current_reading<G, C, T>(
    State(state): State<AppState<G, C, T>>,
) -> Json<ReadingStatusResponse>
where
    G: Geocoder + 'static,
    C: CatalogSource + 'static,
    T: QueueTransport,
{
    let mut coordinator = state.coordinator.lock().await;
    let outcome = coordinator.poll_reading().await;

    let (status, fetch_state) = match &outcome {
        ReadingOutcome::Idle => ("idle", None),
        ReadingOutcome::Pending(s) => ("pending", Some(state_label(s))),
        ReadingOutcome::Ready(_) => ("ready", None),
        ReadingOutcome::Failed(_) => ("failed", None),
        ReadingOutcome::Discarded(s) => (state_label(s), None),
    };

    let session = coordinator.session();
    Json(ReadingStatusResponse {
        status: status.to_string(),
        state: fetch_state.map(str::to_string),
        station: session.selected_station().map(ToString::to_string),
        error: session.last_failure().map(ToString::to_string),
        reading: session.reading().as_deref().map(ReadingResult::from),
    })
}

/// Drop interest in the pending fetch.
async fn cancel_reading<G, C, T>(State(state): State<AppState<G, C, T>>) -> Json<CancelResponse>
where
    G: Geocoder + 'static,
    C: CatalogSource + 'static,
    T: QueueTransport,
{
    let mut coordinator = state.coordinator.lock().await;
    Json(CancelResponse {
        cancelled: coordinator.cancel_reading(),
    })
}

/// What the dashboard currently shows.
async fn session<G, C, T>(State(state): State<AppState<G, C, T>>) -> Json<SessionResponse>
where
    G: Geocoder + 'static,
    C: CatalogSource + 'static,
    T: QueueTransport,
{
    let coordinator = state.coordinator.lock().await;
    let session = coordinator.session();

    Json(SessionResponse {
        address: session.address().map(str::to_string),
        location: session.location().map(Into::into),
        radius_miles: session.last_query().map(SearchQuery::radius_miles),
        stations: session.stations().iter().map(Into::into).collect(),
        selected_station: session.selected_station().map(ToString::to_string),
        pending: session.pending_state().map(|s| state_label(&s).to_string()),
        last_error: session.last_failure().map(ToString::to_string),
        has_reading: session.reading().is_some(),
    })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Upstream { message: String },
}

impl From<InvalidQuery> for AppError {
    fn from(e: InvalidQuery) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<InvalidStationId> for AppError {
    fn from(e: InvalidStationId) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<GeocodeError> for AppError {
    fn from(e: GeocodeError) -> Self {
        match e {
            GeocodeError::NoResults => AppError::NotFound {
                message: e.to_string(),
            },
            _ => AppError::Upstream {
                message: e.to_string(),
            },
        }
    }
}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        AppError::Upstream {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Upstream { message } => (StatusCode::BAD_GATEWAY, message),
        };

        warn!(%status, %message, "request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
