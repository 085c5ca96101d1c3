//! Request/response exchange with the download worker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use tracing::{debug, info, warn};

use crate::domain::StationId;

use super::error::{BrokerFailure, TransportError};
use super::handle::{FetchHandle, FetchState};
use super::message::{BuoyRequest, BuoyResponse, CorrelationToken, ResponseStatus};
use super::transport::{QueueSession, QueueTransport};

/// Default wait for the worker's response.
const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default wait for connecting to the queue broker.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the request broker.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// How long to wait for the worker after publishing.
    pub response_timeout: Duration,
    /// How long to wait for the queue connection.
    pub connect_timeout: Duration,
}

impl BrokerConfig {
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// The fetch whose response the caller still wants.
struct InFlight {
    token: CorrelationToken,
    state: watch::Sender<FetchState>,
}

struct Inner<T> {
    transport: T,
    config: BrokerConfig,
    next_token: AtomicU64,
    current: Mutex<Option<InFlight>>,
    /// One permit: only one task consumes the response queue at a time.
    lane: Semaphore,
}

/// Sends station requests to the worker and routes responses back.
///
/// Each [`submit`](Self::submit) spawns a task that opens its own queue
/// session, publishes, waits for one response and closes the session. Only
/// the latest submit is live: submitting again marks the previous handle
/// `Superseded` and its response, when it arrives, is dropped. Tasks run
/// one after another, so an older task finishes draining (or times out)
/// before a newer one starts consuming. A task whose fetch was superseded
/// or cancelled before its turn exits without publishing.
pub struct RequestBroker<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for RequestBroker<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: QueueTransport> RequestBroker<T> {
    pub fn new(transport: T, config: BrokerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                config,
                next_token: AtomicU64::new(0),
                current: Mutex::new(None),
                lane: Semaphore::new(1),
            }),
        }
    }

    /// Request files for `station`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, station: StationId) -> FetchHandle {
        let token = CorrelationToken(self.inner.next_token.fetch_add(1, Ordering::Relaxed) + 1);
        let (tx, rx) = watch::channel(FetchState::Sent);

        let previous = self.inner.lock_current().replace(InFlight { token, state: tx });
        if let Some(previous) = previous {
            debug!(superseded = %previous.token, by = %token, "superseding in-flight fetch");
            previous.state.send_replace(FetchState::Superseded);
        }

        let request = BuoyRequest {
            station: station.clone(),
            correlation: token,
        };
        info!(station = %station, %token, "submitting buoy request");

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run(request).await });

        FetchHandle::new(token, station, rx)
    }

    /// Stop caring about `handle`'s response.
    ///
    /// The background task keeps draining its response (or times out) so the
    /// queue is clean for the next request. Returns `false` if the handle was
    /// no longer live.
    pub fn cancel(&self, handle: &FetchHandle) -> bool {
        let mut current = self.inner.lock_current();
        match current.as_ref() {
            Some(in_flight) if in_flight.token == handle.token() => {
                if let Some(in_flight) = current.take() {
                    in_flight.state.send_replace(FetchState::Cancelled);
                }
                debug!(token = %handle.token(), "cancelled fetch");
                true
            }
            _ => false,
        }
    }

    /// Token of the live fetch, if any.
    pub fn in_flight(&self) -> Option<CorrelationToken> {
        self.inner.lock_current().as_ref().map(|f| f.token)
    }
}

impl<T: QueueTransport> Inner<T> {
    fn lock_current(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn run(self: Arc<Self>, request: BuoyRequest) {
        let token = request.correlation;

        let Ok(_permit) = self.lane.acquire().await else {
            self.resolve(token, FetchState::Failed(TransportError::Closed.into()));
            return;
        };

        // Superseded or cancelled while queued behind an older exchange:
        // nothing was published, so there is nothing to drain.
        if !self.is_current(token) {
            debug!(station = %request.station, %token, "dropping fetch that was never sent");
            return;
        }

        let state = match self.exchange(&request).await {
            Ok(response) => match response.status {
                ResponseStatus::Files(files) => FetchState::Delivered(files),
                ResponseStatus::NoFiles => FetchState::Delivered(Vec::new()),
                ResponseStatus::Error(reason) => {
                    FetchState::Failed(BrokerFailure::WorkerError(reason))
                }
            },
            Err(failure) => {
                warn!(station = %request.station, %token, error = %failure, "buoy request failed");
                FetchState::Failed(failure)
            }
        };

        self.resolve(token, state);
    }

    async fn exchange(&self, request: &BuoyRequest) -> Result<BuoyResponse, BrokerFailure> {
        let mut session = tokio::time::timeout(self.config.connect_timeout, self.transport.open())
            .await
            .map_err(|_| TransportError::Connect("timed out connecting to queue broker".into()))??;

        if let Err(e) = session.publish(request).await {
            session.close().await;
            return Err(e.into());
        }
        self.advance(request.correlation, FetchState::AwaitingResponse);

        let received =
            tokio::time::timeout(self.config.response_timeout, session.next_response()).await;
        session.close().await;

        match received {
            Err(_) => Err(BrokerFailure::Timeout(self.config.response_timeout)),
            Ok(Err(e)) => Err(e.into()),
            Ok(Ok(body)) => Ok(BuoyResponse::decode(&body)),
        }
    }

    fn is_current(&self, token: CorrelationToken) -> bool {
        self.lock_current()
            .as_ref()
            .is_some_and(|in_flight| in_flight.token == token)
    }

    /// Move a live fetch to a non-terminal state.
    fn advance(&self, token: CorrelationToken, state: FetchState) {
        let current = self.lock_current();
        if let Some(in_flight) = current.as_ref()
            && in_flight.token == token
        {
            in_flight.state.send_replace(state);
        }
    }

    /// Deliver a terminal state if `token` is still live, otherwise drop it.
    fn resolve(&self, token: CorrelationToken, state: FetchState) {
        let mut current = self.lock_current();
        match current.take() {
            Some(in_flight) if in_flight.token == token => {
                debug!(%token, ?state, "fetch resolved");
                in_flight.state.send_replace(state);
            }
            other => {
                *current = other;
                debug!(%token, "discarding response for superseded fetch");
            }
        }
    }
}
