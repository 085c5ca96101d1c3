//! Queue transport abstraction.

use std::future::Future;

use super::error::TransportError;
use super::message::BuoyRequest;

/// Opens one queue session per fetch.
pub trait QueueTransport: Send + Sync + 'static {
    type Session: QueueSession;

    /// Connect and declare the request and response queues.
    fn open(&self) -> impl Future<Output = Result<Self::Session, TransportError>> + Send;
}

/// A connection owned by a single fetch, used for exactly one exchange.
pub trait QueueSession: Send + 'static {
    /// Publish the request to the worker.
    fn publish(
        &mut self,
        request: &BuoyRequest,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Wait for the next response body addressed to this session.
    fn next_response(&mut self) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;

    /// Close the connection. Errors are logged, not returned.
    fn close(self) -> impl Future<Output = ()> + Send;
}
