//! Broker error types.

use std::time::Duration;

/// Failures talking to the message queue itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Could not connect, open a channel or declare the queues
    #[error("connect failed: {0}")]
    Connect(String),

    /// The request could not be published
    #[error("publish failed: {0}")]
    Publish(String),

    /// Consuming the response failed
    #[error("consume failed: {0}")]
    Consume(String),

    /// The connection closed before a response arrived
    #[error("connection closed before a response arrived")]
    Closed,
}

/// Why a fetch did not deliver a file list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerFailure {
    /// No response within the configured wait
    #[error("no response within {}s", .0.as_secs())]
    Timeout(Duration),

    /// The queue connection failed
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The worker answered with something other than a file list
    #[error("worker error: {0}")]
    WorkerError(String),
}
