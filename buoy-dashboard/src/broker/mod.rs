//! Message-queue client for the buoy download worker.
//!
//! The worker listens on a request queue for a bare station id, downloads
//! that station's realtime files and answers on a response queue with the
//! paths it wrote. [`RequestBroker`] runs that exchange in the background
//! and hands out [`FetchHandle`]s the caller can poll or await.

mod amqp;
mod error;
mod handle;
mod message;
mod mock;
mod session;
mod transport;

pub use amqp::{AmqpConfig, AmqpSession, AmqpTransport};
pub use error::{BrokerFailure, TransportError};
pub use handle::{FetchHandle, FetchState};
pub use message::{BuoyRequest, BuoyResponse, CorrelationToken, NO_FILES, ResponseStatus};
pub use mock::{MockReply, MockSession, MockTransport};
pub use session::{BrokerConfig, RequestBroker};
pub use transport::{QueueSession, QueueTransport};
