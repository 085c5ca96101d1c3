//! RabbitMQ transport.

use futures::StreamExt;
use lapin::options::{
    BasicConsumeOptions, BasicPublishOptions, QueueDeclareOptions, QueuePurgeOptions,
};
use lapin::types::{FieldTable, ShortString};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, Consumer};
use tracing::debug;

use super::error::TransportError;
use super::message::BuoyRequest;
use super::transport::{QueueSession, QueueTransport};

/// Default broker URL.
const DEFAULT_AMQP_URL: &str = "amqp://127.0.0.1:5672/%2f";

/// Queue the worker reads station ids from.
const DEFAULT_REQUEST_QUEUE: &str = "To_Microservice";

/// Queue the worker writes file lists to.
const DEFAULT_RESPONSE_QUEUE: &str = "To_Main_Program";

const CONSUMER_TAG: &str = "buoy-dashboard";

/// Configuration for the AMQP transport.
#[derive(Debug, Clone)]
pub struct AmqpConfig {
    /// Broker URL
    pub url: String,
    /// Outbound queue
    pub request_queue: String,
    /// Inbound queue
    pub response_queue: String,
}

impl AmqpConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_queue: DEFAULT_REQUEST_QUEUE.to_string(),
            response_queue: DEFAULT_RESPONSE_QUEUE.to_string(),
        }
    }

    /// Use different queue names.
    pub fn with_queues(
        mut self,
        request_queue: impl Into<String>,
        response_queue: impl Into<String>,
    ) -> Self {
        self.request_queue = request_queue.into();
        self.response_queue = response_queue.into();
        self
    }
}

impl Default for AmqpConfig {
    fn default() -> Self {
        Self::new(DEFAULT_AMQP_URL)
    }
}

/// Opens a fresh RabbitMQ connection per fetch.
#[derive(Debug, Clone)]
pub struct AmqpTransport {
    config: AmqpConfig,
}

impl AmqpTransport {
    pub fn new(config: AmqpConfig) -> Self {
        Self { config }
    }
}

impl QueueTransport for AmqpTransport {
    type Session = AmqpSession;

    async fn open(&self) -> Result<AmqpSession, TransportError> {
        let connect_err = |e: lapin::Error| TransportError::Connect(e.to_string());

        let connection = Connection::connect(&self.config.url, ConnectionProperties::default())
            .await
            .map_err(connect_err)?;
        let channel = connection.create_channel().await.map_err(connect_err)?;

        for queue in [&self.config.request_queue, &self.config.response_queue] {
            channel
                .queue_declare(queue, QueueDeclareOptions::default(), FieldTable::default())
                .await
                .map_err(connect_err)?;
        }

        Ok(AmqpSession {
            connection,
            channel,
            request_queue: self.config.request_queue.clone(),
            response_queue: self.config.response_queue.clone(),
            consumer: None,
            correlation: None,
        })
    }
}

/// One connection, one channel, one exchange.
pub struct AmqpSession {
    connection: Connection,
    channel: Channel,
    request_queue: String,
    response_queue: String,
    consumer: Option<Consumer>,
    correlation: Option<String>,
}

impl QueueSession for AmqpSession {
    async fn publish(&mut self, request: &BuoyRequest) -> Result<(), TransportError> {
        let publish_err = |e: lapin::Error| TransportError::Publish(e.to_string());

        // Leftovers belong to requests that already timed out.
        let purged = self
            .channel
            .queue_purge(&self.response_queue, QueuePurgeOptions::default())
            .await
            .map_err(publish_err)?;
        if purged > 0 {
            debug!(purged, queue = %self.response_queue, "dropped stale responses");
        }

        let correlation = request.correlation.to_string();
        let properties = BasicProperties::default()
            .with_correlation_id(ShortString::from(correlation.clone()))
            .with_reply_to(ShortString::from(self.response_queue.clone()));

        self.channel
            .basic_publish(
                "",
                &self.request_queue,
                BasicPublishOptions::default(),
                request.body(),
                properties,
            )
            .await
            .map_err(publish_err)?
            .await
            .map_err(publish_err)?;

        self.correlation = Some(correlation);
        Ok(())
    }

    async fn next_response(&mut self) -> Result<Vec<u8>, TransportError> {
        let consume_err = |e: lapin::Error| TransportError::Consume(e.to_string());

        if self.consumer.is_none() {
            let options = BasicConsumeOptions {
                no_ack: true,
                ..BasicConsumeOptions::default()
            };
            let consumer = self
                .channel
                .basic_consume(
                    &self.response_queue,
                    CONSUMER_TAG,
                    options,
                    FieldTable::default(),
                )
                .await
                .map_err(consume_err)?;
            self.consumer = Some(consumer);
        }
        let consumer = self.consumer.as_mut().ok_or(TransportError::Closed)?;

        while let Some(delivery) = consumer.next().await {
            let delivery = delivery.map_err(consume_err)?;

            // Workers that echo the correlation id get their replies matched;
            // replies without one are taken as ours. The NDBC worker does not
            // echo it, so a late reply to an abandoned request can still land
            // here; the coordinator drops files named for another station.
            if let (Some(expected), Some(got)) = (
                self.correlation.as_deref(),
                delivery.properties.correlation_id().as_ref(),
            ) && got.as_str() != expected
            {
                debug!(expected, got = got.as_str(), "skipping reply for another request");
                continue;
            }

            return Ok(delivery.data);
        }

        Err(TransportError::Closed)
    }

    async fn close(self) {
        if let Err(e) = self.channel.close(200, "done").await {
            debug!(error = %e, "failed to close channel");
        }
        if let Err(e) = self.connection.close(200, "done").await {
            debug!(error = %e, "failed to close connection");
        }
    }
}
