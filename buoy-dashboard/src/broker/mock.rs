//! In-process stand-in for the download worker.
//!
//! Serves scripted replies per station, or, when pointed at a directory,
//! answers with the files in it whose stem is the requested station id
//! (`51002.txt`, `51002.dart`, ...). Useful for development without a
//! queue broker and for tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::debug;

use crate::domain::StationId;

use super::error::TransportError;
use super::message::{BuoyRequest, NO_FILES};
use super::transport::{QueueSession, QueueTransport};

#[derive(Debug, Clone)]
enum ReplyKind {
    Body(Vec<u8>),
    Silence,
    ConsumeError(String),
}

/// A scripted worker reply.
#[derive(Debug, Clone)]
pub struct MockReply {
    kind: ReplyKind,
    delay: Duration,
}

impl MockReply {
    /// Reply with `body`.
    pub fn body(body: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Body(body.into().into_bytes()),
            delay: Duration::ZERO,
        }
    }

    /// Reply with raw bytes.
    pub fn bytes(body: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: ReplyKind::Body(body.into()),
            delay: Duration::ZERO,
        }
    }

    /// Never reply.
    pub fn silence() -> Self {
        Self {
            kind: ReplyKind::Silence,
            delay: Duration::ZERO,
        }
    }

    /// Fail while consuming.
    pub fn consume_error(message: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::ConsumeError(message.into()),
            delay: Duration::ZERO,
        }
    }

    /// Reply only after `delay`.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Default)]
struct MockState {
    replies: HashMap<StationId, MockReply>,
    data_dir: Option<PathBuf>,
    open_error: Option<String>,
    published: Vec<StationId>,
}

/// Mock queue transport.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// A transport answering `No files downloaded` unless scripted otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport answering from the files in `dir`.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        let transport = Self::new();
        transport.lock().data_dir = Some(dir.into());
        transport
    }

    /// Script the reply for `station`.
    pub fn reply(&self, station: StationId, reply: MockReply) {
        self.lock().replies.insert(station, reply);
    }

    /// Make every `open` fail with a connect error.
    pub fn fail_open(&self, message: impl Into<String>) {
        self.lock().open_error = Some(message.into());
    }

    /// Undo [`fail_open`](Self::fail_open).
    pub fn recover(&self) {
        self.lock().open_error = None;
    }

    /// Stations published so far, in order.
    pub fn published(&self) -> Vec<StationId> {
        self.lock().published.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl QueueTransport for MockTransport {
    type Session = MockSession;

    async fn open(&self) -> Result<MockSession, TransportError> {
        if let Some(message) = self.lock().open_error.clone() {
            return Err(TransportError::Connect(message));
        }
        Ok(MockSession {
            transport: self.clone(),
            station: None,
        })
    }
}

/// One mock exchange.
#[derive(Debug)]
pub struct MockSession {
    transport: MockTransport,
    station: Option<StationId>,
}

impl QueueSession for MockSession {
    async fn publish(&mut self, request: &BuoyRequest) -> Result<(), TransportError> {
        self.transport
            .lock()
            .published
            .push(request.station.clone());
        self.station = Some(request.station.clone());
        Ok(())
    }

    async fn next_response(&mut self) -> Result<Vec<u8>, TransportError> {
        let station = self.station.clone().ok_or(TransportError::Closed)?;
        let (scripted, data_dir) = {
            let state = self.transport.lock();
            (state.replies.get(&station).cloned(), state.data_dir.clone())
        };

        let Some(reply) = scripted else {
            return Ok(match data_dir {
                Some(dir) => files_for(&dir, &station).await,
                None => NO_FILES.as_bytes().to_vec(),
            });
        };

        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        match reply.kind {
            ReplyKind::Body(body) => Ok(body),
            ReplyKind::Silence => std::future::pending().await,
            ReplyKind::ConsumeError(message) => Err(TransportError::Consume(message)),
        }
    }

    async fn close(self) {}
}

/// Response body listing `dir/{station}.*`.
async fn files_for(dir: &std::path::Path, station: &StationId) -> Vec<u8> {
    let mut files = Vec::new();
    if let Ok(mut entries) = tokio::fs::read_dir(dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.file_stem().and_then(|s| s.to_str()) == Some(station.as_str()) {
                files.push(path.display().to_string());
            }
        }
    }
    files.sort();
    debug!(station = %station, count = files.len(), "mock worker answering from directory");

    if files.is_empty() {
        NO_FILES.as_bytes().to_vec()
    } else {
        files.join(", ").into_bytes()
    }
}
