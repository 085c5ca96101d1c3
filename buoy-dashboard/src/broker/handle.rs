//! Caller-side view of an in-flight fetch.

use std::path::PathBuf;

use tokio::sync::watch;

use crate::domain::StationId;

use super::error::{BrokerFailure, TransportError};
use super::message::CorrelationToken;

/// Lifecycle of one fetch.
///
/// `Sent` → `AwaitingResponse` → one of the terminal states. A fetch can
/// also become `Superseded` or `Cancelled` from either non-terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    /// Submitted; the request is being published
    Sent,
    /// Published; waiting for the worker
    AwaitingResponse,
    /// The worker answered with these files (possibly none)
    Delivered(Vec<PathBuf>),
    /// The exchange failed
    Failed(BrokerFailure),
    /// A newer submit replaced this one; its response is dropped
    Superseded,
    /// The caller lost interest; its response is dropped
    Cancelled,
}

impl FetchState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FetchState::Sent | FetchState::AwaitingResponse)
    }
}

/// Handle returned by [`RequestBroker::submit`](super::RequestBroker::submit).
///
/// The state can be polled with [`state`](Self::state) from a UI loop or
/// awaited with [`outcome`](Self::outcome). Clones observe the same fetch.
#[derive(Debug, Clone)]
pub struct FetchHandle {
    token: CorrelationToken,
    station: StationId,
    state: watch::Receiver<FetchState>,
}

impl FetchHandle {
    pub(crate) fn new(
        token: CorrelationToken,
        station: StationId,
        state: watch::Receiver<FetchState>,
    ) -> Self {
        Self {
            token,
            station,
            state,
        }
    }

    pub fn token(&self) -> CorrelationToken {
        self.token
    }

    pub fn station(&self) -> &StationId {
        &self.station
    }

    /// Current state, without waiting.
    pub fn state(&self) -> FetchState {
        self.state.borrow().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.state.borrow().is_terminal()
    }

    /// Wait for a terminal state.
    pub async fn outcome(&mut self) -> FetchState {
        if let Ok(state) = self.state.wait_for(FetchState::is_terminal).await {
            return state.clone();
        }

        // The broker dropped the sender without resolving this fetch.
        let last = self.state.borrow().clone();
        if last.is_terminal() {
            last
        } else {
            FetchState::Failed(BrokerFailure::Transport(TransportError::Closed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(rx: watch::Receiver<FetchState>) -> FetchHandle {
        FetchHandle::new(CorrelationToken(1), StationId::parse("51002").unwrap(), rx)
    }

    #[test]
    fn terminal_states() {
        assert!(!FetchState::Sent.is_terminal());
        assert!(!FetchState::AwaitingResponse.is_terminal());
        assert!(FetchState::Delivered(Vec::new()).is_terminal());
        assert!(FetchState::Superseded.is_terminal());
        assert!(FetchState::Cancelled.is_terminal());
        assert!(FetchState::Failed(BrokerFailure::WorkerError("x".into())).is_terminal());
    }

    #[tokio::test]
    async fn outcome_waits_for_terminal_state() {
        let (tx, rx) = watch::channel(FetchState::Sent);
        let mut handle = handle(rx);
        assert!(!handle.is_finished());

        tokio::spawn(async move {
            tx.send_replace(FetchState::AwaitingResponse);
            tx.send_replace(FetchState::Delivered(vec![PathBuf::from("a.txt")]));
        });

        assert_eq!(
            handle.outcome().await,
            FetchState::Delivered(vec![PathBuf::from("a.txt")])
        );
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn dropped_sender_is_a_transport_failure() {
        let (tx, rx) = watch::channel(FetchState::AwaitingResponse);
        let mut handle = handle(rx);
        drop(tx);

        assert_eq!(
            handle.outcome().await,
            FetchState::Failed(BrokerFailure::Transport(TransportError::Closed))
        );
    }

    #[tokio::test]
    async fn dropped_sender_keeps_terminal_state() {
        let (tx, rx) = watch::channel(FetchState::Sent);
        let mut handle = handle(rx);
        tx.send_replace(FetchState::Superseded);
        drop(tx);

        assert_eq!(handle.outcome().await, FetchState::Superseded);
    }
}
