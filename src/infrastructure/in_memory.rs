use crate::domain::events::{CLIENT_DISCONNECT, EventSink, TransportEvent};
use crate::domain::ports::Transport;
use crate::error::{DealyzeError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A message handed to [`Transport::emit`].
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub channel: String,
    pub payload: Value,
}

#[derive(Default)]
struct Recorded {
    connects: Vec<String>,
    emissions: Vec<Emission>,
    sink: Option<EventSink>,
    refusals: usize,
}

/// A transport with no network behind it.
///
/// Records every connect and emit, and lets the caller play the register's
/// side by injecting events into the connected session. Emitting before the
/// first connect fails with [`DealyzeError::NotConnected`].
#[derive(Default, Clone)]
pub struct InMemoryTransport {
    recorded: Arc<RwLock<Recorded>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `event` to the session as if the register had sent it.
    /// Returns `false` when no session is listening.
    pub async fn inject(&self, event: TransportEvent) -> bool {
        let recorded = self.recorded.read().await;
        match &recorded.sink {
            Some(sink) => sink.send(event).is_ok(),
            None => false,
        }
    }

    /// Makes the next `count` connects fail like an unreachable register:
    /// the attempt is recorded, a connect error reaches the session and the
    /// call returns an error. An earlier connection stays in place.
    pub async fn refuse_connects(&self, count: usize) {
        self.recorded.write().await.refusals = count;
    }

    pub async fn emitted(&self) -> Vec<Emission> {
        self.recorded.read().await.emissions.clone()
    }

    pub async fn connect_count(&self) -> usize {
        self.recorded.read().await.connects.len()
    }

    /// URIs passed to each connect, oldest first.
    pub async fn connected_uris(&self) -> Vec<String> {
        self.recorded.read().await.connects.clone()
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn connect(&self, uri: &str, events: EventSink) -> Result<()> {
        let mut recorded = self.recorded.write().await;
        recorded.connects.push(uri.to_string());
        if recorded.refusals > 0 {
            recorded.refusals -= 1;
            let refused = TransportEvent::connect_failed("connection refused");
            let _ = events.send(refused);
            return Err(DealyzeError::Transport("connection refused".into()));
        }
        recorded.sink = Some(events);
        Ok(())
    }

    async fn emit(&self, channel: &str, payload: Value) -> Result<()> {
        let mut recorded = self.recorded.write().await;
        if recorded.sink.is_none() {
            return Err(DealyzeError::NotConnected);
        }
        recorded.emissions.push(Emission {
            channel: channel.to_string(),
            payload,
        });
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let mut recorded = self.recorded.write().await;
        let Some(sink) = recorded.sink.take() else {
            return Err(DealyzeError::NotConnected);
        };
        // The session may already be gone; nothing left to tell then.
        let _ = sink.send(TransportEvent::disconnected(CLIENT_DISCONNECT));
        Ok(())
    }
}
