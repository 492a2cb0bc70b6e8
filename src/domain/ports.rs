use super::events::EventSink;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A bidirectional, named-event channel to the register.
///
/// Implementations push connect, disconnect and message events into the
/// sink handed to [`Transport::connect`]; they must never block their own
/// event loop doing so.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&self, uri: &str, events: EventSink) -> Result<()>;
    async fn emit(&self, channel: &str, payload: serde_json::Value) -> Result<()>;
    async fn disconnect(&self) -> Result<()>;
}

pub type TransportRef = Arc<dyn Transport>;

/// Host-side notifications. Every method defaults to a no-op, so hosts only
/// implement what they care about.
///
/// Methods run on the dispatcher task and should return quickly.
pub trait SessionObserver: Send + Sync {
    fn on_connect(&self) {}
    fn on_disconnect(&self, _reason: &str) {}
    /// Raw JSON of the `customer` event, delivered even if it failed to parse.
    fn on_customer(&self, _raw: &str) {}
    /// Raw JSON of the inbound `order` event, delivered even if it failed to parse.
    fn on_order(&self, _raw: &str) {}
}

pub type ObserverRef = Arc<dyn SessionObserver>;
