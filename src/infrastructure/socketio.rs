use crate::domain::events::{
    CLIENT_DISCONNECT, EventSink, SERVER_DISCONNECT, TransportEvent, channel,
};
use crate::domain::ports::Transport;
use crate::error::{DealyzeError, Result};
use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use rust_socketio::asynchronous::{Client, ClientBuilder};
use rust_socketio::{Event, Payload};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Socket.IO transport backed by `rust_socketio`.
///
/// Reconnection is left to the session's dispatcher, so the library's own
/// reconnect loop is switched off.
#[derive(Default)]
pub struct SocketIoTransport {
    client: Mutex<Option<(Client, EventSink)>>,
}

impl SocketIoTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Renders the first argument of an event the way hosts expect it: JSON
/// strings unwrapped, anything else serialized.
fn first_argument(payload: &Payload) -> Option<String> {
    match payload {
        Payload::Text(values) => values.first().map(|value| match value {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }),
        Payload::Binary(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        #[allow(deprecated)]
        Payload::String(text) => Some(text.clone()),
    }
}

/// Translates a Socket.IO event into what the session sees. Events the
/// session has no use for map to `None`.
fn map_event(event: &Event, payload: &Payload) -> Option<TransportEvent> {
    match event {
        Event::Connect => Some(TransportEvent::Connected),
        // Only a server disconnect packet reaches the close callback.
        Event::Close => Some(TransportEvent::disconnected(SERVER_DISCONNECT)),
        Event::Custom(name) if name == channel::READY => {
            Some(TransportEvent::signal(channel::READY))
        }
        Event::Custom(name) if name == channel::CUSTOMER || name == channel::ORDER => {
            Some(TransportEvent::Message {
                event: name.clone(),
                payload: first_argument(payload),
            })
        }
        _ => None,
    }
}

fn forward(sink: &EventSink, event: TransportEvent) {
    if sink.send(event).is_err() {
        debug!("Session gone; dropping transport event");
    }
}

/// Builds the library callback for `event`, forwarding its mapped form.
fn relay(
    sink: EventSink,
    event: Event,
) -> impl FnMut(Payload, Client) -> BoxFuture<'static, ()> + Send + Sync + 'static {
    move |payload: Payload, _: Client| {
        if let Some(mapped) = map_event(&event, &payload) {
            forward(&sink, mapped);
        }
        async {}.boxed()
    }
}

#[async_trait]
impl Transport for SocketIoTransport {
    async fn connect(&self, uri: &str, events: EventSink) -> Result<()> {
        let custom = |name: &str| Event::Custom(name.to_string());
        let connected = ClientBuilder::new(uri)
            .reconnect(false)
            .on(Event::Connect, relay(events.clone(), Event::Connect))
            .on(Event::Close, relay(events.clone(), Event::Close))
            .on(Event::Error, |payload, _: Client| {
                let detail = first_argument(&payload).unwrap_or_default();
                warn!(error = %detail, "Socket.IO error");
                async {}.boxed()
            })
            .on(
                custom(channel::READY),
                relay(events.clone(), custom(channel::READY)),
            )
            .on(
                custom(channel::CUSTOMER),
                relay(events.clone(), custom(channel::CUSTOMER)),
            )
            .on(
                custom(channel::ORDER),
                relay(events.clone(), custom(channel::ORDER)),
            )
            .connect()
            .await;

        match connected {
            Ok(client) => {
                let previous = self.client.lock().await.replace((client, events));
                if let Some((old, _)) = previous
                    && let Err(e) = old.disconnect().await
                {
                    debug!(error = %e, "Failed to close superseded connection");
                }
                Ok(())
            }
            Err(e) => {
                forward(&events, TransportEvent::connect_failed(&e));
                Err(DealyzeError::Transport(e.to_string()))
            }
        }
    }

    async fn emit(&self, channel: &str, payload: Value) -> Result<()> {
        let guard = self.client.lock().await;
        let Some((client, _)) = guard.as_ref() else {
            return Err(DealyzeError::NotConnected);
        };
        client
            .emit(channel.to_string(), payload)
            .await
            .map_err(|e| DealyzeError::Transport(e.to_string()))
    }

    async fn disconnect(&self) -> Result<()> {
        let Some((client, events)) = self.client.lock().await.take() else {
            return Err(DealyzeError::NotConnected);
        };
        let result = client
            .disconnect()
            .await
            .map_err(|e| DealyzeError::Transport(e.to_string()));
        forward(&events, TransportEvent::disconnected(CLIENT_DISCONNECT));
        result
    }
}
