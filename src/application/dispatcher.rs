use super::session::{Inner, SessionClient};
use crate::domain::events::{EventStream, TransportEvent, channel, is_server_disconnect};
use crate::domain::model::Order;
use crate::domain::payload::{CustomerPayload, OrderPayload};
use std::sync::Weak;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Drains a session's event stream on its own task.
///
/// The task only holds a weak reference, so it winds down once the last
/// client handle is dropped.
pub(crate) fn spawn(session: Weak<Inner>, mut stream: EventStream) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = stream.recv().await {
            let Some(inner) = session.upgrade() else {
                break;
            };
            SessionClient::from_inner(inner).dispatch(event).await;
        }
        debug!("Event dispatcher stopped");
    })
}

impl SessionClient {
    /// Applies one transport event to the session and notifies the observer.
    ///
    /// Never fails: malformed payloads are logged, leave the state as it was
    /// and are still forwarded raw to the observer.
    pub async fn dispatch(&self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => self.on_connected().await,
            TransportEvent::Disconnected { reason } => self.on_disconnected(&reason).await,
            TransportEvent::Message { event, payload } => {
                let raw = payload.as_deref().unwrap_or_default();
                match event.as_str() {
                    channel::READY => self.on_ready().await,
                    channel::CUSTOMER => self.on_customer(raw).await,
                    channel::ORDER => self.on_order(raw).await,
                    other => debug!(event = other, "Ignoring unknown event"),
                }
            }
        }
    }

    async fn on_connected(&self) {
        {
            let mut state = self.inner.state.write().await;
            state.connected = true;
            state.reconnect_attempts = 0;
        }
        info!("Connected to register");
        self.notify(|observer| observer.on_connect()).await;
    }

    async fn on_disconnected(&self, reason: &str) {
        self.inner.state.write().await.connected = false;
        info!(reason, "Disconnected from register");
        self.notify(|observer| observer.on_disconnect(reason)).await;

        if is_server_disconnect(reason) {
            self.reconnect().await;
        }
    }

    /// Reopens the configured URI under the reconnect policy. A failed
    /// connect counts as a further attempt; the loop ends on the first
    /// successful connect, when the policy gives up or once the host has
    /// called `disconnect()`.
    async fn reconnect(&self) {
        let (uri, policy) = {
            let config = self.inner.config.read().await;
            (config.uri.clone(), config.reconnect)
        };
        loop {
            let attempt = {
                let mut state = self.inner.state.write().await;
                state.reconnect_attempts = state.reconnect_attempts.saturating_add(1);
                state.reconnect_attempts
            };
            let Some(delay) = policy.delay_for(attempt) else {
                error!(
                    attempt,
                    "Reconnect attempts exhausted; staying disconnected"
                );
                return;
            };
            info!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Reconnecting after server disconnect"
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if self.inner.state.read().await.closed_by_host {
                info!("Host closed the session; reconnect abandoned");
                return;
            }
            // open() logs its own failures
            if self.open(&uri).await.is_ok() {
                return;
            }
        }
    }

    async fn on_ready(&self) {
        info!("Register ready");
        // send_employee() logs its own failures
        let _ = self.send_employee().await;
    }

    async fn on_customer(&self, raw: &str) {
        match serde_json::from_str::<CustomerPayload>(raw) {
            Ok(CustomerPayload {
                customer: Some(customer),
            }) => {
                info!(name = customer.name.as_deref().unwrap_or(""), "Customer checked in");
                self.inner.state.write().await.customer = Some(customer);
            }
            Ok(_) => warn!("Customer event carried no customer"),
            Err(e) => warn!(error = %e, "Failed to parse customer payload"),
        }
        self.notify(|observer| observer.on_customer(raw)).await;
    }

    async fn on_order(&self, raw: &str) {
        match serde_json::from_str::<OrderPayload>(raw) {
            Ok(OrderPayload {
                order:
                    Some(Order {
                        discounts: Some(discounts),
                        ..
                    }),
            }) => {
                for discount in discounts.iter().filter(|d| !d.percent_in_range()) {
                    warn!(
                        name = %discount.name,
                        percent = %discount.percent,
                        "Discount percent outside 0..=100"
                    );
                }
                info!(discounts = discounts.len(), "Register returned discounts");
                self.inner.state.write().await.discount_lines = discounts;
            }
            Ok(_) => warn!("Register returned no discounts"),
            Err(e) => warn!(error = %e, "Failed to parse order payload"),
        }
        self.notify(|observer| observer.on_order(raw)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::reconnect::ReconnectPolicy;
    use crate::config::{ClientConfig, EmployeeConfig};
    use crate::domain::events::SERVER_DISCONNECT;
    use crate::infrastructure::in_memory::InMemoryTransport;
    use std::sync::Arc;

    fn client(policy: ReconnectPolicy) -> (SessionClient, Arc<InMemoryTransport>) {
        let transport = Arc::new(InMemoryTransport::new());
        let config = ClientConfig {
            employee: EmployeeConfig::new("1", "clerk"),
            reconnect: policy,
            ..Default::default()
        };
        (SessionClient::new(config, transport.clone()), transport)
    }

    #[tokio::test]
    async fn test_connected_event_sets_state() {
        let (client, _) = client(ReconnectPolicy::immediate());
        assert!(!client.is_connected().await);
        client.dispatch(TransportEvent::Connected).await;
        assert!(client.is_connected().await);
    }

    #[tokio::test]
    async fn test_ready_sends_employee() {
        let (client, transport) = client(ReconnectPolicy::immediate());
        client.connect().await.unwrap();

        client.dispatch(TransportEvent::signal("ready")).await;

        let emitted = transport.emitted().await;
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].channel, "employee");
    }

    #[tokio::test]
    async fn test_exhausted_policy_stops_reconnecting() {
        let (client, transport) = client(ReconnectPolicy::immediate().with_max_attempts(Some(2)));

        for _ in 0..3 {
            client
                .dispatch(TransportEvent::disconnected(SERVER_DISCONNECT))
                .await;
        }
        assert_eq!(transport.connect_count().await, 2);
    }

    #[tokio::test]
    async fn test_connected_resets_reconnect_attempts() {
        let (client, transport) = client(ReconnectPolicy::immediate().with_max_attempts(Some(1)));

        client
            .dispatch(TransportEvent::disconnected(SERVER_DISCONNECT))
            .await;
        client.dispatch(TransportEvent::Connected).await;
        client
            .dispatch(TransportEvent::disconnected(SERVER_DISCONNECT))
            .await;

        assert_eq!(transport.connect_count().await, 2);
    }

    #[tokio::test]
    async fn test_unknown_event_is_ignored() {
        let (client, transport) = client(ReconnectPolicy::immediate());
        client
            .dispatch(TransportEvent::message("promo", "{}"))
            .await;
        assert!(transport.emitted().await.is_empty());
        assert!(client.current_customer().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_reconnects_count_as_attempts() {
        let (client, transport) = client(ReconnectPolicy::immediate().with_max_attempts(Some(3)));
        transport.refuse_connects(usize::MAX).await;

        client
            .dispatch(TransportEvent::disconnected(SERVER_DISCONNECT))
            .await;

        assert_eq!(transport.connect_count().await, 3);
        assert_eq!(client.inner.state.read().await.reconnect_attempts, 4);
    }

    #[tokio::test]
    async fn test_reconnect_uses_configured_uri_after_override() {
        let (client, transport) = client(ReconnectPolicy::immediate());
        client.connect_to("ws://other:3100").await.unwrap();

        client
            .dispatch(TransportEvent::disconnected(SERVER_DISCONNECT))
            .await;

        let uris = transport.connected_uris().await;
        assert_eq!(uris.len(), 2);
        assert_eq!(uris[1], ClientConfig::default().uri);
    }
}
