#![allow(dead_code)]

use dealyze_client::application::reconnect::ReconnectPolicy;
use dealyze_client::application::session::SessionClient;
use dealyze_client::config::{ClientConfig, EmployeeConfig};
use dealyze_client::domain::ports::SessionObserver;
use dealyze_client::infrastructure::in_memory::InMemoryTransport;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CUSTOMER_JSON: &str =
    r#"{"customer":{"name":"Ada Lovelace","phoneNumber":"555-0100","emailAddress":"ada@example.com"}}"#;

pub const ORDER_JSON: &str = r#"{"order":{"items":[],"discounts":[{"name":"Free Coffee","skus":["42"],"percent":100},{"name":"Half Off Bagel","skus":["43","44"],"percent":50}],"total":0}}"#;

#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    Connect,
    Disconnect(String),
    Customer(String),
    Order(String),
}

/// Observer that remembers every notification in order.
#[derive(Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<Observed>>,
}

impl RecordingObserver {
    pub fn seen(&self) -> Vec<Observed> {
        self.seen.lock().unwrap().clone()
    }

    fn push(&self, observed: Observed) {
        self.seen.lock().unwrap().push(observed);
    }
}

impl SessionObserver for RecordingObserver {
    fn on_connect(&self) {
        self.push(Observed::Connect);
    }

    fn on_disconnect(&self, reason: &str) {
        self.push(Observed::Disconnect(reason.to_string()));
    }

    fn on_customer(&self, raw: &str) {
        self.push(Observed::Customer(raw.to_string()));
    }

    fn on_order(&self, raw: &str) {
        self.push(Observed::Order(raw.to_string()));
    }
}

pub struct Harness {
    pub client: SessionClient,
    pub transport: Arc<InMemoryTransport>,
    pub observer: Arc<RecordingObserver>,
}

/// A connected client for employee `123456` whose reconnects happen at once.
pub async fn connected_harness() -> Harness {
    harness(
        EmployeeConfig::new("123456", "testusername"),
        ReconnectPolicy::immediate(),
    )
    .await
}

pub async fn harness(employee: EmployeeConfig, reconnect: ReconnectPolicy) -> Harness {
    let transport = Arc::new(InMemoryTransport::new());
    let config = ClientConfig {
        uri: "ws://register.test:3100".to_string(),
        employee,
        reconnect,
        ..Default::default()
    };
    let client = SessionClient::new(config, transport.clone());
    let observer = Arc::new(RecordingObserver::default());
    client.register(observer.clone()).await;
    client.connect().await.unwrap();

    Harness {
        client,
        transport,
        observer,
    }
}

/// Polls `condition` until it holds, failing the test after two seconds.
pub async fn wait_until<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let polled = tokio::time::timeout(Duration::from_secs(2), async {
        while !condition().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "condition not met within 2s");
}
