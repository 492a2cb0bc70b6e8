use super::dispatcher;
use crate::config::ClientConfig;
use crate::domain::events::{EventSink, EventStream, channel, event_channel};
use crate::domain::model::{Customer, Discount, Employee, Order, OrderItem};
use crate::domain::payload::{BillPayPayload, EmployeePayload, RedeemPayload};
use crate::domain::ports::{ObserverRef, SessionObserver, TransportRef};
use crate::error::{DealyzeError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Placeholder line sent by [`SessionClient::pay_bill`]; hosts are expected
/// to replace it with the real bill item.
pub const BILL_PAY_ITEM_NAME: &str = "Bill Pay";
pub const BILL_PAY_ITEM_SKU: &str = "abc123";
pub const BILL_PAY_ITEM_PRICE: Decimal = dec!(12.5);

/// Mutable state of one session, only touched through the client.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub(crate) connected: bool,
    pub(crate) customer: Option<Customer>,
    pub(crate) order_lines: Vec<OrderItem>,
    pub(crate) discount_lines: Vec<Discount>,
    pub(crate) reconnect_attempts: u32,
    /// Set by [`SessionClient::disconnect`]; stops a pending reconnect.
    pub(crate) closed_by_host: bool,
}

pub(crate) struct Inner {
    pub(crate) config: RwLock<ClientConfig>,
    pub(crate) transport: TransportRef,
    pub(crate) observer: RwLock<Option<ObserverRef>>,
    pub(crate) state: RwLock<SessionState>,
    events: EventSink,
    stream: Mutex<Option<EventStream>>,
}

/// Client for one logical connection to the register.
///
/// Cloning is cheap and every clone drives the same session. Outgoing
/// operations return a `Result` and also log any failure, so callers that
/// ignore the result still get a trace of what went wrong.
#[derive(Clone)]
pub struct SessionClient {
    pub(crate) inner: Arc<Inner>,
}

impl SessionClient {
    pub fn new(config: ClientConfig, transport: TransportRef) -> Self {
        let (events, stream) = event_channel();
        Self {
            inner: Arc::new(Inner {
                config: RwLock::new(config),
                transport,
                observer: RwLock::new(None),
                state: RwLock::new(SessionState::default()),
                events,
                stream: Mutex::new(Some(stream)),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    /// Registers the host observer, replacing any previous one.
    pub async fn register(&self, observer: Arc<dyn SessionObserver>) {
        *self.inner.observer.write().await = Some(observer);
    }

    pub async fn unregister(&self) {
        *self.inner.observer.write().await = None;
    }

    /// Connects to the configured URI.
    pub async fn connect(&self) -> Result<()> {
        let uri = self.inner.config.read().await.uri.clone();
        self.connect_to(&uri).await
    }

    /// Connects to `uri` and starts dispatching its events. Calling this
    /// again opens a new connection; nothing is deduplicated.
    pub async fn connect_to(&self, uri: &str) -> Result<()> {
        self.inner.state.write().await.closed_by_host = false;
        self.open(uri).await
    }

    pub async fn disconnect(&self) -> Result<()> {
        info!("Disconnecting from register");
        self.inner.state.write().await.closed_by_host = true;
        logged("disconnect", self.inner.transport.disconnect().await)
    }

    /// Opens a connection without touching the host-close flag, so a
    /// reconnect never overrides a host's `disconnect()`.
    pub(crate) async fn open(&self, uri: &str) -> Result<()> {
        self.start_dispatcher().await;

        info!(uri, "Connecting to register");
        let result = self
            .inner
            .transport
            .connect(uri, self.inner.events.clone())
            .await;
        logged("connect", result)
    }

    async fn start_dispatcher(&self) {
        if let Some(stream) = self.inner.stream.lock().await.take() {
            dispatcher::spawn(Arc::downgrade(&self.inner), stream);
        }
    }

    /// Signs the configured employee in at the register.
    pub async fn send_employee(&self) -> Result<()> {
        let result = async {
            let employee = self.employee().await?;
            info!(employee = %employee.id, "Sending employee");
            self.emit(channel::EMPLOYEE, &EmployeePayload { employee })
                .await
        }
        .await;
        logged("send employee", result)
    }

    /// Sends a bill payment for the current customer.
    pub async fn pay_bill(&self) -> Result<()> {
        let result = async {
            self.customer().await?;
            let employee = self.employee().await?;

            let order = Order {
                items: vec![OrderItem::new(
                    BILL_PAY_ITEM_SKU,
                    BILL_PAY_ITEM_NAME,
                    BILL_PAY_ITEM_PRICE,
                )],
                ..Default::default()
            };
            info!(employee = %employee.id, "Sending bill pay");
            self.emit(channel::ORDER, &BillPayPayload { employee, order })
                .await
        }
        .await;
        logged("pay bill", result)
    }

    /// Sends the accumulated order and discount lines with the given total
    /// for the current customer.
    pub async fn redeem_reward(&self, total: Decimal) -> Result<()> {
        let result = async {
            let customer = self.customer().await?;
            let employee = self.employee().await?;

            let order = {
                let state = self.inner.state.read().await;
                Order {
                    items: state.order_lines.clone(),
                    discounts: Some(state.discount_lines.clone()),
                    total: Some(total),
                }
            };
            info!(
                employee = %employee.id,
                items = order.items.len(),
                %total,
                "Sending reward redemption"
            );
            self.emit(
                channel::ORDER,
                &RedeemPayload {
                    employee,
                    order,
                    customer,
                },
            )
            .await
        }
        .await;
        logged("redeem reward", result)
    }

    pub async fn add_order_line(&self, sku: &str, name: &str, price: Decimal) {
        let line = OrderItem::new(sku, name, price);
        self.inner.state.write().await.order_lines.push(line);
    }

    /// Adds a discount line. `amount` has no wire field and is not kept.
    pub async fn add_discount_line(
        &self,
        sku: &str,
        name: &str,
        _amount: Decimal,
        percent: Decimal,
    ) {
        let line = Discount::new(sku, name, percent);
        self.inner.state.write().await.discount_lines.push(line);
    }

    pub async fn clear_order_lines(&self) {
        self.inner.state.write().await.order_lines.clear();
    }

    pub async fn clear_discount_lines(&self) {
        self.inner.state.write().await.discount_lines.clear();
    }

    pub async fn clear_customer(&self) {
        self.inner.state.write().await.customer = None;
    }

    /// Changes the employee used by subsequent sends.
    pub async fn set_employee(&self, id: impl Into<String>, username: impl Into<String>) {
        let mut config = self.inner.config.write().await;
        config.employee.id = id.into();
        config.employee.username = username.into();
    }

    pub async fn config(&self) -> ClientConfig {
        self.inner.config.read().await.clone()
    }

    pub async fn current_employee(&self) -> Option<Employee> {
        self.inner.config.read().await.employee.employee()
    }

    pub async fn current_customer(&self) -> Option<Customer> {
        self.inner.state.read().await.customer.clone()
    }

    pub async fn order_lines(&self) -> Vec<OrderItem> {
        self.inner.state.read().await.order_lines.clone()
    }

    pub async fn discount_lines(&self) -> Vec<Discount> {
        self.inner.state.read().await.discount_lines.clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.state.read().await.connected
    }

    async fn employee(&self) -> Result<Employee> {
        self.current_employee()
            .await
            .ok_or(DealyzeError::MissingEmployee)
    }

    async fn customer(&self) -> Result<Customer> {
        self.current_customer()
            .await
            .ok_or(DealyzeError::MissingCustomer)
    }

    async fn emit<P: Serialize>(&self, channel: &str, payload: &P) -> Result<()> {
        let value = serde_json::to_value(payload)?;
        self.record_payload(&value).await;
        self.inner.transport.emit(channel, value).await
    }

    /// Mirrors the outgoing payload to the payload log, if one is enabled.
    async fn record_payload(&self, value: &serde_json::Value) {
        let json = value.to_string();
        debug!(target: "dealyze_client::payload", payload = %json, "Outgoing payload");

        let path = {
            let config = self.inner.config.read().await;
            if !config.logging.enabled {
                return;
            }
            match &config.logging.payload_log {
                Some(path) => path.clone(),
                None => return,
            }
        };
        if let Err(e) = tokio::fs::write(&path, json).await {
            warn!(path = %path.display(), error = %e, "Failed to write payload log");
        }
    }

    /// Runs `f` against the registered observer. A panicking observer is
    /// logged and otherwise ignored.
    pub(crate) async fn notify(&self, f: impl FnOnce(&dyn SessionObserver)) {
        let Some(observer) = self.inner.observer.read().await.clone() else {
            return;
        };
        if catch_unwind(AssertUnwindSafe(|| f(observer.as_ref()))).is_err() {
            error!("Observer panicked while handling a notification");
        }
    }
}

fn logged(operation: &str, result: Result<()>) -> Result<()> {
    if let Err(e) = &result {
        match e {
            DealyzeError::MissingEmployee | DealyzeError::MissingCustomer => {
                warn!(operation, error = %e, "Operation skipped")
            }
            _ => error!(operation, error = %e, "Operation failed"),
        }
    }
    result
}
