use clap::Parser;
use dealyze_client::application::reconnect::ReconnectPolicy;
use dealyze_client::application::session::SessionClient;
use dealyze_client::config::{
    ClientConfig, DEFAULT_LOG_FILE, DEFAULT_PAYLOAD_LOG, DEFAULT_URI, EmployeeConfig,
    LoggingConfig,
};
use dealyze_client::domain::ports::{SessionObserver, TransportRef};
use dealyze_client::telemetry;
use miette::{IntoDiagnostic, Result};
use rust_decimal_macros::dec;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(author, version, about = "Console client for the Dealyze register", long_about = None)]
struct Cli {
    /// Register URI
    #[arg(long, default_value = DEFAULT_URI)]
    uri: String,

    /// Employee identifier sent when the register is ready
    #[arg(long, default_value = "")]
    employee_id: String,

    /// Username or other non-numeric identifier of the employee
    #[arg(long, default_value = "")]
    employee_username: String,

    /// Append logs to --log-file and mirror outgoing payloads to --payload-log
    #[arg(long)]
    enable_logging: bool,

    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    #[arg(long, default_value = DEFAULT_PAYLOAD_LOG)]
    payload_log: PathBuf,

    /// Reconnect attempts after a server disconnect; 0 disables reconnecting
    #[arg(long)]
    max_reconnects: Option<u32>,

    /// Send a test bill pay after each customer and a test redemption after each order
    #[arg(long)]
    demo: bool,
}

impl Cli {
    fn config(&self) -> ClientConfig {
        let mut reconnect = ReconnectPolicy::default();
        if let Some(max) = self.max_reconnects {
            reconnect = reconnect.with_max_attempts(Some(max));
        }
        ClientConfig {
            uri: self.uri.clone(),
            employee: EmployeeConfig::new(&self.employee_id, &self.employee_username),
            logging: LoggingConfig {
                enabled: self.enable_logging,
                log_file: self.log_file.clone(),
                payload_log: Some(self.payload_log.clone()),
            },
            reconnect,
        }
    }
}

enum Notification {
    Connected,
    Disconnected(String),
    Customer(String),
    Order(String),
}

/// Hands notifications to the main loop so the dispatcher never waits on
/// console I/O or follow-up sends.
struct ConsoleObserver {
    notifications: mpsc::UnboundedSender<Notification>,
}

impl SessionObserver for ConsoleObserver {
    fn on_connect(&self) {
        let _ = self.notifications.send(Notification::Connected);
    }

    fn on_disconnect(&self, reason: &str) {
        let _ = self
            .notifications
            .send(Notification::Disconnected(reason.to_string()));
    }

    fn on_customer(&self, raw: &str) {
        let _ = self
            .notifications
            .send(Notification::Customer(raw.to_string()));
    }

    fn on_order(&self, raw: &str) {
        let _ = self
            .notifications
            .send(Notification::Order(raw.to_string()));
    }
}

#[cfg(feature = "transport-socketio")]
fn transport() -> Result<TransportRef> {
    use dealyze_client::infrastructure::socketio::SocketIoTransport;
    Ok(Arc::new(SocketIoTransport::new()))
}

#[cfg(not(feature = "transport-socketio"))]
fn transport() -> Result<TransportRef> {
    Err(miette::miette!(
        help = "rebuild with `--features transport-socketio`",
        "no network transport available: the 'transport-socketio' feature is not enabled"
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config();

    telemetry::init(&config.logging).into_diagnostic()?;

    let client = SessionClient::new(config, transport()?);
    let (notifications, mut inbox) = mpsc::unbounded_channel();
    client
        .register(Arc::new(ConsoleObserver { notifications }))
        .await;

    println!("Starting up client...");
    println!("Logging is {}", cli.enable_logging);
    client.connect().await.into_diagnostic()?;

    loop {
        tokio::select! {
            Some(notification) = inbox.recv() => match notification {
                Notification::Connected => println!("Connected"),
                Notification::Disconnected(reason) => println!("Disconnected: {reason}"),
                Notification::Customer(raw) => {
                    println!("Customer: {raw}");
                    if cli.demo {
                        // failures are already logged by the client
                        let _ = client.pay_bill().await;
                    }
                }
                Notification::Order(raw) => {
                    println!("Order: {raw}");
                    if cli.demo {
                        let _ = client.redeem_reward(dec!(5.0)).await;
                    }
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let _ = client.disconnect().await;
    Ok(())
}
