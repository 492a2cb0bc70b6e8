use crate::application::reconnect::ReconnectPolicy;
use crate::domain::model::Employee;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_URI: &str = "ws://localhost:3100";
pub const DEFAULT_LOG_FILE: &str = "dealyze_error.log";
pub const DEFAULT_PAYLOAD_LOG: &str = "payload.json";

/// Everything a session needs before it connects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub uri: String,
    pub employee: EmployeeConfig,
    pub logging: LoggingConfig,
    pub reconnect: ReconnectPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            employee: EmployeeConfig::default(),
            logging: LoggingConfig::default(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// The employee signing in at the register.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeConfig {
    pub id: String,
    /// Whatever non-numeric identifier the host system uses.
    pub username: String,
}

impl EmployeeConfig {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
        }
    }

    /// Snapshot for the wire; `None` while no identifier is configured.
    pub fn employee(&self) -> Option<Employee> {
        if self.id.trim().is_empty() {
            None
        } else {
            Some(Employee::new(self.id.clone(), self.username.clone()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub log_file: PathBuf,
    /// Receives a copy of the last outgoing payload.
    pub payload_log: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            payload_log: Some(PathBuf::from(DEFAULT_PAYLOAD_LOG)),
        }
    }
}
