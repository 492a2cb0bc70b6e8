use thiserror::Error;

#[derive(Error, Debug)]
pub enum DealyzeError {
    #[error("no employee configured for this session")]
    MissingEmployee,
    #[error("no customer is signed in")]
    MissingCustomer,
    #[error("session is not connected")]
    NotConnected,
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Logging error: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, DealyzeError>;
