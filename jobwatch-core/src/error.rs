use jobwatch_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LiveListError {
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Subscription failed: {0}")]
    Subscribe(String),

    #[error("Subscription release failed: {0}")]
    Release(String),

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    #[error("Invalid SQL identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    Model(#[from] ModelError),

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, LiveListError>;
