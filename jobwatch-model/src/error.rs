use std::fmt::{self, Display};

/// Errors produced while turning raw rows into records.
#[derive(Debug)]
pub enum ModelError {
    MissingId,
    InvalidRecord(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::MissingId => write!(f, "record has no usable id"),
            ModelError::InvalidRecord(msg) => {
                write!(f, "invalid record: {msg}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
