pub mod sources;

use std::path::PathBuf;

use jobwatch_core::SessionOptions;
use jobwatch_core::postgres::PostgresChangeFeedConfig;

use crate::constants::{
    DEFAULT_CHANNEL_PREFIX, DEFAULT_FEED_CAPACITY, DEFAULT_MAX_CONNECTIONS,
    DEFAULT_ORDER_COLUMN, DEFAULT_TABLE,
};
use crate::loader::error::ConfigLoadError;

/// Fully composed configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub feed: FeedConfig,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl DatabaseConfig {
    pub fn require_url(&self) -> Result<&str, ConfigLoadError> {
        self.url
            .as_deref()
            .ok_or(ConfigLoadError::MissingDatabaseUrl)
    }
}

/// Which table is mirrored and how its change feed is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub table: String,
    pub order_column: String,
    pub channel_prefix: String,
    pub capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            order_column: DEFAULT_ORDER_COLUMN.to_string(),
            channel_prefix: DEFAULT_CHANNEL_PREFIX.to_string(),
            capacity: DEFAULT_FEED_CAPACITY,
        }
    }
}

impl FeedConfig {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            table: self.table.clone(),
            order_by: self.order_column.clone(),
        }
    }

    pub fn change_feed_config(&self) -> PostgresChangeFeedConfig {
        PostgresChangeFeedConfig {
            channel_prefix: self.channel_prefix.clone(),
            channel_capacity: self.capacity,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
