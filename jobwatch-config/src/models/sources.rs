use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{
    ENV_CHANNEL_PREFIX, ENV_CONFIG_PATH, ENV_DATABASE_URL,
    ENV_DATABASE_URL_FILE, ENV_FEED_CAPACITY, ENV_MAX_CONNECTIONS,
    ENV_ORDER_COLUMN, ENV_TABLE,
};
use crate::util::{env_path, env_var};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub feed: FileFeedConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileFeedConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub database_url: Option<String>,
    pub database_url_file: Option<PathBuf>,
    /// Kept raw; validated during composition.
    pub max_connections: Option<String>,
    pub table: Option<String>,
    pub order_column: Option<String>,
    /// Read verbatim so an empty prefix can be configured.
    pub channel_prefix: Option<String>,
    /// Kept raw; validated during composition.
    pub feed_capacity: Option<String>,
    pub config_path: Option<PathBuf>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self {
            database_url: env_var(ENV_DATABASE_URL),
            database_url_file: env_path(ENV_DATABASE_URL_FILE),
            max_connections: env_var(ENV_MAX_CONNECTIONS),
            table: env_var(ENV_TABLE),
            order_column: env_var(ENV_ORDER_COLUMN),
            channel_prefix: std::env::var(ENV_CHANNEL_PREFIX).ok(),
            feed_capacity: env_var(ENV_FEED_CAPACITY),
            config_path: env_path(ENV_CONFIG_PATH),
        }
    }
}
