pub const DEFAULT_TABLE: &str = "jobs";
pub const DEFAULT_ORDER_COLUMN: &str = "created_at";
pub const DEFAULT_CHANNEL_PREFIX: &str = "jobwatch_";
pub const DEFAULT_FEED_CAPACITY: usize = 256;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Probed in order when no config path is given.
pub const DEFAULT_CONFIG_LOCATIONS: &[&str] =
    &["jobwatch.toml", "config/jobwatch.toml"];

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_DATABASE_URL_FILE: &str = "DATABASE_URL_FILE";
pub const ENV_MAX_CONNECTIONS: &str = "JOBWATCH_DB_MAX_CONNECTIONS";
pub const ENV_TABLE: &str = "JOBWATCH_TABLE";
pub const ENV_ORDER_COLUMN: &str = "JOBWATCH_ORDER_COLUMN";
pub const ENV_CHANNEL_PREFIX: &str = "JOBWATCH_CHANNEL_PREFIX";
pub const ENV_FEED_CAPACITY: &str = "JOBWATCH_FEED_CAPACITY";
pub const ENV_CONFIG_PATH: &str = "JOBWATCH_CONFIG";

/// Every variable [`crate::models::sources::EnvConfig::gather`] reads.
pub const MANAGED_KEYS: &[&str] = &[
    ENV_DATABASE_URL,
    ENV_DATABASE_URL_FILE,
    ENV_MAX_CONNECTIONS,
    ENV_TABLE,
    ENV_ORDER_COLUMN,
    ENV_CHANNEL_PREFIX,
    ENV_FEED_CAPACITY,
    ENV_CONFIG_PATH,
];
