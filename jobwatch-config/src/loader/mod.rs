pub mod db_url;
pub mod error;

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use jobwatch_core::ident::validate_identifier;
use tracing::debug;

use crate::{
    constants::{
        DEFAULT_CONFIG_LOCATIONS, DEFAULT_MAX_CONNECTIONS, ENV_FEED_CAPACITY,
        ENV_MAX_CONNECTIONS,
    },
    models::{
        Config, ConfigMetadata, DatabaseConfig, FeedConfig,
        sources::{EnvConfig, FileConfig, FileFeedConfig},
    },
    validation::ConfigWarnings,
};
use error::ConfigLoadError;

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

/// A composed configuration and the warnings collected on the way.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Read `.env`, the environment and the TOML file, then compose.
    ///
    /// Variables already set in the process are not overridden by `.env`.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = self.load_env_file()?;
        let env_config = EnvConfig::gather();

        let (file_config, config_path) = self.load_file_config(&env_config)?;
        let config_present = file_config.is_some();

        let mut load = Config::compose(file_config, env_config)?;
        load.config.metadata = ConfigMetadata {
            config_path,
            env_file_loaded,
        };

        if !config_present {
            load.warnings.push_with_hint(
                "No jobwatch.toml detected; using environment variables and \
                 defaults",
                "Create jobwatch.toml or point JOBWATCH_CONFIG at a \
                 configuration file",
            );
        }

        load.warnings.log();
        debug!(
            config_path = ?load.config.metadata.config_path,
            env_file_loaded,
            warnings = load.warnings.len(),
            "configuration loaded"
        );
        Ok(load)
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        let loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true),
            None => dotenvy::dotenv().map(|_| true),
        };
        loaded.or_else(|err| match err {
            dotenvy::Error::Io(_) => Ok(false),
            _ => Err(ConfigLoadError::EnvFile(err)),
        })
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let requested = self
            .options
            .config_path
            .clone()
            .or_else(|| env_config.config_path.clone());

        let path = match requested {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            Some(path) => path,
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(path) => path,
                None => return Ok((None, None)),
            },
        };

        let file_config = read_file_config(&path)?;
        Ok((Some(file_config), Some(path)))
    }
}

pub fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Config {
    /// Merge file values and environment values over the defaults, with the
    /// environment winning, and validate the result. Reads no process state.
    pub fn compose(
        file_config: Option<FileConfig>,
        env: EnvConfig,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let mut warnings = ConfigWarnings::default();
        let FileConfig {
            database: file_database,
            feed: file_feed,
        } = file_config.unwrap_or_default();

        let url = db_url::resolve_database_url(&env, &file_database)?;
        if url.is_none() {
            warnings.push_with_hint(
                "DATABASE_URL not configured; only in-memory collaborators \
                 are available",
                "Set DATABASE_URL, DATABASE_URL_FILE or [database].url",
            );
        }

        let max_connections = positive_setting(
            ENV_MAX_CONNECTIONS,
            env.max_connections.as_deref(),
            file_database.max_connections,
            DEFAULT_MAX_CONNECTIONS,
        )
        .map_err(|value| ConfigLoadError::InvalidMaxConnections { value })?;

        let database = DatabaseConfig {
            url,
            max_connections,
        };
        let feed = compose_feed(file_feed, &env)?;

        Ok(ConfigLoad {
            config: Config {
                database,
                feed,
                metadata: ConfigMetadata::default(),
            },
            warnings,
        })
    }
}

/// Environment value over file value over `default`. Zero and unparseable
/// values are rejected; the offending input is returned as the error.
fn positive_setting<T>(
    env_name: &str,
    env_raw: Option<&str>,
    file_value: Option<T>,
    default: T,
) -> Result<T, String>
where
    T: FromStr + Default + PartialEq + fmt::Display,
{
    match (env_raw, file_value) {
        (Some(raw), _) => raw
            .trim()
            .parse::<T>()
            .ok()
            .filter(|value| *value != T::default())
            .ok_or_else(|| format!("{env_name}={raw}")),
        (None, Some(value)) if value == T::default() => {
            Err(value.to_string())
        }
        (None, Some(value)) => Ok(value),
        (None, None) => Ok(default),
    }
}

fn compose_feed(
    file_feed: FileFeedConfig,
    env: &EnvConfig,
) -> Result<FeedConfig, ConfigLoadError> {
    let defaults = FeedConfig::default();

    let capacity = positive_setting(
        ENV_FEED_CAPACITY,
        env.feed_capacity.as_deref(),
        file_feed.capacity,
        defaults.capacity,
    )
    .map_err(|value| ConfigLoadError::InvalidCapacity { value })?;

    let feed = FeedConfig {
        table: env
            .table
            .clone()
            .or(file_feed.table)
            .unwrap_or(defaults.table),
        order_column: env
            .order_column
            .clone()
            .or(file_feed.order_column)
            .unwrap_or(defaults.order_column),
        channel_prefix: env
            .channel_prefix
            .clone()
            .or(file_feed.channel_prefix)
            .unwrap_or(defaults.channel_prefix),
        capacity,
    };

    check_identifier("table", &feed.table)?;
    check_identifier("order column", &feed.order_column)?;
    let channel = format!("{}{}", feed.channel_prefix, feed.table);
    check_identifier("notification channel", &channel)?;

    Ok(feed)
}

fn check_identifier(
    field: &'static str,
    value: &str,
) -> Result<(), ConfigLoadError> {
    validate_identifier(value).map(|_| ()).map_err(|err| {
        ConfigLoadError::InvalidIdentifier {
            field,
            value: value.to_string(),
            reason: err.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sources::FileDatabaseConfig;

    fn file(table: &str, capacity: Option<usize>) -> FileConfig {
        FileConfig {
            database: FileDatabaseConfig {
                url: Some("postgres://app@db/jobs".into()),
                ..FileDatabaseConfig::default()
            },
            feed: FileFeedConfig {
                table: Some(table.into()),
                capacity,
                ..FileFeedConfig::default()
            },
        }
    }

    #[test]
    fn defaults_without_any_source() {
        let load =
            Config::compose(None, EnvConfig::default()).expect("compose");
        assert_eq!(load.config.feed, FeedConfig::default());
        assert_eq!(load.config.database.url, None);
        assert_eq!(load.config.database.max_connections, 5);
        assert_eq!(load.warnings.len(), 1);
    }

    #[test]
    fn environment_overrides_file() {
        let env = EnvConfig {
            table: Some("job_history".into()),
            feed_capacity: Some("32".into()),
            max_connections: Some(" 2 ".into()),
            ..EnvConfig::default()
        };
        let load = Config::compose(Some(file("jobs_archive", Some(8))), env)
            .expect("compose");

        assert_eq!(load.config.feed.table, "job_history");
        assert_eq!(load.config.feed.capacity, 32);
        assert_eq!(load.config.feed.order_column, "created_at");
        assert_eq!(load.config.database.max_connections, 2);
        assert_eq!(
            load.config.database.url.as_deref(),
            Some("postgres://app@db/jobs")
        );
        assert!(load.warnings.is_empty());
    }

    #[test]
    fn unsafe_table_names_are_rejected() {
        let err = Config::compose(
            Some(file("jobs; drop", None)),
            EnvConfig::default(),
        )
        .expect_err("invalid table");
        assert!(matches!(
            err,
            ConfigLoadError::InvalidIdentifier { field: "table", .. }
        ));
    }

    #[test]
    fn empty_prefix_is_allowed_but_channel_must_stay_valid() {
        let env = EnvConfig {
            channel_prefix: Some(String::new()),
            ..EnvConfig::default()
        };
        let load = Config::compose(None, env).expect("compose");
        assert_eq!(load.config.feed.change_feed_config().channel_prefix, "");

        let env = EnvConfig {
            channel_prefix: Some("9live_".into()),
            ..EnvConfig::default()
        };
        assert!(matches!(
            Config::compose(None, env),
            Err(ConfigLoadError::InvalidIdentifier {
                field: "notification channel",
                ..
            })
        ));
    }

    #[test]
    fn capacity_must_be_positive() {
        let env = EnvConfig {
            feed_capacity: Some("lots".into()),
            ..EnvConfig::default()
        };
        assert!(matches!(
            Config::compose(None, env),
            Err(ConfigLoadError::InvalidCapacity { value })
                if value == "JOBWATCH_FEED_CAPACITY=lots"
        ));
        assert!(matches!(
            Config::compose(Some(file("jobs", Some(0))), EnvConfig::default()),
            Err(ConfigLoadError::InvalidCapacity { .. })
        ));
    }

    #[test]
    fn pool_size_is_validated_like_capacity() {
        for raw in ["many", "0", "-3", ""] {
            let env = EnvConfig {
                max_connections: Some(raw.into()),
                ..EnvConfig::default()
            };
            assert!(
                matches!(
                    Config::compose(Some(file("jobs", None)), env),
                    Err(ConfigLoadError::InvalidMaxConnections { .. })
                ),
                "{raw}"
            );
        }

        let mut from_file = file("jobs", None);
        from_file.database.max_connections = Some(0);
        assert!(matches!(
            Config::compose(Some(from_file), EnvConfig::default()),
            Err(ConfigLoadError::InvalidMaxConnections { value })
                if value == "0"
        ));
    }
}
