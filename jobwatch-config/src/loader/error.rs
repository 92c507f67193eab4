use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid database URL")]
    InvalidDatabaseUrl {
        #[source]
        source: url::ParseError,
    },
    #[error(
        "unsupported database URL scheme '{scheme}'; expected postgres or \
         postgresql"
    )]
    UnsupportedDatabaseScheme { scheme: String },
    #[error("failed to read secret file {path}")]
    SecretFileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid {field} '{value}': {reason}")]
    InvalidIdentifier {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("invalid feed capacity '{value}'; expected a positive integer")]
    InvalidCapacity { value: String },
    #[error(
        "invalid database max_connections '{value}'; expected a positive \
         integer"
    )]
    InvalidMaxConnections { value: String },
    #[error(
        "no database URL configured; set DATABASE_URL or DATABASE_URL_FILE"
    )]
    MissingDatabaseUrl,
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
