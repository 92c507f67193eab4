use std::{fs::read_to_string, path::Path};

use url::Url;

use crate::{
    ConfigLoadError,
    models::sources::{EnvConfig, FileDatabaseConfig},
};

const SUPPORTED_SCHEMES: [&str; 2] = ["postgres", "postgresql"];

/// Pick the connection URL: `DATABASE_URL`, then `DATABASE_URL_FILE`, then
/// the file's `url`, then the file's `url_file`. Whichever wins is validated.
pub fn resolve_database_url(
    env: &EnvConfig,
    file_database: &FileDatabaseConfig,
) -> Result<Option<String>, ConfigLoadError> {
    let candidate = if let Some(url) = env.database_url.clone() {
        Some(url)
    } else if let Some(path) = env.database_url_file.as_ref()
        && let Some(url) = read_secret_file(path)?
    {
        Some(url)
    } else if let Some(url) = file_database
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
    {
        Some(url.to_string())
    } else if let Some(path) = file_database.url_file.as_ref() {
        read_secret_file(path)?
    } else {
        None
    };

    candidate.map(|url| validate_database_url(&url)).transpose()
}

pub fn validate_database_url(raw: &str) -> Result<String, ConfigLoadError> {
    let parsed = Url::parse(raw.trim())
        .map_err(|source| ConfigLoadError::InvalidDatabaseUrl { source })?;
    if !SUPPORTED_SCHEMES.contains(&parsed.scheme()) {
        return Err(ConfigLoadError::UnsupportedDatabaseScheme {
            scheme: parsed.scheme().to_string(),
        });
    }
    Ok(parsed.to_string())
}

pub fn read_secret_file(
    path: &Path,
) -> Result<Option<String>, ConfigLoadError> {
    let contents = read_to_string(path).map_err(|source| {
        ConfigLoadError::SecretFileIo {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

/// Host and database name of `url`, for logging without credentials.
pub fn describe_database_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => format!(
            "{}{}",
            parsed.host_str().unwrap_or("localhost"),
            parsed.path()
        ),
        Err(_) => "<unparseable>".to_string(),
    }
}
