use std::fs;

use jobwatch_config::{
    ConfigLoadError, ConfigLoader, bootstrap::connect_session,
    constants::MANAGED_KEYS,
};
use once_cell::sync::Lazy;
use tempfile::tempdir;

static ENV_LOCK: Lazy<tokio::sync::Mutex<()>> =
    Lazy::new(|| tokio::sync::Mutex::new(()));

fn clear_managed_env() {
    for key in MANAGED_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

#[tokio::test]
async fn loads_toml_and_env_file_with_process_env_winning() {
    let _guard = ENV_LOCK.lock().await;
    clear_managed_env();

    let dir = tempdir().expect("tempdir");
    let config_path = dir.path().join("jobwatch.toml");
    fs::write(
        &config_path,
        r#"
[database]
url = "postgres://file@db/jobs"
max_connections = 3

[feed]
table = "job_history"
order_column = "submitted_at"
capacity = 64
"#,
    )
    .expect("write config");

    let env_path = dir.path().join(".env");
    fs::write(
        &env_path,
        "JOBWATCH_CHANNEL_PREFIX=live_\nJOBWATCH_TABLE=from_dotenv\n",
    )
    .expect("write env");
    unsafe { std::env::set_var("JOBWATCH_TABLE", "from_process") };

    let load = ConfigLoader::new()
        .with_config_path(&config_path)
        .with_env_file(&env_path)
        .load()
        .expect("load");

    clear_managed_env();

    let config = load.config;
    assert_eq!(config.feed.table, "from_process");
    assert_eq!(config.feed.order_column, "submitted_at");
    assert_eq!(config.feed.channel_prefix, "live_");
    assert_eq!(config.feed.capacity, 64);
    assert_eq!(config.database.max_connections, 3);
    assert_eq!(config.database.url.as_deref(), Some("postgres://file@db/jobs"));
    assert!(config.metadata.env_file_loaded);
    assert_eq!(
        config.metadata.config_path.as_deref(),
        Some(config_path.as_path())
    );
    assert!(load.warnings.is_empty());
}

#[tokio::test]
async fn missing_explicit_config_is_an_error() {
    let _guard = ENV_LOCK.lock().await;
    clear_managed_env();

    let dir = tempdir().expect("tempdir");
    let result = ConfigLoader::new()
        .with_config_path(dir.path().join("absent.toml"))
        .with_env_file(dir.path().join(".env"))
        .load();

    assert!(matches!(result, Err(ConfigLoadError::MissingConfig { .. })));
}

#[tokio::test]
async fn unknown_keys_fail_to_parse() {
    let _guard = ENV_LOCK.lock().await;
    clear_managed_env();

    let dir = tempdir().expect("tempdir");
    let config_path = dir.path().join("jobwatch.toml");
    fs::write(&config_path, "[feed]\ntabel = \"jobs\"\n")
        .expect("write config");

    let result = ConfigLoader::new()
        .with_config_path(&config_path)
        .with_env_file(dir.path().join(".env"))
        .load();

    assert!(matches!(result, Err(ConfigLoadError::Parse { .. })));
}

#[tokio::test]
async fn invalid_database_url_from_env_is_rejected() {
    let _guard = ENV_LOCK.lock().await;
    clear_managed_env();

    let dir = tempdir().expect("tempdir");
    let config_path = dir.path().join("jobwatch.toml");
    fs::write(&config_path, "").expect("write config");
    unsafe { std::env::set_var("DATABASE_URL", "redis://cache:6379") };

    let result = ConfigLoader::new()
        .with_config_path(&config_path)
        .with_env_file(dir.path().join(".env"))
        .load();
    clear_managed_env();

    assert!(matches!(
        result,
        Err(ConfigLoadError::UnsupportedDatabaseScheme { .. })
    ));
}

#[tokio::test]
async fn session_bootstrap_requires_database_url() {
    let _guard = ENV_LOCK.lock().await;
    clear_managed_env();

    let dir = tempdir().expect("tempdir");
    let config_path = dir.path().join("jobwatch.toml");
    fs::write(&config_path, "[feed]\ntable = \"jobs\"\n")
        .expect("write config");

    let load = ConfigLoader::new()
        .with_config_path(&config_path)
        .with_env_file(dir.path().join(".env"))
        .load()
        .expect("load");
    assert_eq!(load.warnings.len(), 1);

    let err = connect_session(&load.config)
        .await
        .expect_err("no database configured");
    assert!(matches!(
        err.downcast_ref::<ConfigLoadError>(),
        Some(ConfigLoadError::MissingDatabaseUrl)
    ));
}
