//! Wiring from a loaded [`Config`] to a Postgres-backed session.

use std::sync::Arc;

use anyhow::{Context, Result};
use jobwatch_core::LiveListSession;
use jobwatch_core::postgres::{PostgresChangeFeed, PostgresDataSource};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::Config;
use crate::loader::db_url::describe_database_url;

pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    let url = config.database.require_url()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(url)
        .await
        .with_context(|| {
            format!(
                "failed to connect to database at {}",
                describe_database_url(url)
            )
        })?;

    info!(
        database = %describe_database_url(url),
        max_connections = config.database.max_connections,
        "database pool ready"
    );
    Ok(pool)
}

/// Build an unstarted session over the configured table. The caller runs
/// [`LiveListSession::start`] and, when done, [`LiveListSession::shutdown`].
pub async fn connect_session(config: &Config) -> Result<LiveListSession> {
    let pool = connect_pool(config).await?;
    Ok(session_for_pool(pool, config))
}

pub fn session_for_pool(pool: PgPool, config: &Config) -> LiveListSession {
    let source = PostgresDataSource::new(pool.clone());
    let feed =
        PostgresChangeFeed::with_config(pool, config.feed.change_feed_config());

    LiveListSession::new(
        Arc::new(source),
        Arc::new(feed),
        config.feed.session_options(),
    )
}
