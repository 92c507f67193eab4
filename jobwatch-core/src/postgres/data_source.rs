use std::fmt;

use async_trait::async_trait;
use jobwatch_model::JobRecord;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::{debug, warn};

use crate::error::{LiveListError, Result};
use crate::ident::quote_identifier;
use crate::source::DataSource;

/// Reads whole tables as JSON rows through a sqlx pool.
#[derive(Clone)]
pub struct PostgresDataSource {
    pool: PgPool,
}

impl PostgresDataSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl fmt::Debug for PostgresDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDataSource")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

/// `SELECT` text for a full-table read; both names are validated first.
/// NULLs sort as the oldest value, matching the in-memory ordering.
pub(crate) fn fetch_all_sql(
    table: &str,
    order_by: &str,
    ascending: bool,
) -> Result<String> {
    let table = quote_identifier(table)?;
    let order_by = quote_identifier(order_by)?;
    let direction = if ascending {
        "ASC NULLS FIRST"
    } else {
        "DESC NULLS LAST"
    };
    Ok(format!(
        "SELECT row_to_json(t) FROM {table} t \
         ORDER BY t.{order_by} {direction}"
    ))
}

#[async_trait]
impl DataSource for PostgresDataSource {
    async fn fetch_all(
        &self,
        table: &str,
        order_by: &str,
        ascending: bool,
    ) -> Result<Vec<JobRecord>> {
        let sql = fetch_all_sql(table, order_by, ascending)?;

        let rows = sqlx::query_scalar::<_, Json<Value>>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| {
                LiveListError::Fetch(format!("failed to read {table}: {err}"))
            })?;

        let mut records = Vec::with_capacity(rows.len());
        for Json(row) in rows {
            match JobRecord::from_json(row) {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(table, error = %err, "skipping row without usable id")
                }
            }
        }

        debug!(table, count = records.len(), "fetched job rows");
        Ok(records)
    }
}
