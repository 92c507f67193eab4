use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, trace, warn};

use crate::error::{LiveListError, Result};
use crate::ident::validate_identifier;
use crate::source::{ChangeFeed, Subscription, SubscriptionHandle};

const DEFAULT_CHANNEL_PREFIX: &str = "jobwatch_";
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone, Debug)]
pub struct PostgresChangeFeedConfig {
    /// Notification channel for a table is `<prefix><table>`.
    pub channel_prefix: String,
    pub channel_capacity: usize,
}

impl Default for PostgresChangeFeedConfig {
    fn default() -> Self {
        Self {
            channel_prefix: DEFAULT_CHANNEL_PREFIX.to_owned(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl PostgresChangeFeedConfig {
    pub fn channel_for(&self, table: &str) -> Result<String> {
        validate_identifier(table)?;
        let channel = format!("{}{}", self.channel_prefix, table);
        validate_identifier(&channel)?;
        Ok(channel)
    }
}

struct ActiveListener {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

/// Change feed over Postgres `LISTEN`/`NOTIFY`.
///
/// Each subscription holds its own listener connection, drawn from the
/// pool, and forwards every notification payload parsed as JSON. The rows
/// are expected to be published by a trigger calling `pg_notify` with a
/// body such as `{"type": "UPDATE", "record": {...}, "old_record": {...}}`.
#[derive(Clone)]
pub struct PostgresChangeFeed {
    pool: PgPool,
    config: PostgresChangeFeedConfig,
    next_id: Arc<AtomicU64>,
    active: Arc<Mutex<HashMap<u64, ActiveListener>>>,
}

impl PostgresChangeFeed {
    pub fn new(pool: PgPool) -> Self {
        Self::with_config(pool, PostgresChangeFeedConfig::default())
    }

    pub fn with_config(pool: PgPool, config: PostgresChangeFeedConfig) -> Self {
        Self {
            pool,
            config,
            next_id: Arc::new(AtomicU64::new(1)),
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &PostgresChangeFeedConfig {
        &self.config
    }

    pub fn active_subscriptions(&self) -> usize {
        self.active.lock().len()
    }
}

impl fmt::Debug for PostgresChangeFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresChangeFeed")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .field("config", &self.config)
            .field("active", &self.active_subscriptions())
            .finish()
    }
}

async fn forward_notifications(
    mut listener: PgListener,
    channel: String,
    sender: mpsc::Sender<Value>,
    mut stop: oneshot::Receiver<()>,
) -> Result<()> {
    loop {
        tokio::select! {
            _ = &mut stop => {
                trace!(channel = %channel, "stop requested; unlistening");
                listener.unlisten(&channel).await?;
                return Ok(());
            }
            received = listener.recv() => {
                let notification = match received {
                    Ok(notification) => notification,
                    Err(err) => {
                        error!(
                            channel = %channel,
                            error = %err,
                            "listener connection failed"
                        );
                        return Err(err.into());
                    }
                };

                match serde_json::from_str::<Value>(notification.payload()) {
                    Ok(payload) => {
                        if sender.send(payload).await.is_err() {
                            trace!(
                                channel = %channel,
                                "change stream dropped; stopping listener"
                            );
                            return Ok(());
                        }
                    }
                    Err(err) => {
                        warn!(
                            channel = %channel,
                            error = %err,
                            "skipping non-JSON notification"
                        );
                    }
                }
            }
        }
    }
}

#[async_trait]
impl ChangeFeed for PostgresChangeFeed {
    async fn subscribe(&self, table: &str) -> Result<Subscription> {
        let channel = self.config.channel_for(table)?;

        let mut listener =
            PgListener::connect_with(&self.pool).await.map_err(|err| {
                LiveListError::Subscribe(format!(
                    "listener connect failed: {err}"
                ))
            })?;
        listener.listen(&channel).await.map_err(|err| {
            LiveListError::Subscribe(format!("LISTEN {channel} failed: {err}"))
        })?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) =
            mpsc::channel(self.config.channel_capacity.max(1));
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(forward_notifications(
            listener,
            channel.clone(),
            sender,
            stop_rx,
        ));

        self.active.lock().insert(
            id,
            ActiveListener {
                stop: Some(stop_tx),
                task,
            },
        );
        debug!(table, channel = %channel, id, "listening for job changes");

        Ok(Subscription {
            handle: SubscriptionHandle {
                id,
                table: table.to_owned(),
                channel,
            },
            events: Box::pin(ReceiverStream::new(receiver)),
        })
    }

    /// Ask the listener task to `UNLISTEN` and wait for it to finish.
    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<()> {
        let task = {
            let mut active = self.active.lock();
            let Some(listener) = active.get_mut(&handle.id) else {
                return Err(LiveListError::Release(format!(
                    "unknown subscription {handle}"
                )));
            };
            let delivered = listener
                .stop
                .take()
                .is_some_and(|stop| stop.send(()).is_ok());
            if !delivered {
                // Task already exited; leave the entry for remove_channel.
                return Err(LiveListError::Release(format!(
                    "listener for {handle} is no longer running"
                )));
            }
            active.remove(&handle.id).map(|listener| listener.task)
        };

        match task {
            Some(task) => task.await.map_err(|err| {
                LiveListError::Release(format!("listener task failed: {err}"))
            })?,
            None => Ok(()),
        }
    }

    /// Abort the listener task; its connection is dropped with it.
    async fn remove_channel(&self, handle: &SubscriptionHandle) -> Result<()> {
        match self.active.lock().remove(&handle.id) {
            Some(listener) => {
                listener.task.abort();
                debug!(%handle, "listener task aborted");
                Ok(())
            }
            None => Err(LiveListError::Release(format!(
                "unknown subscription {handle}"
            ))),
        }
    }
}
