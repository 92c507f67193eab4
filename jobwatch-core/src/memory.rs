//! In-process collaborators, for tests and for wiring the view without a
//! database.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jobwatch_model::{JobRecord, parse_timestamp};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, trace};

use crate::error::{LiveListError, Result};
use crate::source::{ChangeFeed, DataSource, Subscription, SubscriptionHandle};

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Table snapshot held in memory. Rows are ordered by the requested column
/// read as a timestamp.
#[derive(Debug, Default)]
pub struct MemoryDataSource {
    records: Mutex<Vec<JobRecord>>,
    failure: Mutex<Option<String>>,
    fetches: AtomicUsize,
}

impl MemoryDataSource {
    pub fn new(records: Vec<JobRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Make every following fetch fail with `reason`, or succeed again with
    /// `None`.
    pub fn fail_with(&self, reason: Option<&str>) {
        *self.failure.lock() = reason.map(str::to_owned);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DataSource for MemoryDataSource {
    async fn fetch_all(
        &self,
        table: &str,
        order_by: &str,
        ascending: bool,
    ) -> Result<Vec<JobRecord>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        if let Some(reason) = self.failure.lock().clone() {
            return Err(LiveListError::Fetch(reason));
        }

        let mut rows = self.records.lock().clone();
        let key = |record: &JobRecord| {
            record
                .get(order_by)
                .and_then(parse_timestamp)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        };
        if ascending {
            rows.sort_by_cached_key(key);
        } else {
            rows.sort_by_cached_key(|record| Reverse(key(record)));
        }

        trace!(table, count = rows.len(), "memory snapshot served");
        Ok(rows)
    }
}

struct MemorySubscriber {
    table: String,
    sender: mpsc::Sender<Value>,
}

/// Change feed fed by [`MemoryChangeFeed::publish`].
///
/// Release failures can be switched on to exercise teardown fallbacks.
pub struct MemoryChangeFeed {
    capacity: usize,
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<u64, MemorySubscriber>>,
    fail_subscribe: AtomicBool,
    fail_unsubscribe: AtomicBool,
    fail_remove_channel: AtomicBool,
}

impl Default for MemoryChangeFeed {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl fmt::Debug for MemoryChangeFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryChangeFeed")
            .field("capacity", &self.capacity)
            .field("active", &self.active_subscriptions())
            .finish()
    }
}

impl MemoryChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            next_id: AtomicU64::new(1),
            subscribers: Mutex::new(HashMap::new()),
            fail_subscribe: AtomicBool::new(false),
            fail_unsubscribe: AtomicBool::new(false),
            fail_remove_channel: AtomicBool::new(false),
        }
    }

    pub fn fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::Relaxed);
    }

    pub fn fail_unsubscribe(&self, fail: bool) {
        self.fail_unsubscribe.store(fail, Ordering::Relaxed);
    }

    pub fn fail_remove_channel(&self, fail: bool) {
        self.fail_remove_channel.store(fail, Ordering::Relaxed);
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Deliver `payload` to every subscriber of `table`. Returns how many
    /// subscribers received it.
    pub async fn publish(&self, table: &str, payload: Value) -> usize {
        let senders: Vec<mpsc::Sender<Value>> = self
            .subscribers
            .lock()
            .values()
            .filter(|subscriber| subscriber.table == table)
            .map(|subscriber| subscriber.sender.clone())
            .collect();

        let mut delivered = 0;
        for sender in senders {
            if sender.send(payload.clone()).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    fn release(&self, handle: &SubscriptionHandle, method: &str) -> Result<()> {
        match self.subscribers.lock().remove(&handle.id) {
            Some(_) => {
                debug!(%handle, method, "memory subscription released");
                Ok(())
            }
            None => Err(LiveListError::Release(format!(
                "unknown subscription {handle}"
            ))),
        }
    }
}

#[async_trait]
impl ChangeFeed for MemoryChangeFeed {
    async fn subscribe(&self, table: &str) -> Result<Subscription> {
        if self.fail_subscribe.load(Ordering::Relaxed) {
            return Err(LiveListError::Subscribe(format!(
                "memory feed refused subscription to {table}"
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.capacity);
        self.subscribers.lock().insert(
            id,
            MemorySubscriber {
                table: table.to_owned(),
                sender,
            },
        );

        Ok(Subscription {
            handle: SubscriptionHandle {
                id,
                table: table.to_owned(),
                channel: format!("memory:{table}"),
            },
            events: Box::pin(ReceiverStream::new(receiver)),
        })
    }

    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<()> {
        if self.fail_unsubscribe.load(Ordering::Relaxed) {
            return Err(LiveListError::Release(format!(
                "unsubscribe refused for {handle}"
            )));
        }
        self.release(handle, "unsubscribe")
    }

    async fn remove_channel(&self, handle: &SubscriptionHandle) -> Result<()> {
        if self.fail_remove_channel.load(Ordering::Relaxed) {
            return Err(LiveListError::Release(format!(
                "remove_channel refused for {handle}"
            )));
        }
        self.release(handle, "remove_channel")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn data_source_orders_by_requested_column() {
        let source = MemoryDataSource::new(
            serde_json::from_value(json!([
                { "id": 1, "created_at": "2024-01-01" },
                { "id": 2, "created_at": "2024-03-01" },
                { "id": 3 },
            ]))
            .expect("valid rows"),
        );

        let newest_first = source
            .fetch_all("jobs", "created_at", false)
            .await
            .expect("fetch");
        let ids: Vec<&str> =
            newest_first.iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids, ["2", "1", "3"]);

        source.fail_with(Some("connection reset"));
        assert!(matches!(
            source.fetch_all("jobs", "created_at", false).await,
            Err(LiveListError::Fetch(reason)) if reason == "connection reset"
        ));
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn publish_reaches_only_matching_table() {
        let feed = MemoryChangeFeed::new();
        let mut jobs = feed.subscribe("jobs").await.expect("subscribe");
        let _other = feed.subscribe("invoices").await.expect("subscribe");

        assert_eq!(feed.publish("jobs", json!({ "type": "INSERT" })).await, 1);
        assert_eq!(jobs.events.next().await, Some(json!({ "type": "INSERT" })));
    }

    #[tokio::test]
    async fn release_closes_stream() {
        let feed = MemoryChangeFeed::new();
        let mut subscription = feed.subscribe("jobs").await.expect("subscribe");

        feed.unsubscribe(&subscription.handle).await.expect("release");
        assert_eq!(feed.active_subscriptions(), 0);
        assert_eq!(subscription.events.next().await, None);

        assert!(feed.remove_channel(&subscription.handle).await.is_err());
    }
}
