//! LiveListSession - composition root of a live job list view.
//!
//! A session owns the store, the derived-view cache and the change-feed
//! subscription. Its lifecycle mirrors the view: [`LiveListSession::start`]
//! when the view appears, [`LiveListSession::shutdown`] when it goes away.
//! Both collaborators are handed in explicitly; nothing here reaches for a
//! process-wide client.

use std::fmt;
use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use jobwatch_model::{JobRecord, fields};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::normalize::normalize_change;
use crate::query::{ListQuery, QueryCache};
use crate::source::{ChangeFeed, DataSource, Subscription};
use crate::store::{ApplyOutcome, LiveListStore};

/// Which table to mirror and how to order the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub table: String,
    pub order_by: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            table: "jobs".to_owned(),
            order_by: fields::CREATED_AT.to_owned(),
        }
    }
}

impl SessionOptions {
    pub fn for_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }
}

pub struct LiveListSession {
    source: Arc<dyn DataSource>,
    feed: Arc<dyn ChangeFeed>,
    options: SessionOptions,
    store: LiveListStore,
    cache: QueryCache,
    subscription: Option<Subscription>,
    feed_closed: bool,
}

impl fmt::Debug for LiveListSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveListSession")
            .field("options", &self.options)
            .field("store", &self.store)
            .field("subscription", &self.subscription)
            .field("feed_closed", &self.feed_closed)
            .finish_non_exhaustive()
    }
}

impl LiveListSession {
    pub fn new(
        source: Arc<dyn DataSource>,
        feed: Arc<dyn ChangeFeed>,
        options: SessionOptions,
    ) -> Self {
        Self {
            source,
            feed,
            options,
            store: LiveListStore::new(),
            cache: QueryCache::new(),
            subscription: None,
            feed_closed: false,
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn store(&self) -> &LiveListStore {
        &self.store
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Load the snapshot, then open the change feed.
    ///
    /// A failed load is recorded on the store and does not stop the
    /// subscription; the view shows the error next to whatever data it has.
    /// A failed subscription is returned.
    pub async fn start(&mut self) -> Result<()> {
        if let Err(err) = self.reload().await {
            warn!(
                table = %self.options.table,
                error = %err,
                "initial load failed; subscribing anyway"
            );
        }
        self.subscribe().await
    }

    /// Re-run the snapshot load. The outcome is also kept on the store.
    pub async fn reload(&mut self) -> Result<usize> {
        let SessionOptions { table, order_by } = &self.options;
        self.store.load(self.source.as_ref(), table, order_by).await
    }

    async fn subscribe(&mut self) -> Result<()> {
        if let Some(subscription) = &self.subscription {
            debug!(handle = %subscription.handle, "already subscribed");
            return Ok(());
        }

        let subscription = self
            .feed
            .subscribe(&self.options.table)
            .await
            .inspect_err(|err| {
                warn!(
                    table = %self.options.table,
                    error = %err,
                    "job change subscription failed"
                );
            })?;
        info!(handle = %subscription.handle, "subscribed to job changes");
        self.subscription = Some(subscription);
        self.feed_closed = false;
        Ok(())
    }

    /// Wait for the next payload from the feed and reconcile it.
    ///
    /// Returns `None` when there is no subscription or the feed ended.
    /// Payloads that cannot be normalized yield [`ApplyOutcome::Ignored`].
    pub async fn next_event(&mut self) -> Option<ApplyOutcome> {
        let subscription = self.subscription.as_mut()?;
        match subscription.events.next().await {
            Some(payload) => Some(self.apply_payload(&payload)),
            None => {
                self.mark_feed_closed();
                None
            }
        }
    }

    /// Reconcile every payload already buffered, without waiting. Returns
    /// how many payloads were consumed.
    pub fn pump_pending(&mut self) -> usize {
        let mut consumed = 0;
        loop {
            let Some(subscription) = self.subscription.as_mut() else {
                return consumed;
            };
            match subscription.events.next().now_or_never() {
                Some(Some(payload)) => {
                    self.apply_payload(&payload);
                    consumed += 1;
                }
                Some(None) => {
                    self.mark_feed_closed();
                    return consumed;
                }
                None => return consumed,
            }
        }
    }

    /// Reconcile events until the feed ends.
    pub async fn run(&mut self) {
        while self.next_event().await.is_some() {}
    }

    /// Normalize and apply one raw payload.
    pub fn apply_payload(&mut self, payload: &Value) -> ApplyOutcome {
        match normalize_change(payload) {
            Some(event) => {
                let kind = event.kind();
                let id = event.id().clone();
                let outcome = self.store.apply_change(event);
                debug!(%kind, %id, ?outcome, "job change reconciled");
                outcome
            }
            None => ApplyOutcome::Ignored,
        }
    }

    /// Filtered and sorted records for `query`, memoized across calls.
    pub fn view(&mut self, query: &ListQuery) -> Vec<&JobRecord> {
        self.cache.view(&self.store, query)
    }

    pub fn status_options(&self) -> Vec<String> {
        self.store.status_options()
    }

    /// Release the subscription. Tries `unsubscribe`, then `remove_channel`;
    /// a failure of both is logged and dropped.
    pub async fn shutdown(&mut self) {
        let Some(subscription) = self.subscription.take() else {
            return;
        };
        let Subscription { handle, events } = subscription;
        drop(events);

        match self.feed.unsubscribe(&handle).await {
            Ok(()) => debug!(%handle, "subscription released"),
            Err(err) => {
                warn!(
                    %handle,
                    error = %err,
                    "unsubscribe failed; removing channel"
                );
                if let Err(err) = self.feed.remove_channel(&handle).await {
                    debug!(
                        %handle,
                        error = %err,
                        "channel removal failed; giving up"
                    );
                }
            }
        }
    }

    fn mark_feed_closed(&mut self) {
        if !self.feed_closed {
            info!(table = %self.options.table, "job change feed ended");
            self.feed_closed = true;
        }
    }
}

impl Drop for LiveListSession {
    fn drop(&mut self) {
        if let Some(subscription) = &self.subscription {
            warn!(
                handle = %subscription.handle,
                "session dropped without shutdown; subscription leaked"
            );
        }
    }
}
