//! Collaborator boundary: where rows and change notifications come from.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use jobwatch_model::JobRecord;
use serde_json::Value;

use crate::error::{LiveListError, Result};

/// Raw change payloads exactly as the feed delivered them. Normalization
/// happens in [`crate::normalize`].
pub type RawChangeStream = Pin<Box<dyn Stream<Item = Value> + Send>>;

/// One-shot reader for the full contents of a table.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_all(
        &self,
        table: &str,
        order_by: &str,
        ascending: bool,
    ) -> Result<Vec<JobRecord>>;
}

/// Opaque token identifying one live subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    pub id: u64,
    pub table: String,
    pub channel: String,
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{} ({})", self.channel, self.id, self.table)
    }
}

/// An open subscription: its handle plus the stream of payloads.
pub struct Subscription {
    pub handle: SubscriptionHandle,
    pub events: RawChangeStream,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

/// Long-lived push channel of row-level changes for a table.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    async fn subscribe(&self, table: &str) -> Result<Subscription>;

    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<()>;

    /// Alternate release path, tried when [`ChangeFeed::unsubscribe`] fails.
    async fn remove_channel(&self, _handle: &SubscriptionHandle) -> Result<()> {
        Err(LiveListError::Unsupported(
            "ChangeFeed::remove_channel not implemented".into(),
        ))
    }
}
