//! # Jobwatch Core
//!
//! Live-synchronized job list: a snapshot of a jobs table kept current by a
//! row-level change feed, with client-side search, status filtering and
//! ordering over the mirrored rows.
//!
//! ## Overview
//!
//! - [`store`]: the in-memory mirror and its reconciliation rules
//! - [`query`]: filter/sort/status-vocabulary derivations and their cache
//! - [`normalize`]: the single adapter from raw feed payloads to
//!   [`ChangeEvent`]s
//! - [`source`]: the [`DataSource`] and [`ChangeFeed`] collaborator traits
//! - [`session`]: composition root tying store, collaborators and the
//!   subscription lifecycle together
//! - [`memory`] / `postgres`: collaborator implementations
//!
//! ## Feature Flags
//!
//! - `database` (default): Postgres collaborators over sqlx
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use jobwatch_core::{
//!     ListQuery, LiveListSession, MemoryChangeFeed, MemoryDataSource,
//!     SessionOptions,
//! };
//!
//! async fn show_jobs() {
//!     let feed = Arc::new(MemoryChangeFeed::new());
//!     let mut session = LiveListSession::new(
//!         Arc::new(MemoryDataSource::default()),
//!         feed.clone(),
//!         SessionOptions::for_table("jobs"),
//!     );
//!
//!     if session.start().await.is_ok() {
//!         session.pump_pending();
//!         let visible = session.view(&ListQuery::new().with_search("alice"));
//!         println!("{} matching jobs", visible.len());
//!     }
//!     session.shutdown().await;
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

pub mod error;
pub mod ident;
pub mod memory;
pub mod normalize;
#[cfg(feature = "database")]
pub mod postgres;
pub mod query;
pub mod session;
pub mod source;
pub mod store;

pub use error::{LiveListError, Result};
pub use memory::{MemoryChangeFeed, MemoryDataSource};
pub use normalize::normalize_change;
pub use query::{ListQuery, QueryCache};
pub use session::{LiveListSession, SessionOptions};
pub use source::{
    ChangeFeed, DataSource, RawChangeStream, Subscription, SubscriptionHandle,
};
pub use store::{ApplyOutcome, LiveListStore, LoadState};

pub use jobwatch_model::{
    ALL_STATUSES, ChangeEvent, ChangeKind, JobId, JobRecord, StatusCategory,
    UNKNOWN_STATUS,
};
