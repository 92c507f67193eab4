//! LiveListStore - in-memory mirror of a jobs table.
//!
//! The store holds the records most-recent-first, at most one per id. It is
//! mutated only by load completions and change events, both through
//! `&mut self`, so events are applied one at a time in delivery order.

use jobwatch_model::{ChangeEvent, JobId, JobRecord};
use std::collections::HashSet;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::query::{ListQuery, filter_records, sort_by_created, status_options};
use crate::source::DataSource;

/// Progress of the most recent snapshot load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    /// The last load failed; the collection still holds whatever it held
    /// before.
    Failed { reason: String },
}

/// What a change event did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// New id, prepended.
    Inserted,
    /// Insert for an id already present; replaced in place.
    Replaced,
    Updated,
    Removed,
    /// Update or delete for an unknown id, or an unusable payload.
    Ignored,
}

impl ApplyOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, ApplyOutcome::Ignored)
    }
}

#[derive(Debug, Default)]
pub struct LiveListStore {
    records: Vec<JobRecord>,
    state: LoadState,
    version: u64,
}

impl LiveListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an already-fetched snapshot.
    pub fn with_records(records: Vec<JobRecord>) -> Self {
        let mut store = Self::new();
        store.replace_all(records);
        store.state = LoadState::Ready;
        store
    }

    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    pub fn get(&self, id: &JobId) -> Option<&JobRecord> {
        self.position(id).map(|index| &self.records[index])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.state
    }

    /// Failure reason of the last load, if it failed.
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            LoadState::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    /// Bumped on every mutation that changed the collection.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn begin_load(&mut self) {
        self.state = LoadState::Loading;
    }

    /// Fetch the full table, newest first, and replace the collection.
    ///
    /// On failure the reason is recorded and returned, and the current
    /// records are left untouched.
    pub async fn load(
        &mut self,
        source: &dyn DataSource,
        table: &str,
        order_by: &str,
    ) -> Result<usize> {
        self.begin_load();
        let fetched = source.fetch_all(table, order_by, false).await;
        self.finish_load(fetched)
    }

    /// Apply the result of a fetch started elsewhere.
    pub fn finish_load(
        &mut self,
        fetched: Result<Vec<JobRecord>>,
    ) -> Result<usize> {
        match fetched {
            Ok(records) => {
                self.replace_all(records);
                self.state = LoadState::Ready;
                debug!(count = self.records.len(), "job list loaded");
                Ok(self.records.len())
            }
            Err(err) => {
                warn!(
                    error = %err,
                    kept = self.records.len(),
                    "job list load failed"
                );
                self.state = LoadState::Failed {
                    reason: err.to_string(),
                };
                Err(err)
            }
        }
    }

    /// Reconcile one change event against the collection.
    pub fn apply_change(&mut self, event: ChangeEvent) -> ApplyOutcome {
        let outcome = match event {
            ChangeEvent::Insert(record) => match self.position(record.id()) {
                Some(index) => {
                    self.records[index] = record;
                    ApplyOutcome::Replaced
                }
                None => {
                    self.records.insert(0, record);
                    ApplyOutcome::Inserted
                }
            },
            ChangeEvent::Update(record) => match self.position(record.id()) {
                Some(index) => {
                    self.records[index] = record;
                    ApplyOutcome::Updated
                }
                None => ApplyOutcome::Ignored,
            },
            ChangeEvent::Delete(id) => match self.position(&id) {
                Some(index) => {
                    self.records.remove(index);
                    ApplyOutcome::Removed
                }
                None => ApplyOutcome::Ignored,
            },
        };

        if outcome.changed() {
            self.version += 1;
        }
        trace!(?outcome, count = self.records.len(), "change applied");
        outcome
    }

    /// Records matching `search` and `status`, in collection order.
    pub fn filter(&self, search: &str, status: &str) -> Vec<&JobRecord> {
        filter_records(&self.records, search, status)
    }

    /// Filter then order by creation time.
    pub fn query(&self, query: &ListQuery) -> Vec<&JobRecord> {
        let mut matched = self.filter(&query.search, &query.status);
        sort_by_created(&mut matched, query.descending);
        matched
    }

    /// `"all"` followed by each distinct status in first-seen order.
    pub fn status_options(&self) -> Vec<String> {
        status_options(&self.records)
    }

    fn position(&self, id: &JobId) -> Option<usize> {
        self.records.iter().position(|record| record.id() == id)
    }

    /// Snapshots may repeat an id; the first (newest) row wins.
    fn replace_all(&mut self, records: Vec<JobRecord>) {
        let mut seen = HashSet::with_capacity(records.len());
        let before = records.len();
        self.records = records
            .into_iter()
            .filter(|record| seen.insert(record.id().clone()))
            .collect();
        if self.records.len() != before {
            warn!(
                dropped = before - self.records.len(),
                "snapshot contained duplicate ids"
            );
        }
        self.version += 1;
    }
}
