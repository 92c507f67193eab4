use jobwatch_model::JobRecord;
use tracing::trace;

use super::filtering::RecordFilter;
use super::sorting::sort_by_created_with;
use super::types::ListQuery;
use crate::store::LiveListStore;

/// Memoized result of [`LiveListStore::query`], keyed by the query and the
/// store version it was computed against.
#[derive(Debug, Default)]
pub struct QueryCache {
    key: Option<(ListQuery, u64)>,
    /// Indices into the store's records; valid while the version holds.
    positions: Vec<usize>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filtered and sorted records, recomputed only when the query or the
    /// store changed since the last call.
    pub fn view<'a>(
        &mut self,
        store: &'a LiveListStore,
        query: &ListQuery,
    ) -> Vec<&'a JobRecord> {
        if !self.is_fresh(store, query) {
            self.recompute(store, query);
        }

        let records = store.records();
        self.positions.iter().map(|&index| &records[index]).collect()
    }

    pub fn is_fresh(&self, store: &LiveListStore, query: &ListQuery) -> bool {
        self.key.as_ref().is_some_and(|(cached, version)| {
            *version == store.version() && cached == query
        })
    }

    pub fn invalidate(&mut self) {
        self.key = None;
    }

    fn recompute(&mut self, store: &LiveListStore, query: &ListQuery) {
        let records = store.records();
        let filter = RecordFilter::new(&query.search, &query.status);

        let mut positions: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| filter.matches(record))
            .map(|(index, _)| index)
            .collect();

        sort_by_created_with(&mut positions, query.descending, |&index| {
            &records[index]
        });

        trace!(
            matches = positions.len(),
            version = store.version(),
            "query view recomputed"
        );
        self.positions = positions;
        self.key = Some((query.clone(), store.version()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobwatch_model::{ChangeEvent, JobId};
    use serde_json::json;

    fn store() -> LiveListStore {
        LiveListStore::with_records(
            serde_json::from_value(json!([
                {
                    "id": 1, "status": "Done",
                    "created_at": "2024-01-01", "client_name": "Alice",
                },
                {
                    "id": 2, "status": "Pending",
                    "created_at": "2024-03-01", "client_name": "Bob",
                },
                {
                    "id": 3, "status": "Done",
                    "created_at": "2024-02-01", "client_name": "Alina",
                },
                { "id": 4, "status": "Done", "client_name": "Dana" },
                { "id": 5, "status": "Done", "created_at": "2024-02-01" },
            ]))
            .expect("valid rows"),
        )
    }

    fn ids(view: &[&JobRecord]) -> Vec<String> {
        view.iter().map(|record| record.id().to_string()).collect()
    }

    #[test]
    fn matches_uncached_query() {
        let store = store();
        let mut cache = QueryCache::new();
        let query = ListQuery::new().with_search("ali").with_status("done");

        assert_eq!(
            ids(&cache.view(&store, &query)),
            ids(&store.query(&query))
        );
        assert_eq!(ids(&cache.view(&store, &query)), ["3", "1"]);
    }

    #[test]
    fn orders_like_the_store_in_both_directions() {
        let store = store();
        let mut cache = QueryCache::new();
        let mut query = ListQuery::new();

        let newest_first = ids(&cache.view(&store, &query));
        assert_eq!(newest_first, ids(&store.query(&query)));
        assert_eq!(newest_first, ["2", "3", "5", "1", "4"]);

        query.toggle_order();
        assert!(!query.descending);
        assert!(!cache.is_fresh(&store, &query));
        let oldest_first = ids(&cache.view(&store, &query));
        assert_eq!(oldest_first, ids(&store.query(&query)));
        assert_eq!(oldest_first, ["4", "1", "3", "5", "2"]);

        query.toggle_order();
        assert_eq!(ids(&cache.view(&store, &query)), newest_first);
    }

    #[test]
    fn recomputes_when_query_or_version_changes() {
        let mut store = store();
        let mut cache = QueryCache::new();
        let query = ListQuery::new();

        assert_eq!(
            ids(&cache.view(&store, &query)),
            ["2", "3", "5", "1", "4"]
        );
        assert!(cache.is_fresh(&store, &query));

        let ascending = query.clone().with_descending(false);
        assert!(!cache.is_fresh(&store, &ascending));
        assert_eq!(
            ids(&cache.view(&store, &ascending)),
            ["4", "1", "3", "5", "2"]
        );

        store.apply_change(ChangeEvent::Delete(JobId::from("3")));
        assert!(!cache.is_fresh(&store, &ascending));
        assert_eq!(ids(&cache.view(&store, &ascending)), ["4", "1", "5", "2"]);
    }

    #[test]
    fn ignored_events_keep_cache_fresh() {
        let mut store = store();
        let mut cache = QueryCache::new();
        let query = ListQuery::new();
        cache.view(&store, &query);

        store.apply_change(ChangeEvent::Delete(JobId::from("404")));
        assert!(cache.is_fresh(&store, &query));

        cache.invalidate();
        assert!(!cache.is_fresh(&store, &query));
    }
}
