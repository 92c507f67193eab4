//! Search and status predicates over the in-memory collection.

use jobwatch_model::{ALL_STATUSES, JobRecord, SEARCH_FIELDS, UNKNOWN_STATUS};

/// Compiled search and status predicates.
///
/// - `status`: [`ALL_STATUSES`] disables the check; otherwise the record's
///   status must equal it ignoring case. Records with no status compare as
///   [`UNKNOWN_STATUS`], matching the entry offered by the status options.
/// - `search`: blank after trimming disables the check; otherwise the
///   lowercased term must occur in at least one of [`SEARCH_FIELDS`].
#[derive(Debug, Clone)]
pub struct RecordFilter {
    term: String,
    status: Option<String>,
}

impl RecordFilter {
    pub fn new(search: &str, status: &str) -> Self {
        Self {
            term: search.trim().to_lowercase(),
            status: (status != ALL_STATUSES).then(|| status.to_lowercase()),
        }
    }

    pub fn matches(&self, record: &JobRecord) -> bool {
        self.status_matches(record) && self.search_matches(record)
    }

    fn status_matches(&self, record: &JobRecord) -> bool {
        let Some(wanted) = self.status.as_deref() else {
            return true;
        };
        let status = record.status();
        status.as_deref().unwrap_or(UNKNOWN_STATUS).to_lowercase() == wanted
    }

    fn search_matches(&self, record: &JobRecord) -> bool {
        self.term.is_empty()
            || SEARCH_FIELDS.iter().any(|field| {
                record.text(field).is_some_and(|value| {
                    value.to_lowercase().contains(&self.term)
                })
            })
    }
}

/// Records that pass both predicates, in collection order.
pub fn filter_records<'a>(
    records: &'a [JobRecord],
    search: &str,
    status: &str,
) -> Vec<&'a JobRecord> {
    let filter = RecordFilter::new(search, status);
    records.iter().filter(|record| filter.matches(record)).collect()
}
