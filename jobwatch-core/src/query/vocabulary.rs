use jobwatch_model::{ALL_STATUSES, JobRecord, UNKNOWN_STATUS};
use std::collections::HashSet;

/// Options for a status selector: [`ALL_STATUSES`] first, then every
/// distinct status in the order it first appears. Records without a status
/// contribute [`UNKNOWN_STATUS`].
pub fn status_options(records: &[JobRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut options = vec![ALL_STATUSES.to_owned()];

    for record in records {
        let status = record
            .status()
            .map(|status| status.into_owned())
            .unwrap_or_else(|| UNKNOWN_STATUS.to_owned());
        if seen.insert(status.clone()) {
            options.push(status);
        }
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_seen_order_with_placeholder() {
        let records: Vec<JobRecord> = serde_json::from_value(json!([
            { "id": 1, "status": "Pending" },
            { "id": 2 },
            { "id": 3, "status": "Done" },
            { "id": 4, "status": "Pending" },
            { "id": 5, "status": "" },
            { "id": 6, "status": "done" },
        ]))
        .expect("valid rows");

        assert_eq!(
            status_options(&records),
            ["all", "Pending", "Unknown", "Done", "done"]
        );
    }

    #[test]
    fn empty_collection_offers_only_all() {
        assert_eq!(status_options(&[]), ["all"]);
    }
}
