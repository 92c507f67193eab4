use jobwatch_model::JobRecord;
use std::cmp::Reverse;

/// Order by `created_at`. Missing or unreadable timestamps count as the
/// epoch. The sort is stable, so ties keep their collection order.
pub fn sort_by_created(records: &mut [&JobRecord], descending: bool) {
    sort_by_created_with(records, descending, |record| *record);
}

/// [`sort_by_created`] over any item that resolves to a record, such as an
/// index into the store.
pub(crate) fn sort_by_created_with<'a, T, F>(
    items: &mut [T],
    descending: bool,
    record: F,
) where
    F: Fn(&T) -> &'a JobRecord,
{
    items.sort_by_cached_key(|item| {
        let created = record(item).created_at_or_epoch();
        if descending {
            CreatedKey::Descending(Reverse(created))
        } else {
            CreatedKey::Ascending(created)
        }
    });
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum CreatedKey<T> {
    Ascending(T),
    Descending(Reverse<T>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records() -> Vec<JobRecord> {
        serde_json::from_value(json!([
            { "id": "a", "created_at": "2023-01-01T00:00:00Z" },
            { "id": "b", "created_at": "2024-06-01T00:00:00Z" },
            { "id": "c", "created_at": null },
        ]))
        .expect("valid rows")
    }

    fn order(records: &[&JobRecord]) -> Vec<String> {
        records.iter().map(|record| record.id().to_string()).collect()
    }

    #[test]
    fn descending_puts_missing_timestamps_last() {
        let owned = records();
        let mut view: Vec<&JobRecord> = owned.iter().collect();
        sort_by_created(&mut view, true);
        assert_eq!(order(&view), ["b", "a", "c"]);
    }

    #[test]
    fn ascending_puts_missing_timestamps_first() {
        let owned = records();
        let mut view: Vec<&JobRecord> = owned.iter().collect();
        sort_by_created(&mut view, false);
        assert_eq!(order(&view), ["c", "a", "b"]);
    }

    #[test]
    fn ties_keep_collection_order_both_ways() {
        let owned: Vec<JobRecord> = serde_json::from_value(json!([
            { "id": 1, "created_at": "2024-01-01" },
            { "id": 2, "created_at": "2024-01-01T00:00:00Z" },
            { "id": 3, "created_at": "2025-01-01" },
            { "id": 4 },
            { "id": 5, "created_at": "garbage" },
        ]))
        .expect("valid rows");

        let mut view: Vec<&JobRecord> = owned.iter().collect();
        sort_by_created(&mut view, true);
        assert_eq!(order(&view), ["3", "1", "2", "4", "5"]);

        sort_by_created(&mut view, false);
        assert_eq!(order(&view), ["4", "5", "1", "2", "3"]);
    }
}
