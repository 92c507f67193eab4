//! Turns raw change-feed payloads into [`ChangeEvent`]s.
//!
//! Realtime clients disagree on where they put the operation name and the
//! row images. Every shape this crate tolerates is handled here and nowhere
//! else; the store only ever sees the canonical event.
//!
//! Accepted keys:
//!
//! - kind: `eventType`, `type`, `event`, `operation`, `op`, `action`
//! - new row: `new`, `record`, `new_record`
//! - old row: `old`, `old_record`
//!
//! Without a recognizable kind, a payload carrying a new row and no old row
//! is read as an insert. Anything else is dropped.

use jobwatch_model::{ChangeEvent, ChangeKind, JobId, JobRecord, fields};
use serde_json::{Map, Value};
use tracing::debug;

const KIND_KEYS: [&str; 6] =
    ["eventType", "type", "event", "operation", "op", "action"];
const NEW_KEYS: [&str; 3] = ["new", "record", "new_record"];
const OLD_KEYS: [&str; 2] = ["old", "old_record"];

/// Normalize one payload. Returns `None` for payloads that cannot be
/// classified or lack the row data their kind needs.
pub fn normalize_change(payload: &Value) -> Option<ChangeEvent> {
    let Some(body) = payload.as_object() else {
        debug!(payload = %payload, "dropping non-object change payload");
        return None;
    };

    let new_row = row_image(body, &NEW_KEYS);
    let old_row = row_image(body, &OLD_KEYS);

    let event = match detect_kind(body) {
        Some(ChangeKind::Insert) => {
            new_row.and_then(to_record).map(ChangeEvent::Insert)
        }
        Some(ChangeKind::Update) => {
            new_row.and_then(to_record).map(ChangeEvent::Update)
        }
        Some(ChangeKind::Delete) => old_row
            .or(new_row)
            .and_then(|row| row.get(fields::ID))
            .and_then(JobId::from_json)
            .map(ChangeEvent::Delete),
        None if old_row.is_none() => {
            new_row.and_then(to_record).map(ChangeEvent::Insert)
        }
        None => None,
    };

    if event.is_none() {
        debug!(payload = %payload, "dropping unclassifiable change payload");
    }
    event
}

fn detect_kind(body: &Map<String, Value>) -> Option<ChangeKind> {
    KIND_KEYS
        .iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .find_map(|raw| raw.parse().ok())
}

/// First non-empty row image under any of `keys`. Realtime clients send
/// `{}` for the image that does not apply, so empty objects count as absent.
fn row_image<'a>(
    body: &'a Map<String, Value>,
    keys: &[&str],
) -> Option<&'a Map<String, Value>> {
    keys.iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_object))
        .find(|row| !row.is_empty())
}

fn to_record(row: &Map<String, Value>) -> Option<JobRecord> {
    match JobRecord::from_columns(row.clone()) {
        Ok(record) => Some(record),
        Err(err) => {
            debug!(error = %err, "change payload row is not a record");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn is_insert(payload: &Value) -> bool {
        matches!(normalize_change(payload), Some(ChangeEvent::Insert(_)))
    }

    #[test]
    fn recognizes_every_kind_key() {
        for key in KIND_KEYS {
            let payload = json!({ key: "UPDATE", "new": { "id": 1 } });
            assert!(
                matches!(
                    normalize_change(&payload),
                    Some(ChangeEvent::Update(_))
                ),
                "{key}"
            );
        }
    }

    #[test]
    fn kind_is_case_insensitive() {
        let payload = json!({ "eventType": "insert", "record": { "id": "a" } });
        assert!(is_insert(&payload));
    }

    #[test]
    fn unrecognized_kind_value_falls_through_to_next_key() {
        let payload = json!({
            "type": "broadcast",
            "operation": "DELETE",
            "old": { "id": 9 },
        });
        assert_eq!(
            normalize_change(&payload),
            Some(ChangeEvent::Delete(JobId::from("9")))
        );
    }

    #[test]
    fn delete_reads_id_from_old_row_then_new_row() {
        let from_old = json!({ "type": "DELETE", "old_record": { "id": 3 } });
        assert_eq!(
            normalize_change(&from_old),
            Some(ChangeEvent::Delete(JobId::from("3")))
        );

        let from_new =
            json!({ "type": "DELETE", "new": { "id": 4 }, "old": {} });
        assert_eq!(
            normalize_change(&from_new),
            Some(ChangeEvent::Delete(JobId::from("4")))
        );
    }

    #[test]
    fn shape_sniffing_only_covers_new_without_old() {
        let insert = json!({ "new": { "id": 5, "status": "pending" } });
        assert!(is_insert(&insert));

        let empty_old = json!({ "new": { "id": 5 }, "old": {} });
        assert!(is_insert(&empty_old));

        let both = json!({ "new": { "id": 5 }, "old": { "id": 5 } });
        assert_eq!(normalize_change(&both), None);

        let only_old = json!({ "old": { "id": 5 } });
        assert_eq!(normalize_change(&only_old), None);
    }

    #[test]
    fn drops_payloads_missing_required_rows() {
        assert_eq!(normalize_change(&json!({ "type": "UPDATE" })), None);
        let no_old = json!({ "type": "DELETE", "old": {} });
        assert_eq!(normalize_change(&no_old), None);
        let no_id = json!({ "type": "INSERT", "new": { "status": "x" } });
        assert_eq!(normalize_change(&no_id), None);
        assert_eq!(normalize_change(&json!("INSERT")), None);
    }
}
