use serde_json::Value;

/// Identity key of a job row.
///
/// Tables may key jobs by text, uuid or integer; the key is kept in its
/// textual form so all of them compare the same way.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        JobId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract an id from a JSON scalar. Strings must be non-blank; numbers
    /// are rendered in their JSON form.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(raw) if !raw.trim().is_empty() => {
                Some(JobId(raw.clone()))
            }
            Value::Number(number) => Some(JobId(number.to_string())),
            _ => None,
        }
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        JobId(value.to_owned())
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        JobId(value)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_and_textual_ids_share_a_key_space() {
        assert_eq!(JobId::from_json(&json!(42)), Some(JobId::from("42")));
        assert_eq!(JobId::from_json(&json!("42")), Some(JobId::from("42")));
    }

    #[test]
    fn blank_or_structured_ids_are_rejected() {
        assert_eq!(JobId::from_json(&json!("  ")), None);
        assert_eq!(JobId::from_json(&json!(null)), None);
        assert_eq!(JobId::from_json(&json!({ "id": 1 })), None);
    }
}
