use std::fmt;
use std::str::FromStr;

use crate::ids::JobId;
use crate::record::JobRecord;

/// Row-level operation reported by the change feed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "insert",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names none of the three row operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChangeKind(pub String);

impl fmt::Display for UnknownChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown change kind: {}", self.0)
    }
}

impl std::error::Error for UnknownChangeKind {}

impl FromStr for ChangeKind {
    type Err = UnknownChangeKind;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("insert") {
            Ok(ChangeKind::Insert)
        } else if trimmed.eq_ignore_ascii_case("update") {
            Ok(ChangeKind::Update)
        } else if trimmed.eq_ignore_ascii_case("delete") {
            Ok(ChangeKind::Delete)
        } else {
            Err(UnknownChangeKind(raw.to_owned()))
        }
    }
}

/// A change event in its canonical shape, ready to reconcile.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    Insert(JobRecord),
    Update(JobRecord),
    Delete(JobId),
}

impl ChangeEvent {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Insert(_) => ChangeKind::Insert,
            ChangeEvent::Update(_) => ChangeKind::Update,
            ChangeEvent::Delete(_) => ChangeKind::Delete,
        }
    }

    /// Identity of the row the event targets.
    pub fn id(&self) -> &JobId {
        match self {
            ChangeEvent::Insert(record) | ChangeEvent::Update(record) => {
                record.id()
            }
            ChangeEvent::Delete(id) => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parsing_ignores_case_and_padding() {
        assert_eq!("INSERT".parse(), Ok(ChangeKind::Insert));
        assert_eq!(" Update ".parse(), Ok(ChangeKind::Update));
        assert_eq!("delete".parse(), Ok(ChangeKind::Delete));
        assert!("upsert".parse::<ChangeKind>().is_err());
    }
}
