//! SQL identifier checks for table, column and channel names that end up
//! interpolated into statements.

use crate::error::{LiveListError, Result};

/// Postgres truncates identifiers past this length.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Accept plain identifiers: an ASCII letter or underscore followed by
/// letters, digits or underscores.
pub fn validate_identifier(raw: &str) -> Result<&str> {
    let mut chars = raw.chars();
    let valid_head = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_head && valid_tail && raw.len() <= MAX_IDENTIFIER_LEN {
        Ok(raw)
    } else {
        Err(LiveListError::InvalidIdentifier(raw.to_owned()))
    }
}

/// Validate and double-quote an identifier for use in SQL text.
pub fn quote_identifier(raw: &str) -> Result<String> {
    validate_identifier(raw).map(|name| format!("\"{name}\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        for name in ["jobs", "_jobs", "job_history_2024", "CreatedAt"] {
            assert_eq!(validate_identifier(name).ok(), Some(name));
        }
        assert_eq!(quote_identifier("jobs").ok().as_deref(), Some("\"jobs\""));
    }

    #[test]
    fn rejects_anything_that_needs_escaping() {
        let too_long = "a".repeat(MAX_IDENTIFIER_LEN + 1);
        for name in [
            "",
            "1jobs",
            "jobs; drop table jobs",
            "public.jobs",
            "jobs\"",
            "jöbs",
            too_long.as_str(),
        ] {
            assert!(
                matches!(
                    validate_identifier(name),
                    Err(LiveListError::InvalidIdentifier(_))
                ),
                "{name}"
            );
        }
    }
}
