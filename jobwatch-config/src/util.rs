use std::path::PathBuf;

/// Trimmed value of `name`, or `None` when unset or blank.
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(non_blank)
}

pub fn env_path(name: &str) -> Option<PathBuf> {
    env_var(name).map(PathBuf::from)
}

pub fn non_blank(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
