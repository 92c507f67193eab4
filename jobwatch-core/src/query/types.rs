use jobwatch_model::ALL_STATUSES;

/// Inputs of the list view: free-text search, status selection and sort
/// direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pub search: String,
    pub status: String,
    /// Newest first when `true`.
    pub descending: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: ALL_STATUSES.to_owned(),
            descending: true,
        }
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    /// Flip the sort direction.
    pub fn toggle_order(&mut self) {
        self.descending = !self.descending;
    }
}
