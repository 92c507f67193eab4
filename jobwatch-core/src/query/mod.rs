//! Client-side queries over the mirrored job list: text search, status
//! filtering, creation-time ordering and the status selector vocabulary.

pub mod cache;
pub mod filtering;
pub mod sorting;
pub mod types;
pub mod vocabulary;

pub use cache::QueryCache;
pub use filtering::{RecordFilter, filter_records};
pub use sorting::sort_by_created;
pub use types::ListQuery;
pub use vocabulary::status_options;
