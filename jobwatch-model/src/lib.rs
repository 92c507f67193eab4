//! Core data model definitions shared across jobwatch crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod change;
pub mod error;
pub mod ids;
pub mod record;
pub mod status;

pub use change::{ChangeEvent, ChangeKind, UnknownChangeKind};
pub use error::{ModelError, Result as ModelResult};
pub use ids::JobId;
pub use record::{JobRecord, SEARCH_FIELDS, fields, parse_timestamp};
pub use status::{ALL_STATUSES, StatusCategory, UNKNOWN_STATUS};
