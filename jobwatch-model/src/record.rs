//! One row of the jobs table as mirrored by the live list.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{ModelError, Result};
use crate::ids::JobId;

/// Well-known column names.
pub mod fields {
    pub const ID: &str = "id";
    pub const CREATED_AT: &str = "created_at";
    pub const STATUS: &str = "status";
    pub const CLIENT_NAME: &str = "client_name";
    pub const CLIENT_EMAIL: &str = "client_email";
    pub const ADDRESS: &str = "address";
    pub const UNIT: &str = "unit";
}

/// Columns consulted by free-text search, in match order.
pub const SEARCH_FIELDS: [&str; 4] = [
    fields::CLIENT_NAME,
    fields::ADDRESS,
    fields::UNIT,
    fields::CLIENT_EMAIL,
];

/// A job row: the identity key plus every column the table carried.
///
/// The column map is kept verbatim, `id` included, so a record serializes
/// back to the shape it was read from.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct JobRecord {
    id: JobId,
    columns: Map<String, Value>,
}

impl JobRecord {
    pub fn from_columns(columns: Map<String, Value>) -> Result<Self> {
        let id = columns
            .get(fields::ID)
            .and_then(JobId::from_json)
            .ok_or(ModelError::MissingId)?;
        Ok(Self { id, columns })
    }

    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(columns) => Self::from_columns(columns),
            other => Err(ModelError::InvalidRecord(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn columns(&self) -> &Map<String, Value> {
        &self.columns
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// Textual form of a scalar column. `null`, arrays and objects read as
    /// absent.
    pub fn text(&self, column: &str) -> Option<Cow<'_, str>> {
        match self.columns.get(column)? {
            Value::String(raw) => Some(Cow::Borrowed(raw.as_str())),
            Value::Number(number) => Some(Cow::Owned(number.to_string())),
            Value::Bool(flag) => Some(Cow::Owned(flag.to_string())),
            _ => None,
        }
    }

    /// Status text, with empty strings treated as missing.
    pub fn status(&self) -> Option<Cow<'_, str>> {
        self.text(fields::STATUS).filter(|status| !status.is_empty())
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.columns.get(fields::CREATED_AT).and_then(parse_timestamp)
    }

    /// Creation time used for ordering; rows without a readable timestamp
    /// sort as the Unix epoch.
    pub fn created_at_or_epoch(&self) -> DateTime<Utc> {
        self.created_at().unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl TryFrom<Map<String, Value>> for JobRecord {
    type Error = ModelError;

    fn try_from(columns: Map<String, Value>) -> Result<Self> {
        Self::from_columns(columns)
    }
}

impl From<JobRecord> for Map<String, Value> {
    fn from(record: JobRecord) -> Self {
        record.columns
    }
}

const NAIVE_FORMATS: [&str; 2] =
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse the timestamp shapes Postgres and JSON clients hand out: RFC 3339,
/// the Postgres text form with a short offset, naive date-times (read as
/// UTC), bare dates, and epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => parse_timestamp_str(raw.trim()),
        Value::Number(number) => number
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}

fn parse_timestamp_str(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z")
    {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}
