//! Bind-parameter values.
//!
//! Everything the engine places into a query that did not come from a
//! whitelist is carried as a [`Value`] and bound through a dialect
//! placeholder, never spliced into SQL text.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// SQL parameter values.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    /// Integer literal from a filter, or a serial order key.
    Int(i64),
    /// Floating point literal from a filter.
    Float(f64),
    /// Quoted string literal from a filter (quotes removed, `''` unescaped).
    Text(String),
    /// Row identifier of a cursor anchor.
    Uuid(Uuid),
    /// Timestamp order key of a cursor anchor.
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Render the value as text in the same fixed format the cursor codec uses.
    ///
    /// Useful for stores that keep UUIDs and timestamps as `TEXT` columns,
    /// where comparisons are lexicographic and must match the token format.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
            Self::Uuid(id) => id.hyphenated().to_string(),
            Self::Timestamp(ts) => format_timestamp(ts),
        }
    }
}

/// Fixed timestamp format: RFC 3339, UTC `Z` suffix, nanosecond precision.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}
