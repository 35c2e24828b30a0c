use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

// ---------------------------------------------------------------------------
// Reserved columns
// ---------------------------------------------------------------------------

/// Column names the source query capability uses for bookkeeping. They never
/// enter a record's tag set, and neither does any key starting with `_`.
pub const RESERVED_COLUMNS: [&str; 8] = [
    "result",
    "table",
    "_start",
    "_stop",
    "_time",
    "_measurement",
    "_field",
    "_value",
];

/// Whether `key` may appear in a tag set.
pub fn is_tag_column(key: &str) -> bool {
    !key.is_empty() && !key.starts_with('_') && !RESERVED_COLUMNS.contains(&key)
}

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// A typed field value, carried from source to destination unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    UInteger(u64),
    Boolean(bool),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::UInteger(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// SourceRecord
// ---------------------------------------------------------------------------

/// One raw reading as yielded by the source stream.
///
/// The required parts are optional here because a source row can lack them;
/// the transformer skips such records instead of failing the run. A record is
/// ephemeral: it exists for the duration of one transform call.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub measurement: Option<String>,
    pub field: Option<String>,
    pub value: Option<FieldValue>,
    pub time: Option<DateTime<Utc>>,
    pub tags: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// OutputPoint
// ---------------------------------------------------------------------------

/// A fully transformed point, ready for the destination bucket. Constructed
/// once per source record and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPoint {
    pub measurement: String,
    pub field: String,
    pub value: FieldValue,
    pub time: DateTime<Utc>,
    pub tags: BTreeMap<String, String>,
}

impl fmt::Display for OutputPoint {
    /// Human-readable single-line form, e.g.
    /// `control,device=X,env=production temp=21.5 2025-01-01T01:00:00Z`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.measurement)?;
        for (key, value) in &self.tags {
            write!(f, ",{key}={value}")?;
        }
        write!(
            f,
            " {}={} {}",
            self.field,
            self.value,
            self.time.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
