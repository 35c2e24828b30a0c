use std::collections::BTreeMap;
use std::io::Read;

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use orion_error::prelude::*;

use ff_core::error::{CopyReason, CopyResult};
use ff_core::{FieldValue, SourceRecord, is_tag_column};

// ---------------------------------------------------------------------------
// RecordIter — lazy annotated-CSV decoder
// ---------------------------------------------------------------------------

/// Streaming decoder for an annotated-CSV query response.
///
/// Rows are pulled from the underlying reader one at a time, so memory use is
/// independent of the result size. A `#datatype` annotation row resets the
/// per-table state; the next plain row becomes that table's header. Responses
/// carrying several result tables therefore decode correctly.
pub struct RecordIter<R: Read> {
    rows: StringRecordsIntoIter<R>,
    columns: Option<Columns>,
    datatypes: Option<StringRecord>,
}

/// Column positions resolved from one table's header row.
struct Columns {
    measurement: Option<usize>,
    field: Option<usize>,
    value: Option<usize>,
    time: Option<usize>,
    tags: Vec<(usize, String)>,
    value_type: ValueType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueType {
    Double,
    Long,
    UnsignedLong,
    Boolean,
    Text,
    Unknown,
}

impl<R: Read> RecordIter<R> {
    pub fn new(reader: R) -> Self {
        let rows = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader)
            .into_records();
        Self {
            rows,
            columns: None,
            datatypes: None,
        }
    }
}

impl<R: Read> Iterator for RecordIter<R> {
    type Item = CopyResult<SourceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = match self.rows.next()? {
                Ok(row) => row,
                Err(e) => {
                    return Some(
                        StructError::from(CopyReason::SourceRead)
                            .with_detail(format!("csv decode: {e}"))
                            .err(),
                    );
                }
            };

            // Blank separator between result tables.
            if row.iter().all(str::is_empty) {
                self.columns = None;
                self.datatypes = None;
                continue;
            }

            // Annotation rows precede each table's header.
            if let Some(first) = row.get(0)
                && first.starts_with('#')
            {
                if first == "#datatype" {
                    self.datatypes = Some(row);
                }
                self.columns = None;
                continue;
            }

            if let Some(columns) = &self.columns {
                return Some(Ok(decode_row(columns, &row)));
            }
            self.columns = Some(build_columns(self.datatypes.as_ref(), &row));
        }
    }
}

// ---------------------------------------------------------------------------
// Row decoding
// ---------------------------------------------------------------------------

fn build_columns(datatypes: Option<&StringRecord>, header: &StringRecord) -> Columns {
    let mut columns = Columns {
        measurement: None,
        field: None,
        value: None,
        time: None,
        tags: Vec::new(),
        value_type: ValueType::Unknown,
    };
    for (idx, name) in header.iter().enumerate() {
        match name {
            "_measurement" => columns.measurement = Some(idx),
            "_field" => columns.field = Some(idx),
            "_value" => columns.value = Some(idx),
            "_time" => columns.time = Some(idx),
            name if is_tag_column(name) => columns.tags.push((idx, name.to_string())),
            _ => {}
        }
    }
    if let (Some(types), Some(value_idx)) = (datatypes, columns.value) {
        columns.value_type = match types.get(value_idx) {
            Some("double") => ValueType::Double,
            Some("long") => ValueType::Long,
            Some("unsignedLong") => ValueType::UnsignedLong,
            Some("boolean") => ValueType::Boolean,
            Some("string") => ValueType::Text,
            _ => ValueType::Unknown,
        };
    }
    columns
}

fn decode_row(columns: &Columns, row: &StringRecord) -> SourceRecord {
    let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).filter(|s| !s.is_empty());

    let mut tags = BTreeMap::new();
    for (idx, name) in &columns.tags {
        if let Some(value) = row.get(*idx)
            && !value.is_empty()
        {
            tags.insert(name.clone(), value.to_string());
        }
    }

    SourceRecord {
        measurement: cell(columns.measurement).map(str::to_string),
        field: cell(columns.field).map(str::to_string),
        value: cell(columns.value).map(|raw| parse_value(raw, columns.value_type)),
        time: cell(columns.time)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc)),
        tags,
    }
}

fn parse_value(raw: &str, value_type: ValueType) -> FieldValue {
    let text = || FieldValue::Text(raw.to_string());
    match value_type {
        ValueType::Double => raw.parse().map(FieldValue::Float).unwrap_or_else(|_| text()),
        ValueType::Long => raw.parse().map(FieldValue::Integer).unwrap_or_else(|_| text()),
        ValueType::UnsignedLong => raw
            .parse()
            .map(FieldValue::UInteger)
            .unwrap_or_else(|_| text()),
        ValueType::Boolean => match raw {
            "true" => FieldValue::Boolean(true),
            "false" => FieldValue::Boolean(false),
            _ => text(),
        },
        ValueType::Text => text(),
        // No annotation: guess the narrowest sensible type.
        ValueType::Unknown => {
            if let Ok(v) = raw.parse::<i64>() {
                FieldValue::Integer(v)
            } else if let Ok(v) = raw.parse::<f64>() {
                FieldValue::Float(v)
            } else if raw == "true" || raw == "false" {
                FieldValue::Boolean(raw == "true")
            } else {
                text()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
