use std::str::FromStr;

use orion_error::prelude::*;
use regex::Regex;

use crate::error::{CopyError, CopyReason, CopyResult};
use crate::window::TimeWindow;

// ---------------------------------------------------------------------------
// MeasurementSelector
// ---------------------------------------------------------------------------

/// Which measurements a window query selects. An explicit name list and a
/// regex are mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MeasurementSelector {
    /// No measurement filter.
    #[default]
    All,
    /// Explicit names, matched exactly.
    Names(Vec<String>),
    /// A single regex applied to the measurement name.
    Regex(String),
}

impl MeasurementSelector {
    /// Validate and wrap a measurement regex. The body is checked for syntax
    /// here so a bad pattern fails before the first query, and `/` is
    /// rejected because the body lands between `/` delimiters downstream.
    pub fn from_regex(body: &str) -> CopyResult<Self> {
        validate_filter_regex(body)?;
        Ok(Self::Regex(body.to_string()))
    }
}

// ---------------------------------------------------------------------------
// TagFilter
// ---------------------------------------------------------------------------

/// One source-side tag filter, parsed from `key=value` or `key=~/regex/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    pub key: String,
    pub predicate: TagPredicate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagPredicate {
    Exact(String),
    Regex(String),
}

impl FromStr for TagFilter {
    type Err = CopyError;

    fn from_str(s: &str) -> CopyResult<Self> {
        if let Some((key, rest)) = s.split_once("=~/") {
            let key = non_empty_key(key, s)?;
            let body = rest.strip_suffix('/').ok_or_else(|| {
                StructError::from(CopyReason::RunConfig)
                    .with_detail(format!("tag filter {s:?}: regex must end with '/'"))
            })?;
            validate_filter_regex(body)?;
            return Ok(Self {
                key,
                predicate: TagPredicate::Regex(body.to_string()),
            });
        }
        if let Some((key, value)) = s.split_once('=') {
            return Ok(Self {
                key: non_empty_key(key, s)?,
                predicate: TagPredicate::Exact(value.to_string()),
            });
        }
        StructError::from(CopyReason::RunConfig)
            .with_detail(format!(
                "tag filter {s:?} must look like key=value or key=~/regex/"
            ))
            .err()
    }
}

fn non_empty_key(key: &str, spec: &str) -> CopyResult<String> {
    let key = key.trim();
    if key.is_empty() {
        return StructError::from(CopyReason::RunConfig)
            .with_detail(format!("tag filter {spec:?} has an empty key"))
            .err();
    }
    Ok(key.to_string())
}

/// A filter regex is compiled to catch syntax errors early and must not
/// contain `/`, which would break out of the delimited literal it is
/// embedded in.
fn validate_filter_regex(body: &str) -> CopyResult<()> {
    if body.contains('/') {
        return StructError::from(CopyReason::RunConfig)
            .with_detail(format!("filter regex {body:?} must not contain '/'"))
            .err();
    }
    Regex::new(body).map_err(|e| {
        StructError::from(CopyReason::RunConfig).with_detail(format!("invalid regex {body:?}: {e}"))
    })?;
    Ok(())
}

// ---------------------------------------------------------------------------
// QueryTemplate / QuerySpec
// ---------------------------------------------------------------------------

/// Everything about the source query that does not change between windows.
#[derive(Debug, Clone)]
pub struct QueryTemplate {
    pub bucket: String,
    pub measurements: MeasurementSelector,
    pub tag_filters: Vec<TagFilter>,
    /// Explicit field names; empty selects all fields.
    pub fields: Vec<String>,
}

impl QueryTemplate {
    /// The filter specification for one window. Built fresh per window and
    /// never mutated after construction.
    pub fn for_window(&self, window: TimeWindow) -> QuerySpec {
        QuerySpec {
            bucket: self.bucket.clone(),
            window,
            measurements: self.measurements.clone(),
            tag_filters: self.tag_filters.clone(),
            fields: self.fields.clone(),
        }
    }
}

/// The opaque filter specification handed to the source query capability.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub bucket: String,
    pub window: TimeWindow,
    pub measurements: MeasurementSelector,
    pub tag_filters: Vec<TagFilter>,
    pub fields: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
