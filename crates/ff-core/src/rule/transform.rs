use std::collections::BTreeMap;

use crate::record::{OutputPoint, SourceRecord};

use super::inject::TagInjector;
use super::name_map::NameMapper;
use super::tag_map::TagValueMapper;

// ---------------------------------------------------------------------------
// PointTransformer
// ---------------------------------------------------------------------------

/// Per-record transformation, applied in a fixed order: rename the
/// measurement, rewrite every tag value, inject tags, rename the field.
/// The value and timestamp pass through untouched.
///
/// Rule lists are parsed once at startup and never change during a run.
#[derive(Debug, Clone, Default)]
pub struct PointTransformer {
    measurements: NameMapper,
    fields: NameMapper,
    tag_values: TagValueMapper,
    injector: TagInjector,
}

impl PointTransformer {
    pub fn new(
        measurements: NameMapper,
        fields: NameMapper,
        tag_values: TagValueMapper,
        injector: TagInjector,
    ) -> Self {
        Self {
            measurements,
            fields,
            tag_values,
            injector,
        }
    }

    /// Returns `None` for records missing their measurement, field, value, or
    /// timestamp; the caller skips those rather than failing the run.
    pub fn transform(&self, record: SourceRecord) -> Option<OutputPoint> {
        let measurement = record.measurement.as_deref()?;
        let field = record.field.as_deref()?;
        let time = record.time?;

        let measurement = self.measurements.apply(measurement);

        // Tag keys are never renamed, only their values.
        let mut tags: BTreeMap<String, String> = record
            .tags
            .iter()
            .map(|(key, value)| (key.clone(), self.tag_values.apply(key, value)))
            .collect();

        // Injections read the original tag values, not the rewritten ones,
        // and override existing tags on key collision.
        for (key, value) in self.injector.additions(&record.tags) {
            tags.insert(key, value);
        }

        let field = self.fields.apply(field);

        Some(OutputPoint {
            measurement,
            field,
            value: record.value?,
            time,
            tags,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use crate::record::FieldValue;
    use crate::rule::{NameMapper, TagInjector, TagValueMapper};

    use super::*;

    fn parse_time(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn strings(specs: &[&str]) -> Vec<String> {
        specs.iter().map(|s| s.to_string()).collect()
    }

    fn sample_record() -> SourceRecord {
        SourceRecord {
            measurement: Some("heaters".into()),
            field: Some("temp".into()),
            value: Some(FieldValue::Float(21.5)),
            time: Some(parse_time("2025-01-01T01:00:00Z")),
            tags: BTreeMap::from([
                ("id".to_string(), "heaters_LHT_1".to_string()),
                ("device".to_string(), "X".to_string()),
            ]),
        }
    }

    #[test]
    fn full_transformation() {
        let transformer = PointTransformer::new(
            NameMapper::parse_all(&strings(&["heaters->control"])).unwrap(),
            NameMapper::default(),
            TagValueMapper::parse_all(&strings(&["id=heaters*->control"])).unwrap(),
            TagInjector::parse_all(&strings(&["env=production"])).unwrap(),
        );
        let point = transformer.transform(sample_record()).unwrap();
        assert_eq!(point.measurement, "control");
        assert_eq!(point.field, "temp");
        assert_eq!(point.value, FieldValue::Float(21.5));
        assert_eq!(point.time, parse_time("2025-01-01T01:00:00Z"));
        assert_eq!(
            point.tags,
            BTreeMap::from([
                ("id".to_string(), "control_LHT_1".to_string()),
                ("device".to_string(), "X".to_string()),
                ("env".to_string(), "production".to_string()),
            ]),
        );
    }

    #[test]
    fn empty_rules_pass_record_through() {
        let transformer = PointTransformer::default();
        let point = transformer.transform(sample_record()).unwrap();
        assert_eq!(point.measurement, "heaters");
        assert_eq!(point.tags.len(), 2);
    }

    #[test]
    fn missing_measurement_rejected() {
        let transformer = PointTransformer::default();
        let mut record = sample_record();
        record.measurement = None;
        assert!(transformer.transform(record).is_none());
    }

    #[test]
    fn missing_field_rejected() {
        let transformer = PointTransformer::default();
        let mut record = sample_record();
        record.field = None;
        assert!(transformer.transform(record).is_none());
    }

    #[test]
    fn missing_time_rejected() {
        let transformer = PointTransformer::default();
        let mut record = sample_record();
        record.time = None;
        assert!(transformer.transform(record).is_none());
    }

    #[test]
    fn missing_value_rejected() {
        let transformer = PointTransformer::default();
        let mut record = sample_record();
        record.value = None;
        assert!(transformer.transform(record).is_none());
    }

    #[test]
    fn derived_injection_reads_pre_rewrite_tags() {
        // The id tag is rewritten to control_*, but the derived injection
        // still sees the original heaters_* value.
        let transformer = PointTransformer::new(
            NameMapper::default(),
            NameMapper::default(),
            TagValueMapper::parse_all(&strings(&["id=heaters*->control"])).unwrap(),
            TagInjector::parse_all(&strings(&["origin=id:heaters*->was-heaters"])).unwrap(),
        );
        let point = transformer.transform(sample_record()).unwrap();
        assert_eq!(point.tags["id"], "control_LHT_1");
        assert_eq!(point.tags["origin"], "was-heaters_LHT_1");
    }

    #[test]
    fn injected_key_overrides_existing_tag() {
        let transformer = PointTransformer::new(
            NameMapper::default(),
            NameMapper::default(),
            TagValueMapper::default(),
            TagInjector::parse_all(&strings(&["device=CX-68ABF8"])).unwrap(),
        );
        let point = transformer.transform(sample_record()).unwrap();
        assert_eq!(point.tags["device"], "CX-68ABF8");
    }

    #[test]
    fn field_rename() {
        let transformer = PointTransformer::new(
            NameMapper::default(),
            NameMapper::parse_all(&strings(&["temp->temperature"])).unwrap(),
            TagValueMapper::default(),
            TagInjector::default(),
        );
        let point = transformer.transform(sample_record()).unwrap();
        assert_eq!(point.field, "temperature");
    }
}
