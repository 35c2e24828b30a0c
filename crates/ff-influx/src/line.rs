use ff_core::{FieldValue, OutputPoint};

/// Encode a batch as line protocol, one line per point, nanosecond precision.
pub fn encode_batch(points: &[OutputPoint]) -> String {
    let mut out = String::new();
    for point in points {
        encode_point(&mut out, point);
        out.push('\n');
    }
    out
}

fn encode_point(out: &mut String, point: &OutputPoint) {
    push_escaped(out, &point.measurement, &[',', ' ']);
    for (key, value) in &point.tags {
        out.push(',');
        push_escaped(out, key, &[',', '=', ' ']);
        out.push('=');
        push_escaped(out, value, &[',', '=', ' ']);
    }
    out.push(' ');
    push_escaped(out, &point.field, &[',', '=', ' ']);
    out.push('=');
    match &point.value {
        FieldValue::Float(v) => out.push_str(&v.to_string()),
        FieldValue::Integer(v) => {
            out.push_str(&v.to_string());
            out.push('i');
        }
        FieldValue::UInteger(v) => {
            out.push_str(&v.to_string());
            out.push('u');
        }
        FieldValue::Boolean(v) => out.push_str(if *v { "true" } else { "false" }),
        FieldValue::Text(s) => {
            out.push('"');
            for c in s.chars() {
                if c == '"' || c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push('"');
        }
    }
    out.push(' ');
    // Timestamps from the source are nanosecond-representable; dates outside
    // that range saturate to the microsecond-scaled bound.
    let nanos = point
        .time
        .timestamp_nanos_opt()
        .unwrap_or_else(|| point.time.timestamp_micros().saturating_mul(1000));
    out.push_str(&nanos.to_string());
}

fn push_escaped(out: &mut String, s: &str, specials: &[char]) {
    for c in s.chars() {
        if specials.contains(&c) || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{DateTime, Utc};

    use super::*;

    fn point(value: FieldValue) -> OutputPoint {
        OutputPoint {
            measurement: "control".into(),
            field: "temp".into(),
            value,
            time: DateTime::parse_from_rfc3339("2025-01-01T01:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            tags: BTreeMap::from([
                ("device".to_string(), "X".to_string()),
                ("id".to_string(), "control_LHT_1".to_string()),
            ]),
        }
    }

    const TS: &str = "1735693200000000000";

    #[test]
    fn float_point() {
        let line = encode_batch(&[point(FieldValue::Float(21.5))]);
        assert_eq!(
            line,
            format!("control,device=X,id=control_LHT_1 temp=21.5 {TS}\n"),
        );
    }

    #[test]
    fn integer_gets_i_suffix() {
        let line = encode_batch(&[point(FieldValue::Integer(-3))]);
        assert!(line.contains("temp=-3i "));
    }

    #[test]
    fn uinteger_gets_u_suffix() {
        let line = encode_batch(&[point(FieldValue::UInteger(7))]);
        assert!(line.contains("temp=7u "));
    }

    #[test]
    fn boolean_is_bare() {
        let line = encode_batch(&[point(FieldValue::Boolean(true))]);
        assert!(line.contains("temp=true "));
    }

    #[test]
    fn string_is_quoted_and_escaped() {
        let line = encode_batch(&[point(FieldValue::Text("say \"hi\"\\now".into()))]);
        assert!(line.contains(r#"temp="say \"hi\"\\now" "#));
    }

    #[test]
    fn tag_specials_are_escaped() {
        let mut p = point(FieldValue::Float(1.0));
        p.tags
            .insert("panel name".to_string(), "a=b, c".to_string());
        let line = encode_batch(&[p]);
        assert!(line.contains(r"panel\ name=a\=b\,\ c"));
    }

    #[test]
    fn measurement_specials_are_escaped() {
        let mut p = point(FieldValue::Float(1.0));
        p.measurement = "oven temps".to_string();
        let line = encode_batch(&[p]);
        assert!(line.starts_with(r"oven\ temps,"));
    }

    #[test]
    fn one_line_per_point() {
        let batch = encode_batch(&[point(FieldValue::Float(1.0)), point(FieldValue::Float(2.0))]);
        assert_eq!(batch.lines().count(), 2);
    }
}
