use chrono::{DateTime, SecondsFormat, Utc};

use ff_core::{MeasurementSelector, QuerySpec, TagPredicate};

/// Render the Flux script for one window's query spec.
pub fn render(spec: &QuerySpec) -> String {
    let mut lines = vec![
        format!("from(bucket: \"{}\")", escape(&spec.bucket)),
        format!(
            "  |> range(start: {}, stop: {})",
            rfc3339(spec.window.start),
            rfc3339(spec.window.end),
        ),
    ];

    match &spec.measurements {
        MeasurementSelector::All => {}
        MeasurementSelector::Names(names) if !names.is_empty() => {
            let ors = names
                .iter()
                .map(|name| format!("r._measurement == \"{}\"", escape(name)))
                .collect::<Vec<_>>()
                .join(" or ");
            lines.push(format!("  |> filter(fn: (r) => {ors})"));
        }
        MeasurementSelector::Names(_) => {}
        MeasurementSelector::Regex(body) => {
            lines.push(format!("  |> filter(fn: (r) => r._measurement =~ /{body}/)"));
        }
    }

    for filter in &spec.tag_filters {
        let key = &filter.key;
        match &filter.predicate {
            TagPredicate::Exact(value) => lines.push(format!(
                "  |> filter(fn: (r) => exists r.{key} and r.{key} == \"{}\")",
                escape(value),
            )),
            TagPredicate::Regex(body) => lines.push(format!(
                "  |> filter(fn: (r) => exists r.{key} and r.{key} =~ /{body}/)",
            )),
        }
    }

    if spec.fields.is_empty() {
        // Wildcard all fields if none provided.
        lines.push("  |> filter(fn: (r) => r._field =~ /.*/)".to_string());
    } else {
        let ors = spec
            .fields
            .iter()
            .map(|field| format!("r._field == \"{}\"", escape(field)))
            .collect::<Vec<_>>()
            .join(" or ");
        lines.push(format!("  |> filter(fn: (r) => {ors})"));
    }

    lines.join("\n")
}

fn rfc3339(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Escape a string for a double-quoted Flux literal.
fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
