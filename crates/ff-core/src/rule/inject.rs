use std::collections::BTreeMap;
use std::str::FromStr;

use orion_error::prelude::*;

use crate::error::{CopyError, CopyReason, CopyResult};

use super::matcher::ValueMatcher;

// ---------------------------------------------------------------------------
// InjectRule — one tag addition
// ---------------------------------------------------------------------------

/// A tag-injection rule: either a constant, or a value derived from an
/// existing tag.
///
/// Specs: `new_key=VALUE` (static) or
/// `new_key=source_key:PATTERN->REPLACEMENT` (derived).
#[derive(Debug, Clone)]
pub enum InjectRule {
    Static {
        key: String,
        value: String,
    },
    Derived {
        key: String,
        source_key: String,
        matcher: ValueMatcher,
    },
}

impl FromStr for InjectRule {
    type Err = CopyError;

    fn from_str(s: &str) -> CopyResult<Self> {
        let (key, rest) = s.split_once('=').ok_or_else(|| {
            StructError::from(CopyReason::RuleParse)
                .with_detail(format!("inject rule {s:?} must look like key=VALUE"))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return StructError::from(CopyReason::RuleParse)
                .with_detail(format!("inject rule {s:?} has an empty key"))
                .err();
        }

        let Some((source_and_pattern, replacement)) = rest.split_once("->") else {
            return Ok(Self::Static {
                key: key.to_string(),
                value: rest.to_string(),
            });
        };

        let (source_key, pattern) = source_and_pattern.split_once(':').ok_or_else(|| {
            StructError::from(CopyReason::RuleParse).with_detail(format!(
                "derived inject rule {s:?} must look like new_key=source_key:PATTERN->REPLACEMENT"
            ))
        })?;
        let source_key = source_key.trim();
        let pattern = pattern.trim();
        if source_key.is_empty() || pattern.is_empty() {
            return StructError::from(CopyReason::RuleParse)
                .with_detail(format!("derived inject rule {s:?} has an empty source key or pattern"))
                .err();
        }
        Ok(Self::Derived {
            key: key.to_string(),
            source_key: source_key.to_string(),
            matcher: ValueMatcher::parse(pattern, replacement.trim())?,
        })
    }
}

// ---------------------------------------------------------------------------
// TagInjector
// ---------------------------------------------------------------------------

/// Ordered injection rules, evaluated against a record's original tag set.
#[derive(Debug, Clone, Default)]
pub struct TagInjector {
    rules: Vec<InjectRule>,
}

impl TagInjector {
    pub fn new(rules: Vec<InjectRule>) -> Self {
        Self { rules }
    }

    /// Parse a list of inject specs in declaration order.
    pub fn parse_all(specs: &[String]) -> CopyResult<Self> {
        specs
            .iter()
            .map(|s| s.parse())
            .collect::<CopyResult<Vec<_>>>()
            .map(Self::new)
    }

    /// Additions in rule order. A static rule always fires; a derived rule is
    /// skipped without error when its source tag is absent. Rules fire
    /// independently; when several target the same key, the caller's in-order
    /// merge makes the later successful rule win.
    pub fn additions(&self, tags: &BTreeMap<String, String>) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for rule in &self.rules {
            match rule {
                InjectRule::Static { key, value } => out.push((key.clone(), value.clone())),
                InjectRule::Derived {
                    key,
                    source_key,
                    matcher,
                } => {
                    let Some(source) = tags.get(source_key) else {
                        continue;
                    };
                    if let Some(derived) = matcher.rewrite(source) {
                        out.push((key.clone(), derived));
                    }
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn injector(specs: &[&str]) -> TagInjector {
        let specs: Vec<String> = specs.iter().map(|s| s.to_string()).collect();
        TagInjector::parse_all(&specs).unwrap()
    }

    fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn static_rule_always_fires() {
        let inj = injector(&["env=production"]);
        assert_eq!(
            inj.additions(&BTreeMap::new()),
            vec![("env".to_string(), "production".to_string())],
        );
    }

    #[test]
    fn static_value_may_contain_spaces_and_equals() {
        let inj = injector(&["panel_name=Plunge Caster Heater Control"]);
        assert_eq!(
            inj.additions(&BTreeMap::new()),
            vec![(
                "panel_name".to_string(),
                "Plunge Caster Heater Control".to_string()
            )],
        );
    }

    #[test]
    fn derived_wildcard() {
        let inj = injector(&["zone=rack:prod-*->west-"]);
        assert_eq!(
            inj.additions(&tags(&[("rack", "prod-12")])),
            vec![("zone".to_string(), "west-12".to_string())],
        );
    }

    #[test]
    fn derived_source_absent_is_skipped() {
        let inj = injector(&["zone=rack:prod-*->west-"]);
        assert!(inj.additions(&tags(&[("id", "x")])).is_empty());
    }

    #[test]
    fn derived_exact_and_regex() {
        let inj = injector(&[
            "cabinet=device:CX-68ABF8->cab-1",
            "ring=host:~/^prod-(\\d+)$/->r$1",
        ]);
        let additions = inj.additions(&tags(&[("device", "CX-68ABF8"), ("host", "prod-3")]));
        assert_eq!(
            additions,
            vec![
                ("cabinet".to_string(), "cab-1".to_string()),
                ("ring".to_string(), "r3".to_string()),
            ],
        );
    }

    #[test]
    fn later_rule_for_same_key_comes_after() {
        // The caller merges in order, so the later addition wins downstream.
        let inj = injector(&["env=staging", "env=production"]);
        let additions = inj.additions(&BTreeMap::new());
        assert_eq!(additions.len(), 2);
        assert_eq!(additions[1], ("env".to_string(), "production".to_string()));
    }

    #[test]
    fn multiple_rules_fire_independently() {
        let inj = injector(&["env=production", "group=plungecaster"]);
        assert_eq!(inj.additions(&BTreeMap::new()).len(), 2);
    }

    #[test]
    fn reject_missing_equals() {
        assert!("envproduction".parse::<InjectRule>().is_err());
    }

    #[test]
    fn reject_derived_without_source_key() {
        assert!("zone=prod-*->west-".parse::<InjectRule>().is_err());
    }
}
