use std::str::FromStr;

use orion_error::prelude::*;

use crate::error::{CopyError, CopyReason, CopyResult};

use super::matcher::ValueMatcher;

// ---------------------------------------------------------------------------
// TagRule — one tag-value rewrite
// ---------------------------------------------------------------------------

/// One tag-value rewrite rule, parsed from `key=PATTERN->REPLACEMENT`.
/// Only a tag's value is rewritten; tag keys are never renamed.
#[derive(Debug, Clone)]
pub struct TagRule {
    pub key: String,
    matcher: ValueMatcher,
}

impl FromStr for TagRule {
    type Err = CopyError;

    fn from_str(s: &str) -> CopyResult<Self> {
        let (key, rest) = s.split_once('=').ok_or_else(|| {
            StructError::from(CopyReason::RuleParse)
                .with_detail(format!("tag rule {s:?} must look like key=PATTERN->REPLACEMENT"))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return StructError::from(CopyReason::RuleParse)
                .with_detail(format!("tag rule {s:?} has an empty key"))
                .err();
        }
        let (pattern, replacement) = rest.split_once("->").ok_or_else(|| {
            StructError::from(CopyReason::RuleParse)
                .with_detail(format!("tag rule {s:?} must look like key=PATTERN->REPLACEMENT"))
        })?;
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return StructError::from(CopyReason::RuleParse)
                .with_detail(format!("tag rule {s:?} has an empty pattern"))
                .err();
        }
        Ok(Self {
            key: key.to_string(),
            matcher: ValueMatcher::parse(pattern, replacement.trim())?,
        })
    }
}

// ---------------------------------------------------------------------------
// TagValueMapper
// ---------------------------------------------------------------------------

/// Ordered tag-value rewrite rules, scoped by tag key.
///
/// Scanning considers only rules whose key matches; the first effective
/// rewrite wins. A regex or wildcard rule that matches but changes nothing
/// does not block a later rule for the same key, which lets an operator stack
/// rules as a fallback chain.
#[derive(Debug, Clone, Default)]
pub struct TagValueMapper {
    rules: Vec<TagRule>,
}

impl TagValueMapper {
    pub fn new(rules: Vec<TagRule>) -> Self {
        Self { rules }
    }

    /// Parse a list of `key=PATTERN->REPLACEMENT` specs in declaration order.
    pub fn parse_all(specs: &[String]) -> CopyResult<Self> {
        specs
            .iter()
            .map(|s| s.parse())
            .collect::<CopyResult<Vec<_>>>()
            .map(Self::new)
    }

    pub fn apply(&self, key: &str, value: &str) -> String {
        for rule in self.rules.iter().filter(|r| r.key == key) {
            if let Some(mapped) = rule.matcher.rewrite(value) {
                return mapped;
            }
        }
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper(specs: &[&str]) -> TagValueMapper {
        let specs: Vec<String> = specs.iter().map(|s| s.to_string()).collect();
        TagValueMapper::parse_all(&specs).unwrap()
    }

    #[test]
    fn exact_rewrite() {
        let m = mapper(&["key=A->B"]);
        assert_eq!(m.apply("key", "A"), "B");
        assert_eq!(m.apply("key", "C"), "C");
    }

    #[test]
    fn rules_are_scoped_by_key() {
        let m = mapper(&["id=A->B"]);
        assert_eq!(m.apply("device", "A"), "A");
    }

    #[test]
    fn wildcard_rewrite() {
        let m = mapper(&["id=heaters*->control"]);
        assert_eq!(m.apply("id", "heaters_LHT_1"), "control_LHT_1");
        assert_eq!(m.apply("id", "sensors_X"), "sensors_X");
    }

    #[test]
    fn regex_rewrite_with_capture() {
        let m = mapper(&["host=~/^prod-(\\d+)$/->stage-$1"]);
        assert_eq!(m.apply("host", "prod-7"), "stage-7");
    }

    #[test]
    fn exact_returns_even_when_unchanged() {
        // An exact rule short-circuits on match even if nothing changes.
        let m = mapper(&["id=A->A", "id=A->B"]);
        assert_eq!(m.apply("id", "A"), "A");
    }

    #[test]
    fn regex_fallback_chain() {
        let m = mapper(&["id=~/^x-/->x-", "id=~/^x-(\\d+)$/->y-$1"]);
        assert_eq!(m.apply("id", "x-42"), "y-42");
    }

    #[test]
    fn no_rule_leaves_value_alone() {
        let m = TagValueMapper::default();
        assert_eq!(m.apply("id", "whatever"), "whatever");
    }

    #[test]
    fn reject_missing_equals() {
        assert!("idheaters*->control".parse::<TagRule>().is_err());
    }

    #[test]
    fn reject_missing_arrow() {
        assert!("id=heaters*".parse::<TagRule>().is_err());
    }

    #[test]
    fn reject_empty_key() {
        assert!("=heaters*->control".parse::<TagRule>().is_err());
    }
}
