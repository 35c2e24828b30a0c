use std::str::FromStr;

use orion_error::prelude::*;

use crate::error::{CopyError, CopyReason, CopyResult};

use super::matcher::ValueMatcher;

// ---------------------------------------------------------------------------
// NameRule — one measurement- or field-name rename
// ---------------------------------------------------------------------------

/// One rename rule, parsed from `FROM->TO`. `FROM` is a literal (exact) or
/// `~/re/` (regex); wildcards are a tag-rule feature and are rejected here.
#[derive(Debug, Clone)]
pub struct NameRule {
    matcher: ValueMatcher,
}

impl FromStr for NameRule {
    type Err = CopyError;

    fn from_str(s: &str) -> CopyResult<Self> {
        let (from, to) = s.split_once("->").ok_or_else(|| {
            StructError::from(CopyReason::RuleParse)
                .with_detail(format!("name rule {s:?} must look like FROM->TO"))
        })?;
        let from = from.trim();
        if from.is_empty() {
            return StructError::from(CopyReason::RuleParse)
                .with_detail(format!("name rule {s:?} has an empty FROM part"))
                .err();
        }
        let matcher = ValueMatcher::parse(from, to.trim())?;
        if matches!(matcher, ValueMatcher::Wildcard { .. }) {
            return StructError::from(CopyReason::RuleParse)
                .with_detail(format!("name rule {s:?}: wildcards are only valid in tag rules"))
                .err();
        }
        Ok(Self { matcher })
    }
}

// ---------------------------------------------------------------------------
// NameMapper
// ---------------------------------------------------------------------------

/// Ordered rename rules for one name dimension. Measurement names and field
/// names each get their own independently configured mapper.
#[derive(Debug, Clone, Default)]
pub struct NameMapper {
    rules: Vec<NameRule>,
}

impl NameMapper {
    pub fn new(rules: Vec<NameRule>) -> Self {
        Self { rules }
    }

    /// Parse a list of `FROM->TO` specs in declaration order.
    pub fn parse_all(specs: &[String]) -> CopyResult<Self> {
        specs
            .iter()
            .map(|s| s.parse())
            .collect::<CopyResult<Vec<_>>>()
            .map(Self::new)
    }

    /// First rule with an effective rewrite wins; otherwise the name passes
    /// through unchanged.
    pub fn apply(&self, name: &str) -> String {
        for rule in &self.rules {
            if let Some(mapped) = rule.matcher.rewrite(name) {
                return mapped;
            }
        }
        name.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper(specs: &[&str]) -> NameMapper {
        let specs: Vec<String> = specs.iter().map(|s| s.to_string()).collect();
        NameMapper::parse_all(&specs).unwrap()
    }

    #[test]
    fn exact_rename() {
        let m = mapper(&["heaters->control"]);
        assert_eq!(m.apply("heaters"), "control");
    }

    #[test]
    fn exact_rename_is_full_match_only() {
        let m = mapper(&["heaters->control"]);
        assert_eq!(m.apply("heaters_2"), "heaters_2");
    }

    #[test]
    fn regex_rename() {
        let m = mapper(&["~/^(\\w+)_old$/->$1"]);
        assert_eq!(m.apply("pressure_old"), "pressure");
        assert_eq!(m.apply("pressure"), "pressure");
    }

    #[test]
    fn first_match_wins() {
        let m = mapper(&["heaters->control", "heaters->other"]);
        assert_eq!(m.apply("heaters"), "control");
    }

    #[test]
    fn regex_fallback_chain() {
        // A regex that matches but rewrites to itself defers to a later rule.
        let m = mapper(&["~/^heaters$/->heaters", "heaters->control"]);
        assert_eq!(m.apply("heaters"), "control");
    }

    #[test]
    fn empty_mapper_passes_through() {
        let m = NameMapper::default();
        assert_eq!(m.apply("anything"), "anything");
    }

    #[test]
    fn reject_wildcard_rule() {
        assert!("heaters*->control".parse::<NameRule>().is_err());
    }

    #[test]
    fn reject_missing_arrow() {
        assert!("heaters=control".parse::<NameRule>().is_err());
    }

    #[test]
    fn reject_empty_from() {
        assert!("->control".parse::<NameRule>().is_err());
    }
}
