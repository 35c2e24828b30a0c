use orion_error::prelude::*;
use regex::Regex;

use crate::error::{CopyReason, CopyResult};

// ---------------------------------------------------------------------------
// ValueMatcher — the three rewrite predicate kinds
// ---------------------------------------------------------------------------

/// One value-rewrite predicate. All rule kinds (tag maps, name maps, derived
/// injections) funnel through this single enum so the scanning loops stay
/// uniform.
#[derive(Debug, Clone)]
pub enum ValueMatcher {
    /// Byte-for-byte equality; replacement is the literal `to`.
    Exact { from: String, to: String },
    /// Compiled pattern; the replacement may reference capture groups (`$1`).
    Regex { pattern: Regex, replacement: String },
    /// Literal prefix captured at parse time; the replacement swaps the
    /// prefix and keeps the remainder of the value.
    Wildcard { prefix: String, to_prefix: String },
}

impl ValueMatcher {
    /// Apply to `value`, returning the rewritten value on an effective match.
    ///
    /// Exact rules match even when the replacement equals the input. Regex
    /// and wildcard rules report `None` when the rewrite leaves the value
    /// unchanged, so a later rule for the same key still gets a chance.
    pub fn rewrite(&self, value: &str) -> Option<String> {
        match self {
            Self::Exact { from, to } => (value == from.as_str()).then(|| to.clone()),
            Self::Regex {
                pattern,
                replacement,
            } => {
                if !pattern.is_match(value) {
                    return None;
                }
                let replaced = pattern.replace(value, replacement.as_str()).into_owned();
                (replaced != value).then_some(replaced)
            }
            Self::Wildcard { prefix, to_prefix } => {
                let rest = value.strip_prefix(prefix.as_str())?;
                let replaced = format!("{to_prefix}{rest}");
                (replaced != value).then_some(replaced)
            }
        }
    }

    /// Parse the pattern half of a rule spec: `~/re/` is a regex, a trailing
    /// `*` marks a wildcard prefix, anything else matches exactly.
    pub fn parse(pattern: &str, replacement: &str) -> CopyResult<Self> {
        if let Some(body) = pattern.strip_prefix("~/").and_then(|p| p.strip_suffix('/')) {
            let compiled = Regex::new(body).map_err(|e| {
                StructError::from(CopyReason::RuleParse)
                    .with_detail(format!("invalid regex {body:?}: {e}"))
            })?;
            return Ok(Self::Regex {
                pattern: compiled,
                replacement: replacement.to_string(),
            });
        }
        if let Some(prefix) = pattern.strip_suffix('*') {
            if prefix.contains('*') {
                return StructError::from(CopyReason::RuleParse)
                    .with_detail(format!("wildcard pattern {pattern:?} may only end with '*'"))
                    .err();
            }
            return Ok(Self::Wildcard {
                prefix: prefix.to_string(),
                to_prefix: replacement.to_string(),
            });
        }
        if pattern.contains('*') {
            return StructError::from(CopyReason::RuleParse)
                .with_detail(format!("wildcard pattern {pattern:?} may only end with '*'"))
                .err();
        }
        Ok(Self::Exact {
            from: pattern.to_string(),
            to: replacement.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
