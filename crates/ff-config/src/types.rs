use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// HumanDuration
// ---------------------------------------------------------------------------

/// A duration parsed from a human-readable string like `"30s"`, `"5m"`,
/// `"6h"`, `"1d"`, `"2w"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(Duration);

impl HumanDuration {
    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl From<HumanDuration> for Duration {
    fn from(hd: HumanDuration) -> Self {
        hd.0
    }
}

impl From<Duration> for HumanDuration {
    fn from(d: Duration) -> Self {
        Self(d)
    }
}

impl FromStr for HumanDuration {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            anyhow::bail!("empty duration string");
        }

        let (num_part, suffix) = split_number_suffix(s)?;
        let value: u64 = num_part
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid number in duration: {s:?}"))?;

        let mult = match suffix {
            "s" => 1,
            "m" => 60,
            "h" => 3600,
            "d" => 86400,
            "w" => 604_800,
            _ => {
                anyhow::bail!(
                    "unsupported duration suffix {suffix:?} in {s:?} (expected s/m/h/d/w)"
                )
            }
        };
        let secs = value
            .checked_mul(mult)
            .ok_or_else(|| anyhow::anyhow!("duration out of range: {s:?}"))?;

        Ok(Self(Duration::from_secs(secs)))
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        if secs == 0 {
            return write!(f, "0s");
        }
        if secs.is_multiple_of(604_800) {
            write!(f, "{}w", secs / 604_800)
        } else if secs.is_multiple_of(86400) {
            write!(f, "{}d", secs / 86400)
        } else if secs.is_multiple_of(3600) {
            write!(f, "{}h", secs / 3600)
        } else if secs.is_multiple_of(60) {
            write!(f, "{}m", secs / 60)
        } else {
            write!(f, "{secs}s")
        }
    }
}

impl Serialize for HumanDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// TimeSpec
// ---------------------------------------------------------------------------

/// A point in time as written on the command line: absolute RFC3339 (or
/// ISO8601 without an offset, read as UTC), a negative relative duration like
/// `"-4d"`, or `"now()"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSpec {
    Absolute(DateTime<Utc>),
    /// Offset subtracted from "now" at resolution time.
    Relative(TimeDelta),
    Now,
}

impl TimeSpec {
    /// Resolve to an absolute UTC instant against the given `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Absolute(dt) => *dt,
            Self::Relative(delta) => now - *delta,
            Self::Now => now,
        }
    }
}

impl FromStr for TimeSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            anyhow::bail!("empty time string");
        }
        if s == "now()" {
            return Ok(Self::Now);
        }
        if let Some(rest) = s.strip_prefix('-') {
            let dur: HumanDuration = rest
                .parse()
                .map_err(|e| anyhow::anyhow!("relative time {s:?}: {e}"))?;
            let delta = TimeDelta::from_std(dur.as_duration())
                .map_err(|_| anyhow::anyhow!("relative time out of range: {s:?}"))?;
            return Ok(Self::Relative(delta));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::Absolute(dt.with_timezone(&Utc)));
        }
        // ISO8601 without an offset is read as UTC.
        if let Ok(naive) = s.parse::<NaiveDateTime>() {
            return Ok(Self::Absolute(naive.and_utc()));
        }
        anyhow::bail!("unrecognized time format: {s:?}")
    }
}

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

/// Split a string like `"30s"` into `("30", "s")`.
/// Returns an error if the string is all-digits or all-letters.
fn split_number_suffix(s: &str) -> anyhow::Result<(&str, &str)> {
    let idx = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| anyhow::anyhow!("missing suffix in {s:?}"))?;
    if idx == 0 {
        anyhow::bail!("missing numeric part in {s:?}");
    }
    Ok((&s[..idx], &s[idx..]))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- HumanDuration --

    #[test]
    fn duration_seconds() {
        let d: HumanDuration = "30s".parse().unwrap();
        assert_eq!(d.as_duration(), Duration::from_secs(30));
        assert_eq!(d.to_string(), "30s");
    }

    #[test]
    fn duration_minutes() {
        let d: HumanDuration = "5m".parse().unwrap();
        assert_eq!(d.as_duration(), Duration::from_secs(300));
        assert_eq!(d.to_string(), "5m");
    }

    #[test]
    fn duration_hours() {
        let d: HumanDuration = "6h".parse().unwrap();
        assert_eq!(d.as_duration(), Duration::from_secs(6 * 3600));
        assert_eq!(d.to_string(), "6h");
    }

    #[test]
    fn duration_days() {
        let d: HumanDuration = "2d".parse().unwrap();
        assert_eq!(d.as_duration(), Duration::from_secs(2 * 86400));
        assert_eq!(d.to_string(), "2d");
    }

    #[test]
    fn duration_weeks() {
        let d: HumanDuration = "2w".parse().unwrap();
        assert_eq!(d.as_duration(), Duration::from_secs(2 * 604_800));
        assert_eq!(d.to_string(), "2w");
    }

    #[test]
    fn duration_error_empty() {
        assert!("".parse::<HumanDuration>().is_err());
    }

    #[test]
    fn duration_error_no_suffix() {
        assert!("30".parse::<HumanDuration>().is_err());
    }

    #[test]
    fn duration_error_invalid_suffix() {
        assert!("30x".parse::<HumanDuration>().is_err());
    }

    #[test]
    fn duration_error_no_number() {
        assert!("s".parse::<HumanDuration>().is_err());
    }

    #[test]
    fn serde_roundtrip_duration() {
        let d: HumanDuration = "6h".parse().unwrap();
        let toml = toml::to_string(&std::collections::HashMap::from([("window", d)])).unwrap();
        assert!(toml.contains("6h"));
    }

    // -- TimeSpec --

    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn time_rfc3339() {
        let t: TimeSpec = "2025-01-01T00:00:00Z".parse().unwrap();
        assert_eq!(
            t.resolve(fixed_now()).to_rfc3339(),
            "2025-01-01T00:00:00+00:00",
        );
    }

    #[test]
    fn time_with_offset() {
        let t: TimeSpec = "2025-01-01T02:00:00+02:00".parse().unwrap();
        assert_eq!(
            t.resolve(fixed_now()).to_rfc3339(),
            "2025-01-01T00:00:00+00:00",
        );
    }

    #[test]
    fn time_naive_read_as_utc() {
        let t: TimeSpec = "2025-01-01T00:00:00".parse().unwrap();
        assert_eq!(
            t.resolve(fixed_now()).to_rfc3339(),
            "2025-01-01T00:00:00+00:00",
        );
    }

    #[test]
    fn time_relative_days() {
        let t: TimeSpec = "-4d".parse().unwrap();
        assert_eq!(
            t.resolve(fixed_now()).to_rfc3339(),
            "2025-05-28T12:00:00+00:00",
        );
    }

    #[test]
    fn time_now() {
        let t: TimeSpec = "now()".parse().unwrap();
        assert_eq!(t.resolve(fixed_now()), fixed_now());
    }

    #[test]
    fn time_error_garbage() {
        assert!("yesterday".parse::<TimeSpec>().is_err());
    }

    #[test]
    fn time_error_bad_relative() {
        assert!("-4x".parse::<TimeSpec>().is_err());
    }
}
