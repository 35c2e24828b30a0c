use chrono::{DateTime, TimeDelta, Utc};
use orion_error::prelude::*;

use crate::error::{CopyReason, CopyResult};

// ---------------------------------------------------------------------------
// TimeWindow
// ---------------------------------------------------------------------------

/// A half-open slice `[start, end)` of the copy range, contiguous with its
/// neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// WindowPlan
// ---------------------------------------------------------------------------

/// Lazy sequence of consecutive windows covering `[start, stop)`. Every
/// window spans `step`, except the last, which is clamped to `stop`.
///
/// Cheap to clone and re-create; consumers may stop pulling early.
#[derive(Debug, Clone)]
pub struct WindowPlan {
    cursor: DateTime<Utc>,
    stop: DateTime<Utc>,
    step: TimeDelta,
}

impl WindowPlan {
    pub fn new(
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        step: std::time::Duration,
    ) -> CopyResult<Self> {
        if start >= stop {
            return StructError::from(CopyReason::WindowPlan)
                .with_detail(format!("start {start} must lie before stop {stop}"))
                .err();
        }
        let step = TimeDelta::from_std(step).map_err(|_| {
            StructError::from(CopyReason::WindowPlan)
                .with_detail("window duration out of range".to_string())
        })?;
        if step <= TimeDelta::zero() {
            return StructError::from(CopyReason::WindowPlan)
                .with_detail("window duration must be positive".to_string())
                .err();
        }
        Ok(Self {
            cursor: start,
            stop,
            step,
        })
    }
}

impl Iterator for WindowPlan {
    type Item = TimeWindow;

    fn next(&mut self) -> Option<TimeWindow> {
        if self.cursor >= self.stop {
            return None;
        }
        let end = (self.cursor + self.step).min(self.stop);
        let window = TimeWindow {
            start: self.cursor,
            end,
        };
        self.cursor = end;
        Some(window)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn t(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn clamps_final_window() {
        let windows: Vec<_> = WindowPlan::new(
            t("2025-01-01T00:00:00Z"),
            t("2025-01-01T13:00:00Z"),
            Duration::from_secs(6 * 3600),
        )
        .unwrap()
        .collect();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].start, t("2025-01-01T00:00:00Z"));
        assert_eq!(windows[0].end, t("2025-01-01T06:00:00Z"));
        assert_eq!(windows[1].start, t("2025-01-01T06:00:00Z"));
        assert_eq!(windows[1].end, t("2025-01-01T12:00:00Z"));
        assert_eq!(windows[2].start, t("2025-01-01T12:00:00Z"));
        assert_eq!(windows[2].end, t("2025-01-01T13:00:00Z"));
    }

    #[test]
    fn exact_division_has_no_short_tail() {
        let windows: Vec<_> = WindowPlan::new(
            t("2025-01-01T00:00:00Z"),
            t("2025-01-01T12:00:00Z"),
            Duration::from_secs(6 * 3600),
        )
        .unwrap()
        .collect();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].end, t("2025-01-01T12:00:00Z"));
    }

    #[test]
    fn single_window_when_step_exceeds_range() {
        let windows: Vec<_> = WindowPlan::new(
            t("2025-01-01T00:00:00Z"),
            t("2025-01-01T01:00:00Z"),
            Duration::from_secs(86400),
        )
        .unwrap()
        .collect();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, t("2025-01-01T00:00:00Z"));
        assert_eq!(windows[0].end, t("2025-01-01T01:00:00Z"));
    }

    #[test]
    fn windows_are_contiguous_and_cover_range() {
        let start = t("2025-03-15T08:00:00Z");
        let stop = t("2025-03-21T05:30:00Z");
        let step = Duration::from_secs(7 * 3600);
        let windows: Vec<_> = WindowPlan::new(start, stop, step).unwrap().collect();

        let span = (stop - start).num_seconds();
        let expected = (span as u64).div_ceil(7 * 3600) as usize;
        assert_eq!(windows.len(), expected);

        assert_eq!(windows[0].start, start);
        assert_eq!(windows.last().unwrap().end, stop);
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert!(pair[0].start < pair[0].end);
        }
    }

    #[test]
    fn reject_start_not_before_stop() {
        let now = t("2025-01-01T00:00:00Z");
        assert!(WindowPlan::new(now, now, Duration::from_secs(60)).is_err());
        assert!(
            WindowPlan::new(now, t("2024-12-31T00:00:00Z"), Duration::from_secs(60)).is_err()
        );
    }

    #[test]
    fn reject_zero_step() {
        assert!(
            WindowPlan::new(
                t("2025-01-01T00:00:00Z"),
                t("2025-01-02T00:00:00Z"),
                Duration::ZERO,
            )
            .is_err()
        );
    }
}
