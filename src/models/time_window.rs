//! Time window and calendar-day range models.
//!
//! # Time Model
//! Instants are UTC (`DateTime<Utc>`). Anything that depends on a calendar
//! day (date filters, selected board dates) is evaluated in a canonical
//! timezone passed in by the caller as a `FixedOffset`. Nothing here reads
//! the local system timezone.
//!
//! # Overlap
//! Windows are half-open `[start, end)`. Two windows overlap iff
//! `a.start < b.end && b.start < a.end`; touching windows do not overlap.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, ValidationErrorKind};

/// Half-open span `[start, end)` on the board timeline.
///
/// Half-open interval: includes start, excludes end. `start <= end` is
/// enforced at construction and on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeWindow")]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawTimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawTimeWindow> for TimeWindow {
    type Error = ValidationError;

    fn try_from(raw: RawTimeWindow) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl TimeWindow {
    /// Window from `start` to `end`.
    ///
    /// Fails with [`ValidationErrorKind::InvalidTimeWindow`] if `end < start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::new(
                ValidationErrorKind::InvalidTimeWindow,
                format!("Time window ends ({end}) before it starts ({start})"),
            ));
        }
        Ok(Self { start, end })
    }

    /// Interval start (inclusive).
    #[inline]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Interval end (exclusive).
    #[inline]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Duration of this window.
    #[inline]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether an instant falls within this window.
    #[inline]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Whether two windows overlap (strict, half-open).
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Smallest window covering both windows.
    pub fn span(&self, other: &Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Widens the window by `before` at the start and `after` at the end.
    ///
    /// Negative durations are treated as zero.
    pub fn expand(&self, before: Duration, after: Duration) -> Self {
        Self {
            start: self.start - before.max(Duration::zero()),
            end: self.end + after.max(Duration::zero()),
        }
    }

    /// Calendar date of the start in the canonical timezone.
    pub fn local_start_date(&self, tz: FixedOffset) -> NaiveDate {
        self.start.with_timezone(&tz).date_naive()
    }

    /// Calendar date of the end in the canonical timezone.
    pub fn local_end_date(&self, tz: FixedOffset) -> NaiveDate {
        self.end.with_timezone(&tz).date_naive()
    }
}

/// Inclusive range of calendar days, e.g. the dates selected on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = ValidationError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        Self::new(raw.from, raw.to)
    }
}

impl DateRange {
    /// Creates a day range. Fails if `to` precedes `from`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ValidationError> {
        if to < from {
            return Err(ValidationError::new(
                ValidationErrorKind::InvalidTimeWindow,
                format!("Date range ends ({to}) before it starts ({from})"),
            ));
        }
        Ok(Self { from, to })
    }

    /// A single day.
    pub fn day(date: NaiveDate) -> Self {
        Self { from: date, to: date }
    }

    /// First day (inclusive).
    pub fn from(&self) -> NaiveDate {
        self.from
    }

    /// Last day (inclusive).
    pub fn to(&self) -> NaiveDate {
        self.to
    }

    /// Whether a calendar date is within the range.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    /// Number of days covered.
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    /// Instant window `[from 00:00, to + 1 day 00:00)` in the given timezone.
    pub fn to_window(&self, tz: FixedOffset) -> TimeWindow {
        let start = local_midnight(self.from, tz);
        let end = local_midnight(self.to, tz) + Duration::days(1);
        TimeWindow { start, end }
    }
}

fn local_midnight(date: NaiveDate, tz: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    let utc = local - Duration::seconds(i64::from(tz.local_minus_utc()));
    Utc.from_utc_datetime(&utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::at;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_time_window() {
        let w = TimeWindow::new(at(9, 0), at(10, 0)).unwrap();
        assert_eq!(w.duration(), Duration::hours(1));
        assert!(w.contains(at(9, 0)));
        assert!(w.contains(at(9, 59)));
        assert!(!w.contains(at(10, 0))); // exclusive end
        assert!(!w.contains(at(8, 0)));
    }

    #[test]
    fn test_invalid_window_rejected() {
        let err = TimeWindow::new(at(10, 0), at(9, 0)).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidTimeWindow);
        assert!(TimeWindow::new(at(9, 0), at(9, 0)).is_ok()); // empty is allowed
    }

    #[test]
    fn test_windows_overlap_half_open() {
        let a = TimeWindow::new(at(9, 0), at(10, 0)).unwrap();
        let b = TimeWindow::new(at(9, 30), at(9, 45)).unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));

        let c = TimeWindow::new(at(10, 0), at(11, 0)).unwrap(); // touching
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn test_span_and_expand() {
        let a = TimeWindow::new(at(9, 0), at(10, 0)).unwrap();
        let b = TimeWindow::new(at(12, 0), at(13, 0)).unwrap();
        let s = a.span(&b);
        assert_eq!(s.start(), at(9, 0));
        assert_eq!(s.end(), at(13, 0));

        let e = a.expand(Duration::hours(1), Duration::minutes(30));
        assert_eq!(e.start(), at(8, 0));
        assert_eq!(e.end(), at(10, 30));

        let n = a.expand(Duration::hours(-1), Duration::zero());
        assert_eq!(n, a);
    }

    #[test]
    fn test_deserialize_checks_order() {
        let ok: TimeWindow = serde_json::from_str(
            r#"{"start":"2024-03-04T09:00:00Z","end":"2024-03-04T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(ok.start(), at(9, 0));

        let bad = serde_json::from_str::<TimeWindow>(
            r#"{"start":"2024-03-04T10:00:00Z","end":"2024-03-04T09:00:00Z"}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_local_dates_follow_canonical_timezone() {
        // 23:30 UTC on the 4th is already the 5th in UTC+2
        let w = TimeWindow::new(at(23, 30), at(23, 45)).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        let cest = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(w.local_start_date(utc), date(4));
        assert_eq!(w.local_start_date(cest), date(5));
    }

    #[test]
    fn test_date_range_window() {
        let cet = FixedOffset::east_opt(3600).unwrap();
        let range = DateRange::new(date(4), date(5)).unwrap();
        assert_eq!(range.days(), 2);
        assert!(range.contains_date(date(5)));
        assert!(!range.contains_date(date(6)));

        let w = range.to_window(cet);
        // Local midnight in UTC+1 is 23:00 UTC of the previous day
        assert_eq!(w.start(), at(0, 0) - Duration::hours(1));
        assert_eq!(w.duration(), Duration::days(2));
    }

    #[test]
    fn test_date_range_rejects_reversed() {
        assert!(DateRange::new(date(5), date(4)).is_err());
        assert_eq!(DateRange::day(date(4)).days(), 1);
    }
}
