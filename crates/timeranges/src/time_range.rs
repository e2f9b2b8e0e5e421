//! Time-of-day ranges.
//!
//! A [`TimeRange`] is a closed interval `[start, end]` within a single day.
//! [`TimeRanges`] is an ordered collection of them with set operations.
//! Collections are not kept sorted implicitly: call [`TimeRanges::sort`] or
//! [`TimeRanges::merge`] before relying on ordering or disjointness.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{BitAnd, BitOr};

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use timeranges_calendar::{is_time_of_day, subtract_times, time_max, time_min};

use crate::error::{Error, Result};

/// A closed interval of time of day, `start <= end`.
///
/// Ranges never wrap around midnight. A span such as 21:00-07:00 has to be
/// expressed as two ranges on consecutive days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange")]
pub struct TimeRange {
    start: NaiveTime,
    end: NaiveTime,
}

#[derive(Deserialize)]
struct RawTimeRange {
    start: NaiveTime,
    end: NaiveTime,
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = Error;

    fn try_from(raw: RawTimeRange) -> Result<Self> {
        Self::new(raw.start, raw.end)
    }
}

fn validate_time(time: NaiveTime) -> Result<()> {
    if is_time_of_day(time) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "time {time} is outside the time-of-day domain"
        )))
    }
}

fn validate_order(start: NaiveTime, end: NaiveTime) -> Result<()> {
    if start > end {
        return Err(Error::Validation(format!(
            "start time {start} is after end time {end}"
        )));
    }
    Ok(())
}

impl TimeRange {
    /// Creates a new time range.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        validate_time(start)?;
        validate_time(end)?;
        validate_order(start, end)?;
        Ok(Self { start, end })
    }

    /// Builds a range from bounds already known to satisfy both invariants.
    pub(crate) fn between(start: NaiveTime, end: NaiveTime) -> Self {
        debug_assert!(is_time_of_day(start) && is_time_of_day(end) && start <= end);
        Self { start, end }
    }

    /// Creates a time range from whole hours.
    pub fn from_hours(start_hour: u32, end_hour: u32) -> Result<Self> {
        let hour = |h: u32| {
            NaiveTime::from_hms_opt(h, 0, 0)
                .ok_or_else(|| Error::Validation(format!("hour {h} is out of range")))
        };
        Self::new(hour(start_hour)?, hour(end_hour)?)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Returns a copy with a new start, re-validated.
    pub fn with_start(self, start: NaiveTime) -> Result<Self> {
        Self::new(start, self.end)
    }

    /// Returns a copy with a new end, re-validated.
    pub fn with_end(self, end: NaiveTime) -> Result<Self> {
        Self::new(self.start, end)
    }

    /// Re-checks both invariants.
    pub fn validate(&self) -> Result<()> {
        validate_time(self.start)?;
        validate_time(self.end)?;
        validate_order(self.start, self.end)
    }

    /// Orders ranges by start time only.
    ///
    /// Ranges sharing a start compare `Equal` here even when their ends
    /// differ, which is why `TimeRange` does not implement `Ord`.
    pub fn cmp_start(&self, other: &Self) -> Ordering {
        self.start.cmp(&other.start)
    }

    /// Length of the range.
    pub fn duration(&self) -> Duration {
        subtract_times(self.end, self.start)
    }

    /// Checks if a time falls within this range, both ends inclusive.
    pub fn contains_time(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }

    /// Checks if another range lies entirely within this one.
    pub fn contains_range(&self, other: &TimeRange) -> bool {
        self.contains_time(other.start) && self.contains_time(other.end)
    }

    /// Overlap of two ranges, or `None` if they are disjoint.
    pub fn intersection(&self, other: &TimeRange) -> Option<TimeRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(TimeRange { start, end })
    }
}

impl Default for TimeRange {
    /// The whole day, `00:00:00` to `23:59:59.999999`.
    fn default() -> Self {
        Self {
            start: time_min(),
            end: time_max(),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl BitAnd for TimeRange {
    type Output = Option<TimeRange>;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersection(&rhs)
    }
}

/// Anything a [`TimeRanges`] can be asked to contain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeQuery<'a> {
    /// A single time of day.
    Time(NaiveTime),
    /// A single range; must fit inside one member.
    Range(TimeRange),
    /// A collection; every member must fit inside some member.
    Ranges(&'a TimeRanges),
}

impl TimeQuery<'_> {
    /// Short name of the query's variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            TimeQuery::Time(_) => "time",
            TimeQuery::Range(_) => "TimeRange",
            TimeQuery::Ranges(_) => "TimeRanges",
        }
    }
}

impl fmt::Display for TimeQuery<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeQuery::Time(time) => write!(f, "{time}"),
            TimeQuery::Range(range) => write!(f, "{range}"),
            TimeQuery::Ranges(ranges) => write!(f, "{ranges}"),
        }
    }
}

impl From<NaiveTime> for TimeQuery<'_> {
    fn from(time: NaiveTime) -> Self {
        TimeQuery::Time(time)
    }
}

impl From<TimeRange> for TimeQuery<'_> {
    fn from(range: TimeRange) -> Self {
        TimeQuery::Range(range)
    }
}

impl From<&TimeRange> for TimeQuery<'_> {
    fn from(range: &TimeRange) -> Self {
        TimeQuery::Range(*range)
    }
}

impl<'a> From<&'a TimeRanges> for TimeQuery<'a> {
    fn from(ranges: &'a TimeRanges) -> Self {
        TimeQuery::Ranges(ranges)
    }
}

/// An ordered collection of time ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeRanges {
    ranges: Vec<TimeRange>,
}

impl TimeRanges {
    /// Wraps the given ranges as-is, without sorting.
    pub fn new(ranges: Vec<TimeRange>) -> Self {
        Self { ranges }
    }

    /// The whole day as a single range.
    pub fn full_day() -> Self {
        Self::from(TimeRange::default())
    }

    pub fn as_slice(&self) -> &[TimeRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Returns true if there are no ranges at all.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimeRange> {
        self.ranges.iter()
    }

    /// Appends a range. Ordering is not maintained.
    pub fn push(&mut self, range: TimeRange) {
        self.ranges.push(range);
    }

    /// Re-checks every member, failing on the first invalid one.
    pub fn validate(&self) -> Result<()> {
        self.ranges.iter().try_for_each(TimeRange::validate)
    }

    /// Sorts members by start time. Equal starts keep their relative order.
    pub fn sort(&mut self) {
        self.ranges.sort_by(TimeRange::cmp_start);
    }

    /// Coalesces members whose gap is at most `interpolate`.
    ///
    /// When `interpolate` is positive and the last range ends within
    /// `interpolate` of `23:59:59.999999`, it is extended to the end of the
    /// day. Afterwards members are sorted and separated by gaps larger than
    /// `interpolate`.
    pub fn merge(&mut self, interpolate: Duration) -> Result<()> {
        if interpolate < Duration::zero() {
            return Err(Error::Precondition(format!(
                "interpolation must not be negative, got {interpolate}"
            )));
        }
        self.merge_within(interpolate);
        Ok(())
    }

    pub(crate) fn merge_within(&mut self, interpolate: Duration) {
        self.sort();
        let before = self.ranges.len();

        let mut merged: Vec<TimeRange> = Vec::with_capacity(before);
        for range in std::mem::take(&mut self.ranges) {
            match merged.last_mut() {
                Some(last) if subtract_times(range.start, last.end) <= interpolate => {
                    if range.end > last.end {
                        last.end = range.end;
                    }
                }
                _ => merged.push(range),
            }
        }

        if interpolate > Duration::zero() {
            if let Some(last) = merged.last_mut() {
                if subtract_times(time_max(), last.end) <= interpolate {
                    last.end = time_max();
                }
            }
        }

        self.ranges = merged;
        self.sort();

        tracing::trace!(
            before,
            after = self.ranges.len(),
            %interpolate,
            "merged time ranges"
        );
    }

    /// Checks membership of a time, range or collection.
    pub fn contains<'a>(&self, query: impl Into<TimeQuery<'a>>) -> bool {
        match query.into() {
            TimeQuery::Time(time) => self.contains_time(time),
            TimeQuery::Range(range) => self.contains_range(&range),
            TimeQuery::Ranges(ranges) => self.contains_ranges(ranges),
        }
    }

    /// True if any member contains `time`.
    pub fn contains_time(&self, time: NaiveTime) -> bool {
        self.ranges.iter().any(|range| range.contains_time(time))
    }

    /// True if any single member contains the whole of `other`.
    pub fn contains_range(&self, other: &TimeRange) -> bool {
        self.ranges.iter().any(|range| range.contains_range(other))
    }

    /// True if every member of `other` is contained by some member of self.
    pub fn contains_ranges(&self, other: &TimeRanges) -> bool {
        other.ranges.iter().all(|range| self.contains_range(range))
    }

    /// Union of both collections, merged without tolerance.
    pub fn union(&self, other: &TimeRanges) -> TimeRanges {
        let mut union = TimeRanges::new([self.as_slice(), other.as_slice()].concat());
        union.merge_within(Duration::zero());
        union
    }

    /// Pairwise overlaps of both collections, merged without tolerance.
    pub fn intersection(&self, other: &TimeRanges) -> TimeRanges {
        let mut intersection: TimeRanges = self
            .ranges
            .iter()
            .flat_map(|a| other.ranges.iter().filter_map(move |b| a.intersection(b)))
            .collect();
        intersection.merge_within(Duration::zero());
        intersection
    }
}

impl fmt::Display for TimeRanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{range}")?;
        }
        f.write_str("]")
    }
}

impl From<TimeRange> for TimeRanges {
    fn from(range: TimeRange) -> Self {
        Self::new(vec![range])
    }
}

impl From<Vec<TimeRange>> for TimeRanges {
    fn from(ranges: Vec<TimeRange>) -> Self {
        Self::new(ranges)
    }
}

impl FromIterator<TimeRange> for TimeRanges {
    fn from_iter<I: IntoIterator<Item = TimeRange>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for TimeRanges {
    type Item = TimeRange;
    type IntoIter = std::vec::IntoIter<TimeRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.into_iter()
    }
}

impl<'a> IntoIterator for &'a TimeRanges {
    type Item = &'a TimeRange;
    type IntoIter = std::slice::Iter<'a, TimeRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

impl BitOr for &TimeRanges {
    type Output = TimeRanges;

    fn bitor(self, rhs: Self) -> TimeRanges {
        self.union(rhs)
    }
}

impl BitOr for TimeRanges {
    type Output = TimeRanges;

    fn bitor(self, rhs: Self) -> TimeRanges {
        self.union(&rhs)
    }
}

impl BitAnd for &TimeRanges {
    type Output = TimeRanges;

    fn bitand(self, rhs: Self) -> TimeRanges {
        self.intersection(rhs)
    }
}

impl BitAnd for TimeRanges {
    type Output = TimeRanges;

    fn bitand(self, rhs: Self) -> TimeRanges {
        self.intersection(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(hour: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
    }

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn range(start: u32, end: u32) -> TimeRange {
        TimeRange::from_hours(start, end).unwrap()
    }

    // ==================== TimeRange Tests ====================

    #[test]
    fn time_range_default_is_whole_day() {
        let range = TimeRange::default();
        assert_eq!(range.start(), time_min());
        assert_eq!(range.end(), time_max());
        assert_eq!(range.end().to_string(), "23:59:59.999999");
    }

    #[test]
    fn time_range_invalid() {
        assert!(matches!(TimeRange::new(t(2), t(1)), Err(Error::Validation(_))));
        assert!(TimeRange::from_hours(1, 24).is_err());

        let past_max = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_500).unwrap();
        assert!(matches!(
            TimeRange::new(t(1), past_max),
            Err(Error::Validation(_))
        ));
        let leap = NaiveTime::from_hms_nano_opt(10, 0, 59, 1_000_000_000).unwrap();
        assert!(TimeRange::new(leap, t(11)).is_err());
    }

    #[test]
    fn time_range_with_bounds_revalidates() {
        let range = range(1, 2);
        assert!(range.with_start(t(3)).is_err());
        assert!(range.with_end(t(0)).is_err());
        assert_eq!(range, TimeRange::from_hours(1, 2).unwrap());

        let widened = range.with_start(t(0)).unwrap().with_end(t(5)).unwrap();
        assert_eq!(widened, TimeRange::from_hours(0, 5).unwrap());
    }

    #[test]
    fn time_range_contains_time() {
        let range = range(2, 4);
        for yes in [t(2), t(3), t(4)] {
            assert!(range.contains_time(yes), "{yes} should be inside");
        }
        for no in [t(1), t(5)] {
            assert!(!range.contains_time(no), "{no} should be outside");
        }
    }

    #[test]
    fn time_range_contains_range() {
        let outer = range(2, 8);
        assert!(outer.contains_range(&range(2, 8)));
        assert!(outer.contains_range(&range(3, 5)));
        assert!(!outer.contains_range(&range(1, 5)));
        assert!(!outer.contains_range(&range(7, 9)));
    }

    #[test]
    fn time_range_intersection() {
        assert_eq!(range(2, 5) & range(4, 8), Some(range(4, 5)));
        assert_eq!(range(2, 4) & range(4, 8), Some(range(4, 4)));
        assert_eq!(range(2, 4) & range(5, 8), None);
    }

    #[test]
    fn time_range_orders_by_start_only() {
        let short = range(2, 3);
        let long = range(2, 9);
        assert_eq!(short.cmp_start(&long), Ordering::Equal);
        assert_ne!(short, long);
        assert_eq!(range(1, 9).cmp_start(&short), Ordering::Less);
    }

    // ==================== TimeRanges Tests ====================

    #[test]
    fn time_ranges_contains_time() {
        let ranges = TimeRanges::new(vec![range(2, 4), range(5, 7)]);
        for yes in [t(2), t(3), t(4), t(5), t(6), t(7)] {
            assert!(ranges.contains(yes), "{yes} should be inside");
        }
        let just_after = NaiveTime::from_hms_opt(4, 0, 1).unwrap();
        for no in [t(1), just_after, t(8)] {
            assert!(!ranges.contains(no), "{no} should be outside");
        }
    }

    #[test]
    fn time_ranges_contains_range_needs_single_member() {
        let ranges = TimeRanges::new(vec![range(2, 4), range(4, 7)]);
        assert!(ranges.contains(range(2, 3)));
        // Spans two members without being inside either one.
        assert!(!ranges.contains(range(3, 5)));
    }

    #[test]
    fn time_ranges_contains_ranges() {
        let ranges = TimeRanges::new(vec![range(2, 4), range(5, 7)]);
        let inside = TimeRanges::new(vec![range(2, 3), range(6, 7)]);
        let straddling = TimeRanges::new(vec![range(2, 3), range(4, 6)]);
        assert!(ranges.contains(&inside));
        assert!(!ranges.contains(&straddling));
        assert!(ranges.contains(&TimeRanges::default()));
    }

    #[test]
    fn time_ranges_sort_is_stable() {
        let mut ranges = TimeRanges::new(vec![range(5, 7), range(2, 9), range(2, 3)]);
        ranges.sort();
        assert_eq!(ranges.as_slice(), &[range(2, 9), range(2, 3), range(5, 7)]);
    }

    #[test]
    fn merge_overlapping() {
        let mut ranges = TimeRanges::new(vec![range(5, 7), range(2, 4), range(3, 6)]);
        ranges.merge(Duration::zero()).unwrap();
        assert_eq!(ranges.as_slice(), &[range(2, 7)]);
    }

    #[test]
    fn merge_does_not_shrink() {
        let mut ranges = TimeRanges::new(vec![range(2, 9), range(3, 4)]);
        ranges.merge(Duration::zero()).unwrap();
        assert_eq!(ranges.as_slice(), &[range(2, 9)]);
    }

    #[test]
    fn merge_keeps_gaps_without_tolerance() {
        let mut ranges = TimeRanges::new(vec![range(2, 4), range(5, 7)]);
        ranges.merge(Duration::zero()).unwrap();
        assert_eq!(ranges.len(), 2);
    }

    #[test]
    fn merge_with_tolerance() {
        let mut ranges = TimeRanges::new(vec![range(2, 4), range(5, 7)]);
        ranges.merge(Duration::hours(1)).unwrap();
        assert_eq!(ranges.as_slice(), &[range(2, 7)]);

        let mut ranges = TimeRanges::new(vec![range(2, 4), range(5, 7)]);
        ranges.merge(Duration::minutes(59)).unwrap();
        assert_eq!(ranges.len(), 2);
    }

    #[test]
    fn merge_extends_to_end_of_day() {
        let mut ranges = TimeRanges::new(vec![TimeRange::new(t(20), hm(23, 30)).unwrap()]);
        ranges.merge(Duration::hours(1)).unwrap();
        assert_eq!(ranges.as_slice(), &[TimeRange::new(t(20), time_max()).unwrap()]);
    }

    #[test]
    fn merge_does_not_extend_to_start_of_day() {
        let original = TimeRange::new(hm(0, 30), t(2)).unwrap();
        let mut ranges = TimeRanges::from(original);
        ranges.merge(Duration::hours(1)).unwrap();
        assert_eq!(ranges.as_slice(), &[original]);
    }

    #[test]
    fn merge_rejects_negative_tolerance() {
        let mut ranges = TimeRanges::new(vec![range(5, 7), range(2, 4)]);
        let result = ranges.merge(Duration::minutes(-1));
        assert!(matches!(result, Err(Error::Precondition(_))));
        // Left untouched.
        assert_eq!(ranges.as_slice(), &[range(5, 7), range(2, 4)]);
    }

    #[test]
    fn merge_empty_is_noop() {
        let mut ranges = TimeRanges::default();
        ranges.merge(Duration::hours(3)).unwrap();
        assert!(ranges.is_empty());
    }

    #[test]
    fn union_merges_touching() {
        let a = TimeRanges::new(vec![range(2, 4), range(8, 9)]);
        let b = TimeRanges::new(vec![range(4, 6)]);
        let union = &a | &b;
        assert_eq!(union.as_slice(), &[range(2, 6), range(8, 9)]);
    }

    #[test]
    fn intersection_of_collections() {
        let a = TimeRanges::new(vec![range(2, 6), range(8, 12)]);
        let b = TimeRanges::new(vec![range(5, 9), range(11, 13)]);
        let intersection = a & b;
        assert_eq!(
            intersection.as_slice(),
            &[range(5, 6), range(8, 9), range(11, 12)]
        );
    }

    #[test]
    fn intersection_disjoint_is_empty() {
        let a = TimeRanges::from(range(2, 4));
        let b = TimeRanges::from(range(5, 7));
        assert!((&a & &b).is_empty());
    }

    #[test]
    fn display_lists_members() {
        let ranges = TimeRanges::new(vec![range(2, 4), range(5, 7)]);
        assert_eq!(ranges.to_string(), "[02:00:00-04:00:00, 05:00:00-07:00:00]");
    }

    // ==================== Serialization Tests ====================

    #[test]
    fn time_ranges_serialization() {
        let ranges = TimeRanges::new(vec![range(2, 4)]);
        let json = serde_json::to_string(&ranges).unwrap();
        assert_eq!(json, r#"[{"start":"02:00:00","end":"04:00:00"}]"#);

        let back: TimeRanges = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ranges);
    }

    #[test]
    fn deserialization_validates() {
        let json = r#"{"start":"05:00:00","end":"04:00:00"}"#;
        assert!(serde_json::from_str::<TimeRange>(json).is_err());
    }
}
