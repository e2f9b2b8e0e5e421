//! Absolute datetime ranges.
//!
//! Same algebra as [`crate::time_range`], over timezone-aware instants.
//! There is no end-of-day ceiling here, so merging never extends the last
//! range.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{BitAnd, BitOr};

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use timeranges_calendar::Zone;

use crate::error::{Error, Result};
use crate::week_range::WeekRange;

/// A closed interval between two instants, `start <= end`.
///
/// Both ends keep the offset they were given; comparisons are by instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDatetimeRange")]
pub struct DatetimeRange {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

#[derive(Deserialize)]
struct RawDatetimeRange {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

impl TryFrom<RawDatetimeRange> for DatetimeRange {
    type Error = Error;

    fn try_from(raw: RawDatetimeRange) -> Result<Self> {
        Self::new(raw.start, raw.end)
    }
}

impl DatetimeRange {
    /// Creates a new datetime range from instants in any timezone.
    ///
    /// Both ends must lie within [`DatetimeRange::min_instant`] and
    /// [`DatetimeRange::max_instant`].
    pub fn new<Tz: TimeZone>(start: DateTime<Tz>, end: DateTime<Tz>) -> Result<Self> {
        let start = start.fixed_offset();
        let end = end.fixed_offset();
        if start > end {
            return Err(Error::Validation(format!(
                "start datetime {start} is after end datetime {end}"
            )));
        }
        if start < Self::min_instant() || end > Self::max_instant() {
            return Err(Error::Validation(format!(
                "datetime range {start}/{end} reaches past the supported calendar"
            )));
        }
        Ok(Self { start, end })
    }

    /// Earliest supported instant.
    ///
    /// One day short of chrono's limit, so the wall-clock reading stays
    /// representable under any UTC offset.
    pub fn min_instant() -> DateTime<Utc> {
        DateTime::<Utc>::MIN_UTC + Duration::days(1)
    }

    /// Latest supported instant, one day short of chrono's limit.
    pub fn max_instant() -> DateTime<Utc> {
        DateTime::<Utc>::MAX_UTC - Duration::days(1)
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    pub fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }

    /// Returns a copy with a new start, re-validated.
    pub fn with_start<Tz: TimeZone>(self, start: DateTime<Tz>) -> Result<Self> {
        Self::new(start.fixed_offset(), self.end)
    }

    /// Returns a copy with a new end, re-validated.
    pub fn with_end<Tz: TimeZone>(self, end: DateTime<Tz>) -> Result<Self> {
        Self::new(self.start, end.fixed_offset())
    }

    pub fn validate(&self) -> Result<()> {
        Self::new(self.start, self.end).map(|_| ())
    }

    /// Orders ranges by start instant only.
    pub fn cmp_start(&self, other: &Self) -> Ordering {
        self.start.cmp(&other.start)
    }

    pub fn duration(&self) -> Duration {
        self.end.signed_duration_since(self.start)
    }

    /// Checks if an instant falls within this range, both ends inclusive.
    pub fn contains_instant<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> bool {
        let instant = instant.fixed_offset();
        self.start <= instant && instant <= self.end
    }

    /// Checks if another range lies entirely within this one.
    pub fn contains_range(&self, other: &DatetimeRange) -> bool {
        self.contains_instant(&other.start) && self.contains_instant(&other.end)
    }

    /// Overlap of two ranges, or `None` if they are disjoint.
    pub fn intersection(&self, other: &DatetimeRange) -> Option<DatetimeRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(DatetimeRange { start, end })
    }

    /// Projects this range onto a weekly schedule.
    ///
    /// See [`WeekRange::from_datetime_range`].
    pub fn to_week_range(&self, replace_timezone: Option<&Zone>) -> WeekRange {
        WeekRange::from_datetime_range(self, replace_timezone)
    }
}

impl Default for DatetimeRange {
    /// Every supported instant, in UTC.
    fn default() -> Self {
        Self {
            start: Self::min_instant().fixed_offset(),
            end: Self::max_instant().fixed_offset(),
        }
    }
}

impl fmt::Display for DatetimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

impl BitAnd for DatetimeRange {
    type Output = Option<DatetimeRange>;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersection(&rhs)
    }
}

/// Anything a [`DatetimeRanges`] can be asked to contain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DatetimeQuery<'a> {
    Instant(DateTime<FixedOffset>),
    Range(DatetimeRange),
    Ranges(&'a DatetimeRanges),
}

impl From<DateTime<FixedOffset>> for DatetimeQuery<'_> {
    fn from(instant: DateTime<FixedOffset>) -> Self {
        DatetimeQuery::Instant(instant)
    }
}

impl From<DateTime<Utc>> for DatetimeQuery<'_> {
    fn from(instant: DateTime<Utc>) -> Self {
        DatetimeQuery::Instant(instant.fixed_offset())
    }
}

impl From<DatetimeRange> for DatetimeQuery<'_> {
    fn from(range: DatetimeRange) -> Self {
        DatetimeQuery::Range(range)
    }
}

impl From<&DatetimeRange> for DatetimeQuery<'_> {
    fn from(range: &DatetimeRange) -> Self {
        DatetimeQuery::Range(*range)
    }
}

impl<'a> From<&'a DatetimeRanges> for DatetimeQuery<'a> {
    fn from(ranges: &'a DatetimeRanges) -> Self {
        DatetimeQuery::Ranges(ranges)
    }
}

/// An ordered collection of datetime ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatetimeRanges {
    ranges: Vec<DatetimeRange>,
}

impl DatetimeRanges {
    /// Wraps the given ranges as-is, without sorting.
    pub fn new(ranges: Vec<DatetimeRange>) -> Self {
        Self { ranges }
    }

    pub fn as_slice(&self) -> &[DatetimeRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DatetimeRange> {
        self.ranges.iter()
    }

    pub fn push(&mut self, range: DatetimeRange) {
        self.ranges.push(range);
    }

    pub fn validate(&self) -> Result<()> {
        self.ranges.iter().try_for_each(DatetimeRange::validate)
    }

    /// Sorts members by start instant. Equal starts keep their relative order.
    pub fn sort(&mut self) {
        self.ranges.sort_by(DatetimeRange::cmp_start);
    }

    /// Coalesces members whose gap is at most `interpolate`.
    pub fn merge(&mut self, interpolate: Duration) -> Result<()> {
        if interpolate < Duration::zero() {
            return Err(Error::Precondition(format!(
                "interpolation must not be negative, got {interpolate}"
            )));
        }
        self.merge_within(interpolate);
        Ok(())
    }

    fn merge_within(&mut self, interpolate: Duration) {
        self.sort();
        let before = self.ranges.len();

        let mut merged: Vec<DatetimeRange> = Vec::with_capacity(before);
        for range in std::mem::take(&mut self.ranges) {
            match merged.last_mut() {
                Some(last) if range.start.signed_duration_since(last.end) <= interpolate => {
                    if range.end > last.end {
                        last.end = range.end;
                    }
                }
                _ => merged.push(range),
            }
        }

        self.ranges = merged;
        self.sort();

        tracing::trace!(
            before,
            after = self.ranges.len(),
            %interpolate,
            "merged datetime ranges"
        );
    }

    /// Checks membership of an instant, range or collection.
    pub fn contains<'a>(&self, query: impl Into<DatetimeQuery<'a>>) -> bool {
        match query.into() {
            DatetimeQuery::Instant(instant) => self.contains_instant(&instant),
            DatetimeQuery::Range(range) => self.contains_range(&range),
            DatetimeQuery::Ranges(ranges) => self.contains_ranges(ranges),
        }
    }

    pub fn contains_instant<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> bool {
        self.ranges.iter().any(|range| range.contains_instant(instant))
    }

    pub fn contains_range(&self, other: &DatetimeRange) -> bool {
        self.ranges.iter().any(|range| range.contains_range(other))
    }

    /// True if every member of `other` is contained by some member of self.
    pub fn contains_ranges(&self, other: &DatetimeRanges) -> bool {
        other.ranges.iter().all(|range| self.contains_range(range))
    }

    /// Union of both collections, merged without tolerance.
    pub fn union(&self, other: &DatetimeRanges) -> DatetimeRanges {
        let mut union = DatetimeRanges::new([self.as_slice(), other.as_slice()].concat());
        union.merge_within(Duration::zero());
        union
    }

    /// Pairwise overlaps of both collections, merged without tolerance.
    pub fn intersection(&self, other: &DatetimeRanges) -> DatetimeRanges {
        let mut intersection: DatetimeRanges = self
            .ranges
            .iter()
            .flat_map(|a| other.ranges.iter().filter_map(move |b| a.intersection(b)))
            .collect();
        intersection.merge_within(Duration::zero());
        intersection
    }

    /// Weekday-wise union of every member's projection.
    ///
    /// See [`WeekRange::from_datetime_ranges`].
    pub fn to_week_range(&self, replace_timezone: Option<&Zone>) -> Result<WeekRange> {
        WeekRange::from_datetime_ranges(self, replace_timezone)
    }
}

impl From<DatetimeRange> for DatetimeRanges {
    fn from(range: DatetimeRange) -> Self {
        Self::new(vec![range])
    }
}

impl From<Vec<DatetimeRange>> for DatetimeRanges {
    fn from(ranges: Vec<DatetimeRange>) -> Self {
        Self::new(ranges)
    }
}

impl FromIterator<DatetimeRange> for DatetimeRanges {
    fn from_iter<I: IntoIterator<Item = DatetimeRange>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for DatetimeRanges {
    type Item = DatetimeRange;
    type IntoIter = std::vec::IntoIter<DatetimeRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.into_iter()
    }
}

impl<'a> IntoIterator for &'a DatetimeRanges {
    type Item = &'a DatetimeRange;
    type IntoIter = std::slice::Iter<'a, DatetimeRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

impl BitOr for &DatetimeRanges {
    type Output = DatetimeRanges;

    fn bitor(self, rhs: Self) -> DatetimeRanges {
        self.union(rhs)
    }
}

impl BitOr for DatetimeRanges {
    type Output = DatetimeRanges;

    fn bitor(self, rhs: Self) -> DatetimeRanges {
        self.union(&rhs)
    }
}

impl BitAnd for &DatetimeRanges {
    type Output = DatetimeRanges;

    fn bitand(self, rhs: Self) -> DatetimeRanges {
        self.intersection(rhs)
    }
}

impl BitAnd for DatetimeRanges {
    type Output = DatetimeRanges;

    fn bitand(self, rhs: Self) -> DatetimeRanges {
        self.intersection(&rhs)
    }
}
