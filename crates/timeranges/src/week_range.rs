//! Recurring weekly schedules.
//!
//! A [`WeekRange`] assigns a [`TimeRanges`] to each of the seven weekdays
//! and optionally carries the [`Zone`] used to interpret absolute instants.
//! Every weekday always has an entry; days without ranges are simply empty.
//!
//! Schedules can only be combined when their timezones are compatible, see
//! [`Zone::is_compatible`]. That check compares offsets at a single
//! reference instant and does not account for differing DST rules.

use std::collections::BTreeMap;
use std::ops::{BitAnd, BitOr};

use chrono::{DateTime, Duration, FixedOffset, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use timeranges_calendar::{normalize_time, time_max, time_min, Weekday, Zone};

use crate::datetime_range::{DatetimeRange, DatetimeRanges};
use crate::error::{Error, Result};
use crate::time_range::{TimeRange, TimeRanges};

/// Spans whose first and last dates are further apart than this cover
/// every weekday with at least one whole day.
const FULL_WEEK_SPAN_DAYS: i64 = 7;

/// A weekly schedule: time ranges per weekday plus an optional timezone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWeekRange", into = "RawWeekRange")]
pub struct WeekRange {
    days: [TimeRanges; 7],
    timezone: Option<Zone>,
}

#[derive(Serialize, Deserialize)]
struct RawWeekRange {
    #[serde(default)]
    days: BTreeMap<Weekday, TimeRanges>,
    #[serde(default)]
    timezone: Option<Zone>,
}

impl TryFrom<RawWeekRange> for WeekRange {
    type Error = Error;

    fn try_from(raw: RawWeekRange) -> Result<Self> {
        let week_range = Self::from_days(raw.days, raw.timezone);
        week_range.validate()?;
        Ok(week_range)
    }
}

impl From<WeekRange> for RawWeekRange {
    fn from(week_range: WeekRange) -> Self {
        let timezone = week_range.timezone;
        let days = Weekday::ALL
            .into_iter()
            .zip(week_range.days)
            .filter(|(_, ranges)| !ranges.is_empty())
            .collect();
        Self { days, timezone }
    }
}

/// Anything a [`WeekRange`] can be asked to contain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeekQuery<'a> {
    /// An absolute instant, re-expressed in the schedule's timezone.
    Instant(DateTime<FixedOffset>),
    /// Another schedule; must fit day by day.
    Week(&'a WeekRange),
}

impl From<DateTime<FixedOffset>> for WeekQuery<'_> {
    fn from(instant: DateTime<FixedOffset>) -> Self {
        WeekQuery::Instant(instant)
    }
}

impl From<DateTime<Utc>> for WeekQuery<'_> {
    fn from(instant: DateTime<Utc>) -> Self {
        WeekQuery::Instant(instant.fixed_offset())
    }
}

impl<'a> From<&'a WeekRange> for WeekQuery<'a> {
    fn from(week_range: &'a WeekRange) -> Self {
        WeekQuery::Week(week_range)
    }
}

/// Anything that can be checked for a transition against a [`WeekRange`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionProbe<'a> {
    Week(&'a WeekRange),
    Datetime(&'a DatetimeRange),
    Datetimes(&'a DatetimeRanges),
}

impl<'a> From<&'a WeekRange> for TransitionProbe<'a> {
    fn from(week_range: &'a WeekRange) -> Self {
        TransitionProbe::Week(week_range)
    }
}

impl<'a> From<&'a DatetimeRange> for TransitionProbe<'a> {
    fn from(range: &'a DatetimeRange) -> Self {
        TransitionProbe::Datetime(range)
    }
}

impl<'a> From<&'a DatetimeRanges> for TransitionProbe<'a> {
    fn from(ranges: &'a DatetimeRanges) -> Self {
        TransitionProbe::Datetimes(ranges)
    }
}

impl WeekRange {
    /// Creates an empty schedule.
    pub fn new(timezone: Option<Zone>) -> Self {
        Self {
            days: Default::default(),
            timezone,
        }
    }

    /// Creates a schedule from per-day ranges. A repeated weekday replaces
    /// the earlier entry.
    pub fn from_days<I>(days: I, timezone: Option<Zone>) -> Self
    where
        I: IntoIterator<Item = (Weekday, TimeRanges)>,
    {
        let mut week_range = Self::new(timezone);
        for (weekday, ranges) in days {
            week_range.set_day(weekday, ranges);
        }
        week_range
    }

    /// Same as [`WeekRange::with_timezone`], parsing the zone from an offset
    /// (`"+02:00"`) or an IANA name (`"Europe/Paris"`).
    pub fn with_timezone_name(self, name: &str) -> Result<Self> {
        let zone: Zone = name.parse()?;
        Ok(self.with_timezone(Some(zone)))
    }

    pub fn timezone(&self) -> Option<&Zone> {
        self.timezone.as_ref()
    }

    /// Returns the same schedule tagged with another timezone. Ranges are
    /// kept as wall-clock times, not shifted.
    pub fn with_timezone(mut self, timezone: Option<Zone>) -> Self {
        self.timezone = timezone;
        self
    }

    /// Ranges for a weekday, empty if none were set.
    pub fn day(&self, weekday: Weekday) -> &TimeRanges {
        &self.days[weekday.index()]
    }

    pub fn day_mut(&mut self, weekday: Weekday) -> &mut TimeRanges {
        &mut self.days[weekday.index()]
    }

    pub fn set_day(&mut self, weekday: Weekday, ranges: TimeRanges) {
        self.days[weekday.index()] = ranges;
    }

    /// Iterates over all seven weekdays, Monday first.
    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &TimeRanges)> {
        Weekday::ALL.into_iter().zip(self.days.iter())
    }

    /// Returns true if no weekday has any range.
    pub fn is_empty(&self) -> bool {
        self.days.iter().all(TimeRanges::is_empty)
    }

    pub fn validate(&self) -> Result<()> {
        self.days.iter().try_for_each(TimeRanges::validate)
    }

    /// Merges every weekday's ranges with the given tolerance.
    pub fn merge(&mut self, interpolate: Duration) -> Result<()> {
        for day in &mut self.days {
            day.merge(interpolate)?;
        }
        Ok(())
    }

    fn check_timezone(&self, other: &WeekRange) -> Result<()> {
        if Zone::is_compatible(self.timezone(), other.timezone()) {
            return Ok(());
        }
        tracing::debug!(
            left = ?self.timezone,
            right = ?other.timezone,
            "rejecting week ranges with incompatible timezones"
        );
        Err(Error::incompatible_timezones(self.timezone(), other.timezone()))
    }

    /// Checks membership of an instant or another schedule.
    pub fn contains<'a>(&self, query: impl Into<WeekQuery<'a>>) -> Result<bool> {
        match query.into() {
            WeekQuery::Instant(instant) => Ok(self.contains_instant(&instant)),
            WeekQuery::Week(other) => self.contains_week_range(other),
        }
    }

    /// Checks if an instant falls within the schedule.
    ///
    /// The instant is re-expressed in the schedule's timezone when one is
    /// set, otherwise its own offset is used. An instant whose wall-clock
    /// reading lies past the end of the calendar is never contained.
    pub fn contains_instant<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> bool {
        let zone = self
            .timezone
            .unwrap_or_else(|| Zone::Fixed(instant.offset().fix()));
        let Some(local) = zone.local_datetime(instant) else {
            return false;
        };
        let weekday = Weekday::from_date(local.date());
        self.day(weekday).contains_time(normalize_time(local.time()))
    }

    /// True if, for every weekday, `other`'s ranges are contained in ours.
    pub fn contains_week_range(&self, other: &WeekRange) -> Result<bool> {
        self.check_timezone(other)?;
        Ok(self
            .days
            .iter()
            .zip(other.days.iter())
            .all(|(ours, theirs)| ours.contains_ranges(theirs)))
    }

    /// Weekday-wise union, tagged with this schedule's timezone.
    pub fn union(&self, other: &WeekRange) -> Result<WeekRange> {
        self.combine(other, TimeRanges::union)
    }

    /// Weekday-wise intersection, tagged with this schedule's timezone.
    pub fn intersection(&self, other: &WeekRange) -> Result<WeekRange> {
        self.combine(other, TimeRanges::intersection)
    }

    fn combine<F>(&self, other: &WeekRange, op: F) -> Result<WeekRange>
    where
        F: Fn(&TimeRanges, &TimeRanges) -> TimeRanges,
    {
        self.check_timezone(other)?;
        let mut combined = WeekRange::new(self.timezone);
        for (i, day) in combined.days.iter_mut().enumerate() {
            *day = op(&self.days[i], &other.days[i]);
        }
        Ok(combined)
    }

    /// Checks whether `probe` crosses a boundary of this schedule.
    ///
    /// That is the case when the probe overlaps the schedule without being
    /// fully contained in it. Datetime probes are first projected onto a
    /// week in this schedule's timezone.
    pub fn has_transition<'a>(&self, probe: impl Into<TransitionProbe<'a>>) -> Result<bool> {
        match probe.into() {
            TransitionProbe::Week(other) => self.has_transition_week_range(other),
            TransitionProbe::Datetime(range) => {
                let other = Self::from_datetime_range(range, self.timezone());
                self.has_transition_week_range(&other)
            }
            TransitionProbe::Datetimes(ranges) => {
                let other = Self::from_datetime_ranges(ranges, self.timezone())?;
                self.has_transition_week_range(&other)
            }
        }
    }

    fn has_transition_week_range(&self, other: &WeekRange) -> Result<bool> {
        let inside = self.contains_week_range(other)?;
        let transition = !inside && !self.intersection(other)?.is_empty();
        tracing::debug!(inside, transition, "checked week range transition");
        Ok(transition)
    }

    /// Projects an absolute range onto the weekly cycle.
    ///
    /// Both ends are re-expressed in `replace_timezone`, or in the offset of
    /// the range's start when none is given; that zone tags the result.
    /// Every calendar day from the start date to the end date contributes
    /// a range to its weekday: the whole day for interior days, starting at
    /// the start time on the first day and ending at the end time on the
    /// last. Contributions landing on the same weekday are united.
    ///
    /// Ranges stay a day clear of chrono's calendar limits, so both ends
    /// have a wall-clock reading under any offset.
    pub fn from_datetime_range(range: &DatetimeRange, replace_timezone: Option<&Zone>) -> Self {
        let zone = replace_timezone
            .copied()
            .unwrap_or(Zone::Fixed(*range.start().offset()));
        let start = zone.localize(&range.start());
        let end = zone.localize(&range.end());

        let first = start.date_naive();
        let last = end.date_naive();
        let span_days = last.signed_duration_since(first).num_days();

        let mut week_range = Self::new(Some(zone));
        if span_days > FULL_WEEK_SPAN_DAYS {
            tracing::debug!(span_days, %zone, "datetime range covers whole weeks");
            for day in &mut week_range.days {
                *day = TimeRanges::full_day();
            }
            return week_range;
        }

        let mut date = first;
        loop {
            let from = if date == first {
                normalize_time(start.time())
            } else {
                time_min()
            };
            let to = if date == last {
                normalize_time(end.time())
            } else {
                time_max()
            };
            week_range
                .day_mut(Weekday::from_date(date))
                .push(TimeRange::between(from, to));

            if date >= last {
                break;
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }

        for day in &mut week_range.days {
            day.merge_within(Duration::zero());
        }

        tracing::debug!(
            days = span_days + 1,
            %zone,
            "projected datetime range onto week"
        );
        week_range
    }

    /// Weekday-wise union of each member's projection.
    ///
    /// Fails if members projected without `replace_timezone` end up in
    /// incompatible offsets. An empty collection yields an empty schedule.
    pub fn from_datetime_ranges(
        ranges: &DatetimeRanges,
        replace_timezone: Option<&Zone>,
    ) -> Result<Self> {
        let mut projected = ranges
            .iter()
            .map(|range| Self::from_datetime_range(range, replace_timezone));
        let Some(first) = projected.next() else {
            return Ok(Self::new(replace_timezone.copied()));
        };
        projected.try_fold(first, |acc, next| acc.union(&next))
    }
}

impl BitOr for &WeekRange {
    type Output = Result<WeekRange>;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl BitAnd for &WeekRange {
    type Output = Result<WeekRange>;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersection(rhs)
    }
}
