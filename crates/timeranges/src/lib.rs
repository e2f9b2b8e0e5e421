//! Timeranges - interval algebra over times of day, weeks and datetimes.
//!
//! This crate provides value types for spans of time and the set operations
//! between them:
//!
//! - [`TimeRange`] / [`TimeRanges`]: closed time-of-day intervals within a day
//! - [`DatetimeRange`] / [`DatetimeRanges`]: intervals between absolute instants
//! - [`WeekRange`]: a recurring weekly schedule with an optional timezone
//! - [`TimeMap`]: values keyed by time ranges, looked up by containment
//!
//! All types are plain values. Collections are not kept sorted implicitly;
//! `merge`, `union` and `intersection` return sorted, disjoint members.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, NaiveTime};
//! use timeranges::{TimeRange, TimeRanges, Weekday, WeekRange};
//!
//! let mut ranges = TimeRanges::new(vec![
//!     TimeRange::from_hours(2, 4).unwrap(),
//!     TimeRange::from_hours(5, 7).unwrap(),
//! ]);
//! assert!(ranges.contains(NaiveTime::from_hms_opt(3, 0, 0).unwrap()));
//!
//! ranges.merge(Duration::hours(1)).unwrap();
//! assert_eq!(ranges.len(), 1);
//!
//! let target = WeekRange::from_days([(Weekday::Monday, ranges)], None);
//! let probe = WeekRange::from_days(
//!     [(Weekday::Monday, TimeRanges::from(TimeRange::from_hours(6, 8).unwrap()))],
//!     None,
//! );
//! assert!(target.has_transition(&probe).unwrap());
//! ```

pub mod datetime_range;
pub mod error;
pub mod time_map;
pub mod time_range;
pub mod week_range;

pub use datetime_range::{DatetimeQuery, DatetimeRange, DatetimeRanges};
pub use error::{Error, Result};
pub use time_map::TimeMap;
pub use time_range::{TimeQuery, TimeRange, TimeRanges};
pub use week_range::{TransitionProbe, WeekQuery, WeekRange};

pub use timeranges_calendar::{subtract_times, time_max, time_min, Weekday, Zone};
