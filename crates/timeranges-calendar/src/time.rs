//! Time-of-day helpers.
//!
//! The time-of-day domain is `[00:00:00.000000, 23:59:59.999999]` with
//! microsecond resolution. [`NaiveTime`] can represent finer fractions and
//! leap seconds, so values coming from arbitrary timestamps should go
//! through [`normalize_time`] first.

use chrono::{Duration, NaiveTime, Timelike};

const MICROS_PER_SECOND: i64 = 1_000_000;
const NANOS_PER_MICRO: u32 = 1_000;
const MAX_NANOS: u32 = 999_999_999;

const TIME_MAX: NaiveTime = match NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999) {
    Some(time) => time,
    None => panic!("23:59:59.999999 is a valid time"),
};

/// Earliest time of day, `00:00:00`.
pub fn time_min() -> NaiveTime {
    NaiveTime::MIN
}

/// Latest time of day, `23:59:59.999999`.
pub fn time_max() -> NaiveTime {
    TIME_MAX
}

/// Returns true if `time` lies inside the microsecond time-of-day domain.
///
/// Leap-second readings and fractions past `23:59:59.999999` are rejected.
pub fn is_time_of_day(time: NaiveTime) -> bool {
    time.nanosecond() <= MAX_NANOS && time <= time_max()
}

/// Truncates `time` to microseconds and folds a leap-second reading into
/// the last microsecond of its second.
pub fn normalize_time(time: NaiveTime) -> NaiveTime {
    let nanos = time.nanosecond().min(MAX_NANOS) / NANOS_PER_MICRO * NANOS_PER_MICRO;
    time.with_nanosecond(nanos).unwrap_or(time)
}

/// Microseconds elapsed since midnight.
pub fn time_in_microseconds(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) * MICROS_PER_SECOND
        + i64::from(time.nanosecond().min(MAX_NANOS) / NANOS_PER_MICRO)
}

/// Signed difference `first - second`, with microsecond resolution.
///
/// Unlike `NaiveTime - NaiveTime` this never adjusts for leap seconds; both
/// readings are taken as plain clock values within the same day.
pub fn subtract_times(first: NaiveTime, second: NaiveTime) -> Duration {
    Duration::microseconds(time_in_microseconds(first) - time_in_microseconds(second))
}
