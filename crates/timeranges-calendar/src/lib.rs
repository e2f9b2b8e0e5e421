//! Timeranges Calendar - weekday, time-of-day and timezone primitives.
//!
//! These are the building blocks the `timeranges` crate relies on:
//!
//! - [`Weekday`], numbered Monday = 0 through Sunday = 6
//! - time-of-day arithmetic with microsecond resolution ([`subtract_times`])
//! - [`Zone`], a fixed offset or named IANA timezone

pub mod error;
pub mod time;
pub mod weekday;
pub mod zone;

pub use error::CalendarError;
pub use time::{
    is_time_of_day, normalize_time, subtract_times, time_in_microseconds, time_max, time_min,
};
pub use weekday::Weekday;
pub use zone::Zone;
