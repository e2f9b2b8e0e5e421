//! Calendar error types.

use thiserror::Error;

/// Errors raised by the calendar primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    /// Weekday ordinal outside 0..=6.
    #[error("invalid weekday ordinal: {0}")]
    InvalidWeekday(u8),

    /// Neither a UTC offset nor a known IANA zone name.
    #[error("unknown timezone: {0}")]
    UnknownZone(String),
}
