//! Error types for interval operations.

use thiserror::Error;
use timeranges_calendar::{CalendarError, Zone};

/// Errors that can occur when building or combining ranges.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A range or value failed validation (start after end, value outside
    /// the time-of-day domain).
    #[error("validation error: {0}")]
    Validation(String),

    /// An argument had a type outside the accepted set.
    #[error("type mismatch: expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Two weekly schedules are tagged with incompatible timezones.
    #[error("incompatible timezones ({left} and {right})")]
    IncompatibleTimezone { left: String, right: String },

    /// No key of a time map matched the query.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// A caller broke an argument precondition.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// Calendar primitive error (e.g. unknown timezone name).
    #[error("calendar error: {0}")]
    Calendar(#[from] CalendarError),
}

impl Error {
    pub(crate) fn incompatible_timezones(left: Option<&Zone>, right: Option<&Zone>) -> Self {
        fn describe(zone: Option<&Zone>) -> String {
            zone.map_or_else(|| "none".to_string(), Zone::to_string)
        }
        Error::IncompatibleTimezone {
            left: describe(left),
            right: describe(right),
        }
    }
}

/// Result type for interval operations.
pub type Result<T> = std::result::Result<T, Error>;
