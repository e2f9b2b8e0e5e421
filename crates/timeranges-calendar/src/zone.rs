//! Timezone tags attached to weekly schedules.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// A timezone: either a fixed UTC offset or a named IANA zone.
///
/// Serialized as a string, e.g. `"+02:00"` or `"Europe/Paris"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Zone {
    /// Constant offset from UTC.
    Fixed(FixedOffset),
    /// Named zone with its own DST rules.
    Named(Tz),
}

impl Zone {
    /// UTC as a fixed zero offset.
    pub fn utc() -> Self {
        Zone::Fixed(Utc.fix())
    }

    /// Offset in effect at the given UTC instant.
    pub fn offset_at(&self, utc: NaiveDateTime) -> FixedOffset {
        match self {
            Zone::Fixed(offset) => *offset,
            Zone::Named(tz) => tz.offset_from_utc_datetime(&utc).fix(),
        }
    }

    /// Offset at the reference instant 2000-01-01T00:00 UTC.
    ///
    /// Used to decide whether two zones are interchangeable. Zones sharing
    /// this offset but with different DST rules are treated as equal.
    pub fn reference_offset(&self) -> FixedOffset {
        let reference = NaiveDate::from_ymd_opt(2000, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        self.offset_at(reference)
    }

    /// Re-expresses an instant in this zone.
    pub fn localize<T: TimeZone>(&self, instant: &DateTime<T>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset_at(instant.naive_utc()))
    }

    /// Wall-clock reading of an instant in this zone.
    ///
    /// `None` when the reading falls outside chrono's calendar, which can
    /// happen within a day of `DateTime::MIN_UTC` or `DateTime::MAX_UTC`.
    pub fn local_datetime<T: TimeZone>(&self, instant: &DateTime<T>) -> Option<NaiveDateTime> {
        let utc = instant.naive_utc();
        let offset = self.offset_at(utc).local_minus_utc();
        utc.checked_add_signed(Duration::seconds(i64::from(offset)))
    }

    /// Returns true if schedules tagged with `a` and `b` can be combined.
    ///
    /// Two tags are compatible when they are equal (including both absent)
    /// or when both are present and agree on [`Zone::reference_offset`].
    pub fn is_compatible(a: Option<&Zone>, b: Option<&Zone>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b || a.reference_offset() == b.reference_offset(),
            _ => false,
        }
    }
}

impl From<FixedOffset> for Zone {
    fn from(offset: FixedOffset) -> Self {
        Zone::Fixed(offset)
    }
}

impl From<Tz> for Zone {
    fn from(tz: Tz) -> Self {
        Zone::Named(tz)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Fixed(offset) => write!(f, "{offset}"),
            Zone::Named(tz) => f.write_str(tz.name()),
        }
    }
}

impl FromStr for Zone {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(offset) = s.parse::<FixedOffset>() {
            return Ok(Zone::Fixed(offset));
        }
        Tz::from_str(s)
            .map(Zone::Named)
            .map_err(|_| CalendarError::UnknownZone(s.to_string()))
    }
}

impl TryFrom<String> for Zone {
    type Error = CalendarError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Zone> for String {
    fn from(zone: Zone) -> Self {
        zone.to_string()
    }
}
