//! Days of the week.
//!
//! Weekdays are numbered from Monday (0) to Sunday (6), matching
//! [`chrono::Datelike::weekday`] and `num_days_from_monday`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// Day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All days of the week, Monday first.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Ordinal of this day, Monday = 0 through Sunday = 6.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Weekday of a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::from_chrono(date.weekday())
    }

    /// Converts from chrono's Weekday.
    pub fn from_chrono(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }

    /// Lowercase English name.
    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

impl TryFrom<u8> for Weekday {
    type Error = CalendarError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(CalendarError::InvalidWeekday(value))
    }
}

impl From<Weekday> for chrono::Weekday {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Monday => chrono::Weekday::Mon,
            Weekday::Tuesday => chrono::Weekday::Tue,
            Weekday::Wednesday => chrono::Weekday::Wed,
            Weekday::Thursday => chrono::Weekday::Thu,
            Weekday::Friday => chrono::Weekday::Fri,
            Weekday::Saturday => chrono::Weekday::Sat,
            Weekday::Sunday => chrono::Weekday::Sun,
        }
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_index_matches_ordinal() {
        for (i, day) in Weekday::ALL.iter().enumerate() {
            assert_eq!(day.index(), i);
            assert_eq!(Weekday::try_from(i as u8).unwrap(), *day);
        }
        assert!(matches!(
            Weekday::try_from(7),
            Err(CalendarError::InvalidWeekday(7))
        ));
    }

    #[test]
    fn weekday_from_date() {
        // 2022-01-01 was a Saturday
        let date = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        assert_eq!(Weekday::from_date(date), Weekday::Saturday);
        let date = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        assert_eq!(Weekday::from_date(date), Weekday::Monday);
    }

    #[test]
    fn weekday_chrono_round_trip() {
        for day in Weekday::ALL {
            assert_eq!(Weekday::from_chrono(day.into()), day);
        }
    }

    #[test]
    fn weekday_serialization() {
        let json = serde_json::to_string(&Weekday::Monday).unwrap();
        assert_eq!(json, "\"monday\"");

        let deserialized: Weekday = serde_json::from_str("\"sunday\"").unwrap();
        assert_eq!(deserialized, Weekday::Sunday);
    }
}
