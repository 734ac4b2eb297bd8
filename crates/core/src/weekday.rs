//! Weekday tags used for learner day preferences.
//!
//! Stored as SMALLINT day numbers (0 = Sunday .. 6 = Saturday) and sent over
//! the wire as upper-case names.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

/// Days used when a learner enrolls without choosing any.
pub const DEFAULT_PREFERRED_DAYS: [DayOfWeek; 3] =
    [DayOfWeek::Monday, DayOfWeek::Wednesday, DayOfWeek::Friday];

impl DayOfWeek {
    /// Day number with Sunday as 0.
    pub fn number(self) -> i16 {
        self as i16
    }

    pub fn from_number(n: i16) -> Option<Self> {
        match n {
            0 => Some(DayOfWeek::Sunday),
            1 => Some(DayOfWeek::Monday),
            2 => Some(DayOfWeek::Tuesday),
            3 => Some(DayOfWeek::Wednesday),
            4 => Some(DayOfWeek::Thursday),
            5 => Some(DayOfWeek::Friday),
            6 => Some(DayOfWeek::Saturday),
            _ => None,
        }
    }

    pub fn from_chrono(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Sun => DayOfWeek::Sunday,
            chrono::Weekday::Mon => DayOfWeek::Monday,
            chrono::Weekday::Tue => DayOfWeek::Tuesday,
            chrono::Weekday::Wed => DayOfWeek::Wednesday,
            chrono::Weekday::Thu => DayOfWeek::Thursday,
            chrono::Weekday::Fri => DayOfWeek::Friday,
            chrono::Weekday::Sat => DayOfWeek::Saturday,
        }
    }

    /// Weekday of a calendar date.
    pub fn of(date: chrono::NaiveDate) -> Self {
        Self::from_chrono(chrono::Datelike::weekday(&date))
    }
}

/// Sort and de-duplicate a day selection so it can be stored canonically.
pub fn normalize_days(days: &[DayOfWeek]) -> Vec<DayOfWeek> {
    let mut out = days.to_vec();
    out.sort();
    out.dedup();
    out
}
