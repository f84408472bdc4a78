use std::fmt;

use serde::{Deserialize, Serialize};

const DAYS_IN_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const DAYS_BEFORE_MONTH: [u16; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Hour of a calendar day without an implied year.
///
/// Hours are normalized to `0..=23`; an end-of-day hour 24 is carried into
/// hour 0 of the following day (12/31 24:00 becomes 01/01 00:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub month: u8,
    pub day: u8,
    pub hour: u8,
}

impl Timestamp {
    /// Builds a timestamp, accepting hour 24 as end of day.
    ///
    /// February 29 is accepted (leap-year weather files) and rolls into March 1.
    pub fn new(month: u8, day: u8, hour: u8) -> Option<Self> {
        if !(1..=12).contains(&month) || hour > 24 {
            return None;
        }
        if day == 0 || day > days_in_month(month) {
            return None;
        }
        let ts = Self { month, day, hour };
        if hour == 24 {
            Some(Self {
                hour: 0,
                ..ts.next_day()
            })
        } else {
            Some(ts)
        }
    }

    /// Same hour on the following calendar day, wrapping 12/31 to 01/01.
    pub fn next_day(self) -> Self {
        let last_day = DAYS_IN_MONTH[(self.month - 1) as usize];
        if self.day < last_day {
            Self {
                day: self.day + 1,
                ..self
            }
        } else if self.month == 12 {
            Self {
                month: 1,
                day: 1,
                ..self
            }
        } else {
            Self {
                month: self.month + 1,
                day: 1,
                ..self
            }
        }
    }

    /// Day of year (1-365) on a non-leap calendar; February 29 maps onto March 1.
    pub fn day_of_year(&self) -> u16 {
        DAYS_BEFORE_MONTH[(self.month - 1) as usize] + self.day as u16
    }

    pub fn same_day(&self, other: &Timestamp) -> bool {
        self.month == other.month && self.day == other.day
    }

    /// Parses an EnergyPlus output `Date/Time` cell such as `" 07/15  24:00:00"`.
    pub fn parse_date_time(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let date = parts.next()?;
        let time = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        let (month, day) = date.split_once('/')?;
        let hour = time.split(':').next()?;
        Self::new(month.parse().ok()?, day.parse().ok()?, hour.parse().ok()?)
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }
}

fn days_in_month(month: u8) -> u8 {
    if month == 2 {
        29
    } else {
        DAYS_IN_MONTH[(month - 1) as usize]
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02} {:02}:00", self.month_name(), self.day, self.hour)
    }
}
