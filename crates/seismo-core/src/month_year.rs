//! A calendar month/year value, with the arithmetic the SEISHUB archive
//! traversal needs to cross month boundaries.
//!
//! Ported from `original_source/monthyear.go` and
//! `original_source/provider/seishub/seishub.go::MonthYearPathSeg`.

use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

const MONTH_NAMES: [&str; 12] = [
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

/// One calendar month of one year. `month` is 1-12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthYear {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum MonthYearError {
    #[error("month must be in 1..=12, got {0}")]
    InvalidMonth(u32),
}

impl MonthYear {
    pub fn new(year: i32, month: u32) -> Result<Self, MonthYearError> {
        if !(1..=12).contains(&month) {
            return Err(MonthYearError::InvalidMonth(month));
        }
        Ok(MonthYear { year, month })
    }

    /// The `MonthYear` containing `t` (in UTC).
    pub fn from_datetime(t: DateTime<Utc>) -> Self {
        use chrono::Datelike;
        MonthYear {
            year: t.year(),
            month: t.month(),
        }
    }

    /// Midnight UTC on the first day of this month.
    pub fn date(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(self.year, self.month, 1, 0, 0, 0)
            .single()
            .expect("year/month already validated")
    }

    /// Whether `self` is strictly later than `other`.
    pub fn after(&self, other: &MonthYear) -> bool {
        (self.year, self.month) > (other.year, other.month)
    }

    /// Adds `n` months (may be negative), wrapping the year as needed.
    ///
    /// An additive group action: `m.add_month(a).add_month(b) == m.add_month(a + b)`.
    pub fn add_month(&self, n: i64) -> MonthYear {
        let zero_based = (self.month as i64 - 1) + n;
        let year = self.year as i64 + zero_based.div_euclid(12);
        let month = zero_based.rem_euclid(12) + 1;
        MonthYear {
            year: year as i32,
            month: month as u32,
        }
    }

    /// Signed difference in months: `self.add_month(n) == other` implies
    /// `self.add_month(n).diff(self) == n`, i.e. `other.diff(self) == n`.
    pub fn diff(&self, other: &MonthYear) -> i64 {
        (self.year as i64 - other.year as i64) * 12 + (self.month as i64 - other.month as i64)
    }

    /// English month name, e.g. `"April"`.
    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }

    /// The archive directory segment, e.g. `"2022-April"`.
    pub fn path_segment(&self) -> String {
        format!("{}-{}", self.year, self.month_name())
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month, self.year)
    }
}
