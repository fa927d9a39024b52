use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

const MAX_YEAR: i32 = 9999;

/// Compact calendar date encoding (`YYYYMMDD`) used by the `date` column,
/// the filter state and the time-range slider.
///
/// Dates are local calendar days only: no time zone, no leap seconds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqlDate(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("{0:08} is not a valid YYYYMMDD calendar date")]
    Malformed(u32),
    #[error("date is outside the supported range (years 0 through 9999)")]
    OutOfRange,
}

impl SqlDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        if !(0..=MAX_YEAR).contains(&year) {
            return Err(DateError::OutOfRange);
        }
        let raw = year as u32 * 10_000 + month.min(99) * 100 + day.min(99);
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(DateError::Malformed(raw))?;
        Self::from_date(date)
    }

    pub fn from_date(date: NaiveDate) -> Result<Self, DateError> {
        let year = date.year();
        if !(0..=MAX_YEAR).contains(&year) {
            return Err(DateError::OutOfRange);
        }
        Ok(Self(year as u32 * 10_000 + date.month() * 100 + date.day()))
    }

    pub fn to_date(self) -> Result<NaiveDate, DateError> {
        let year = (self.0 / 10_000) as i32;
        let month = (self.0 / 100) % 100;
        let day = self.0 % 100;
        NaiveDate::from_ymd_opt(year, month, day).ok_or(DateError::Malformed(self.0))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Zero-based day offset of `self` from `epoch` (negative before it).
    pub fn day_index(self, epoch: SqlDate) -> Result<i64, DateError> {
        let date = self.to_date()?;
        let epoch = epoch.to_date()?;
        Ok(date.signed_duration_since(epoch).num_days())
    }

    /// Inverse of [`SqlDate::day_index`].
    pub fn from_day_index(index: i64, epoch: SqlDate) -> Result<Self, DateError> {
        let epoch = epoch.to_date()?;
        let days = Days::new(index.unsigned_abs());
        let date = if index >= 0 {
            epoch.checked_add_days(days)
        } else {
            epoch.checked_sub_days(days)
        };
        Self::from_date(date.ok_or(DateError::OutOfRange)?)
    }
}

impl fmt::Display for SqlDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}", self.0)
    }
}

impl FromStr for SqlDate {
    type Err = DateError;

    /// Accepts either the compact form (`20250131`) or ISO (`2025-01-31`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Self::from_date(date);
        }
        let raw: u32 = s.parse().map_err(|_| DateError::Malformed(0))?;
        let date = SqlDate(raw);
        date.to_date()?;
        Ok(date)
    }
}

/// Inclusive date range over compact dates.
///
/// `start <= end` is expected but not enforced: a reversed range compiles to
/// a predicate no row satisfies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: SqlDate,
    pub end: SqlDate,
}

impl TimeRange {
    pub fn new(start: SqlDate, end: SqlDate) -> Self {
        Self { start, end }
    }

    pub fn is_reversed(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, date: SqlDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// True when `self` lies entirely inside `outer`.
    pub fn within(&self, outer: &TimeRange) -> bool {
        self.start >= outer.start && self.end <= outer.end
    }
}
