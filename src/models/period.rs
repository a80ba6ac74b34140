use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, FixedOffset, Utc};
use serde::Serialize;

use crate::error::ValidationError;

/// A calendar month. Always holds a month in 1..=12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::InvalidMonth);
        }
        Ok(Self { year, month })
    }

    /// Build from raw cell integers, mapping failures onto the given errors.
    pub fn from_parts(
        year: Option<i64>,
        month: Option<i64>,
        bad_year: ValidationError,
        bad_month: ValidationError,
    ) -> Result<Self, ValidationError> {
        let year = year
            .and_then(|y| i32::try_from(y).ok())
            .ok_or(bad_year)?;
        let month = month
            .and_then(|m| u32::try_from(m).ok())
            .filter(|m| (1..=12).contains(m))
            .ok_or(bad_month)?;
        Ok(Self { year, month })
    }

    /// The current month in the given UTC offset.
    pub fn current(offset: FixedOffset) -> Self {
        let now = Utc::now().with_timezone(&offset);
        Self {
            year: now.year(),
            month: now.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// `year * 12 + month`; consecutive months differ by one.
    pub fn index(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month)
    }

    /// Whether a stored row's raw year/month refer to this period.
    pub fn matches(&self, year: i32, month: u32) -> bool {
        self.year == year && self.month == month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Parses `YYYY-MM` (also `YYYY/MM`).
impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (y, m) = s
            .trim()
            .split_once(['-', '/'])
            .ok_or(ValidationError::InvalidMonth)?;
        let year: i32 = y.parse().map_err(|_| ValidationError::InvalidYear)?;
        let month: u32 = m.parse().map_err(|_| ValidationError::InvalidMonth)?;
        Self::new(year, month)
    }
}
