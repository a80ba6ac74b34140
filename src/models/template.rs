use serde::{Serialize, Serializer};

use super::{Category, Period};
use crate::error::ValidationError;

/// An integer column as read from a sheet, keeping "blank" apart from "garbage".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntField {
    #[default]
    Missing,
    Value(i64),
    Invalid,
}

impl IntField {
    pub fn value(self) -> Option<i64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Missing | Self::Invalid => None,
        }
    }

    pub fn is_missing(self) -> bool {
        self == Self::Missing
    }
}

impl From<i64> for IntField {
    fn from(v: i64) -> Self {
        Self::Value(v)
    }
}

impl From<Option<i64>> for IntField {
    fn from(v: Option<i64>) -> Self {
        v.map_or(Self::Missing, Self::Value)
    }
}

impl Serialize for IntField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

/// Inclusive month range a template applies to. No end means open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWindow {
    pub start: Period,
    pub end: Option<Period>,
}

impl ActiveWindow {
    pub fn contains(&self, target: Period) -> bool {
        let t = target.index();
        let end = self.end.map_or(i64::MAX, |e| e.index());
        self.start.index() <= t && t <= end
    }

    /// Rules for a user edit: the end may not lie in the past, nor before the start.
    pub fn check_edit(&self, current: Period) -> Result<(), ValidationError> {
        if let Some(end) = self.end {
            if end.index() < current.index() {
                return Err(ValidationError::EndBeforeCurrent);
            }
            if end.index() < self.start.index() {
                return Err(ValidationError::RangeInconsistent);
            }
        }
        Ok(())
    }
}

/// A rule producing one entry per month of its window. Rows are kept as
/// stored; use [`RecurrenceTemplate::window`] and friends to validate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurrenceTemplate {
    pub id: String,
    pub member_id: String,
    #[serde(rename = "item_type")]
    pub category: String,
    pub amount: IntField,
    pub note: String,
    #[serde(rename = "start_y")]
    pub start_year: IntField,
    #[serde(rename = "start_m")]
    pub start_month: IntField,
    #[serde(rename = "end_y")]
    pub end_year: IntField,
    #[serde(rename = "end_m")]
    pub end_month: IntField,
    #[serde(skip)]
    pub created_at: String,
    #[serde(skip)]
    pub updated_at: String,
}

impl RecurrenceTemplate {
    pub fn kind(&self) -> Result<Category, ValidationError> {
        Category::parse(&self.category).ok_or(ValidationError::InvalidCategory)
    }

    pub fn positive_amount(&self) -> Result<i64, ValidationError> {
        self.amount
            .value()
            .filter(|a| *a > 0)
            .ok_or(ValidationError::InvalidAmount)
    }

    pub fn window(&self) -> Result<ActiveWindow, ValidationError> {
        let start = Period::from_parts(
            self.start_year.value(),
            self.start_month.value(),
            ValidationError::InvalidStartYear,
            ValidationError::InvalidStartMonth,
        )?;
        let end = end_period(self.end_year, self.end_month)?;
        Ok(ActiveWindow { start, end })
    }
}

/// Both-or-neither end boundary.
pub fn end_period(year: IntField, month: IntField) -> Result<Option<Period>, ValidationError> {
    if year == IntField::Invalid {
        return Err(ValidationError::InvalidEndYear);
    }
    if month == IntField::Invalid {
        return Err(ValidationError::InvalidEndMonth);
    }
    match (year.is_missing(), month.is_missing()) {
        (true, true) => Ok(None),
        (false, true) => Err(ValidationError::InvalidEndMonth),
        (true, false) => Err(ValidationError::InvalidEndYear),
        (false, false) => Period::from_parts(
            year.value(),
            month.value(),
            ValidationError::InvalidEndYear,
            ValidationError::InvalidEndMonth,
        )
        .map(Some),
    }
}
