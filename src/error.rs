use std::time::Duration;

use thiserror::Error;

/// Input rejected before anything is written. The display text is the wire
/// code the outer layer reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing_required")]
    MissingRequired,
    #[error("missing_member")]
    MissingMember,
    #[error("missing_id")]
    MissingId,
    #[error("invalid_year")]
    InvalidYear,
    #[error("invalid_month")]
    InvalidMonth,
    #[error("invalid_amount")]
    InvalidAmount,
    #[error("invalid_type")]
    InvalidCategory,
    #[error("invalid_start_year")]
    InvalidStartYear,
    #[error("invalid_start_month")]
    InvalidStartMonth,
    #[error("invalid_end_year")]
    InvalidEndYear,
    #[error("invalid_end_month")]
    InvalidEndMonth,
    #[error("end_before_current")]
    EndBeforeCurrent,
    #[error("range_inconsistent")]
    RangeInconsistent,
    #[error("invalid_length")]
    InvalidLength,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("store lock not acquired within {0:?}")]
    LockTimeout(Duration),
    #[error("{0} not found")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),
}

impl LedgerError {
    /// Short machine-readable code for error envelopes.
    pub fn code(&self) -> String {
        match self {
            Self::Validation(v) => v.to_string(),
            Self::LockTimeout(_) => "lock_timeout".into(),
            Self::NotFound(_) => "not_found".into(),
            Self::StoreUnavailable(_) => "store_unavailable".into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
