use serde::Serialize;

use super::Period;

/// Money a member moved into the shared account for a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transfer {
    pub id: String,
    pub member_id: String,
    pub year: i32,
    pub month: u32,
    pub amount: i64,
    pub note: String,
    #[serde(skip)]
    pub created_at: String,
    #[serde(skip)]
    pub updated_at: String,
}

impl Transfer {
    pub fn in_period(&self, period: Period) -> bool {
        period.matches(self.year, self.month)
    }

    /// Upsert key: one transfer per member and month.
    pub fn is_slot(&self, member_id: &str, period: Period) -> bool {
        self.member_id == member_id && self.in_period(period)
    }
}
