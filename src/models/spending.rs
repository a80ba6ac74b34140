use serde::Serialize;

use super::Period;

/// What the shared account paid out in a month. Zero is a valid amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedSpending {
    pub id: String,
    pub year: i32,
    pub month: u32,
    pub amount: i64,
    pub note: String,
    #[serde(skip)]
    pub created_at: String,
    #[serde(skip)]
    pub updated_at: String,
}

impl SharedSpending {
    pub fn in_period(&self, period: Period) -> bool {
        period.matches(self.year, self.month)
    }
}
