use serde::Serialize;

use crate::db::Sheets;
use crate::error::Result;
use crate::models::{Category, LedgerEntry, Period};

/// Per-category sums for one member and month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub income_total: i64,
    pub shared_from_personal_total: i64,
    pub personal_from_shared_total: i64,
    pub pocket_total: i64,
    /// What the member should move into the shared account this month.
    /// Negative when the shared account owes the member.
    pub recommended_transfer: i64,
}

impl Totals {
    fn add(&mut self, kind: Category, amount: i64) {
        match kind {
            Category::Income => self.income_total += amount,
            Category::SharedPaidFromPersonal => self.shared_from_personal_total += amount,
            Category::PersonalPaidFromShared => self.personal_from_shared_total += amount,
            Category::PocketMoney => self.pocket_total += amount,
        }
    }

    fn finish(mut self) -> Self {
        self.recommended_transfer = self.income_total - self.pocket_total
            + self.personal_from_shared_total
            - self.shared_from_personal_total;
        self
    }
}

/// A ledger entry as listed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryView {
    pub id: String,
    pub member_id: String,
    pub year: i32,
    pub month: u32,
    pub date: String,
    #[serde(rename = "item_type")]
    pub category: String,
    pub amount: i64,
    pub note: String,
    pub recurring: bool,
}

impl From<&LedgerEntry> for EntryView {
    fn from(e: &LedgerEntry) -> Self {
        Self {
            id: e.id.clone(),
            member_id: e.member_id.clone(),
            year: e.year,
            month: e.month,
            date: e.date.normalized(),
            category: e.category.clone(),
            amount: e.amount,
            note: e.note.clone(),
            recurring: e.is_materialized(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthData {
    pub items: Vec<EntryView>,
    pub summary: Totals,
}

/// List `member_id`'s entries for `period` in store order and total them by
/// category. Entries with an unknown category are listed but not counted.
pub fn summarize(entries: &[LedgerEntry], member_id: &str, period: Period) -> MonthData {
    let mut totals = Totals::default();
    let mut items = Vec::new();

    for entry in entries.iter().filter(|e| e.in_period(member_id, period)) {
        if let Some(kind) = entry.kind() {
            totals.add(kind, entry.amount);
        }
        items.push(EntryView::from(entry));
    }

    MonthData {
        items,
        summary: totals.finish(),
    }
}

/// [`summarize`] over a fresh scan of the entries sheet.
pub fn month_data(sheets: &Sheets<'_>, member_id: &str, period: Period) -> Result<MonthData> {
    let entries = sheets.records::<LedgerEntry>()?;
    Ok(summarize(&entries, member_id, period))
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod tests;
