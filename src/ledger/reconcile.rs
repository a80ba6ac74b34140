//! Shared-account reconciliation: money transferred in against money spent.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Period, SharedSpending, Transfer};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferTotals {
    pub by_member: BTreeMap<String, i64>,
    pub total: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpendingView {
    pub amount: i64,
    pub note: String,
}

/// One month of the shared account's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalancePoint {
    pub year: i32,
    pub month: u32,
    pub transfers: i64,
    pub spending: i64,
    pub balance: i64,
}

pub fn transfers_for_month(transfers: &[Transfer], period: Period) -> TransferTotals {
    transfers
        .iter()
        .filter(|t| t.in_period(period))
        .fold(TransferTotals::default(), |mut acc, t| {
            *acc.by_member.entry(t.member_id.clone()).or_insert(0) += t.amount;
            acc.total += t.amount;
            acc
        })
}

pub fn transfer_items_for_month(transfers: &[Transfer], period: Period) -> Vec<Transfer> {
    transfers
        .iter()
        .filter(|t| t.in_period(period))
        .cloned()
        .collect()
}

/// The first spending record for `period`, or zero when there is none.
pub fn shared_spending_for_month(spending: &[SharedSpending], period: Period) -> SpendingView {
    spending
        .iter()
        .find(|s| s.in_period(period))
        .map(|s| SpendingView {
            amount: s.amount,
            note: s.note.clone(),
        })
        .unwrap_or_default()
}

pub fn shared_balance(transfers: &TransferTotals, spending: &SpendingView) -> i64 {
    transfers.total - spending.amount
}

/// Transfers and spending merged per month, oldest first. A month present on
/// only one side shows zero for the other.
pub fn balance_history(transfers: &[Transfer], spending: &[SharedSpending]) -> Vec<BalancePoint> {
    let mut months: BTreeMap<(i32, u32), (i64, i64)> = BTreeMap::new();
    for t in transfers {
        months.entry((t.year, t.month)).or_default().0 += t.amount;
    }
    for s in spending {
        months.entry((s.year, s.month)).or_default().1 += s.amount;
    }

    months
        .into_iter()
        .map(|((year, month), (transfers, spending))| BalancePoint {
            year,
            month,
            transfers,
            spending,
            balance: transfers - spending,
        })
        .collect()
}

/// Every spending record, oldest first.
pub fn spending_history(spending: &[SharedSpending]) -> Vec<SharedSpending> {
    let mut list = spending.to_vec();
    list.sort_by_key(|s| (s.year, s.month));
    list
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
