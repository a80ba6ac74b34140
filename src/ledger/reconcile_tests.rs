#![allow(clippy::unwrap_used)]

use super::*;

fn p(year: i32, month: u32) -> Period {
    Period::new(year, month).unwrap()
}

fn transfer(member: &str, period: (i32, u32), amount: i64) -> Transfer {
    Transfer {
        id: format!("tr-{member}-{}-{}", period.0, period.1),
        member_id: member.into(),
        year: period.0,
        month: period.1,
        amount,
        note: String::new(),
        created_at: String::new(),
        updated_at: String::new(),
    }
}

fn spending(period: (i32, u32), amount: i64, note: &str) -> SharedSpending {
    SharedSpending {
        id: format!("sp-{}-{}", period.0, period.1),
        year: period.0,
        month: period.1,
        amount,
        note: note.into(),
        created_at: String::new(),
        updated_at: String::new(),
    }
}

#[test]
fn test_transfers_for_month_by_member() {
    let transfers = [
        transfer("alice", (2024, 6), 1000),
        transfer("bob", (2024, 6), 700),
        transfer("alice", (2024, 7), 5000),
    ];
    let totals = transfers_for_month(&transfers, p(2024, 6));
    assert_eq!(totals.total, 1700);
    assert_eq!(totals.by_member["alice"], 1000);
    assert_eq!(totals.by_member["bob"], 700);
    assert_eq!(transfer_items_for_month(&transfers, p(2024, 6)).len(), 2);
}

#[test]
fn test_transfers_for_empty_month() {
    let totals = transfers_for_month(&[], p(2024, 6));
    assert_eq!(totals, TransferTotals::default());
    let json = serde_json::to_value(&totals).unwrap();
    assert_eq!(json, serde_json::json!({"by_member": {}, "total": 0}));
}

#[test]
fn test_shared_spending_first_match_or_zero() {
    let records = [spending((2024, 6), 300, "rent"), spending((2024, 6), 999, "dup")];
    assert_eq!(
        shared_spending_for_month(&records, p(2024, 6)),
        SpendingView {
            amount: 300,
            note: "rent".into()
        }
    );
    assert_eq!(
        shared_spending_for_month(&records, p(2024, 7)),
        SpendingView::default()
    );
}

#[test]
fn test_shared_balance() {
    let totals = transfers_for_month(&[transfer("alice", (2024, 6), 1000)], p(2024, 6));
    let spent = shared_spending_for_month(&[spending((2024, 6), 1200, "")], p(2024, 6));
    assert_eq!(shared_balance(&totals, &spent), -200);
}

#[test]
fn test_balance_history_merges_sides() {
    let transfers = [transfer("alice", (2024, 5), 1000)];
    let spent = [spending((2024, 6), 300, "")];
    let history = balance_history(&transfers, &spent);
    assert_eq!(
        history,
        [
            BalancePoint {
                year: 2024,
                month: 5,
                transfers: 1000,
                spending: 0,
                balance: 1000,
            },
            BalancePoint {
                year: 2024,
                month: 6,
                transfers: 0,
                spending: 300,
                balance: -300,
            },
        ]
    );
}

#[test]
fn test_balance_history_sorted_across_years() {
    let transfers = [
        transfer("alice", (2025, 1), 10),
        transfer("bob", (2024, 12), 20),
        transfer("alice", (2024, 12), 30),
    ];
    let history = balance_history(&transfers, &[spending((2024, 2), 5, "")]);
    let keys: Vec<(i32, u32)> = history.iter().map(|b| (b.year, b.month)).collect();
    assert_eq!(keys, [(2024, 2), (2024, 12), (2025, 1)]);
    assert_eq!(history[1].transfers, 50);
}

#[test]
fn test_spending_history_sorted() {
    let records = [
        spending((2024, 3), 1, ""),
        spending((2023, 11), 2, ""),
        spending((2024, 1), 3, ""),
    ];
    let amounts: Vec<i64> = spending_history(&records).iter().map(|s| s.amount).collect();
    assert_eq!(amounts, [2, 3, 1]);
}
