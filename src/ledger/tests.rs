#![allow(clippy::unwrap_used)]

use super::*;
use crate::error::LedgerError;
use crate::models::{IntField, RecurrenceTemplate};

fn p(year: i32, month: u32) -> Period {
    Period::new(year, month).unwrap()
}

fn salary_template(ledger: &mut Ledger) {
    ledger
        .add_template(NewTemplate {
            member_id: "alice".into(),
            category: "INCOME".into(),
            amount: IntField::Value(3000),
            note: "salary".into(),
            start_year: IntField::Value(2024),
            start_month: IntField::Value(1),
            end_year: IntField::Missing,
            end_month: IntField::Missing,
        })
        .unwrap();
}

fn transfer(ledger: &mut Ledger, member: &str, period: Period, amount: i64) {
    ledger
        .add_transfer(NewTransfer {
            member_id: member.into(),
            period,
            amount: IntField::Value(amount),
            note: String::new(),
        })
        .unwrap();
}

#[test]
fn test_summarize_materializes_recurring_entries() {
    let mut ledger = Ledger::open_in_memory().unwrap();
    salary_template(&mut ledger);

    let data = ledger.ensure_and_summarize("alice", p(2024, 6)).unwrap();
    assert_eq!(data.items.len(), 1);
    assert!(data.items[0].recurring);
    assert_eq!(data.summary.income_total, 3000);

    let again = ledger.ensure_and_summarize("alice", p(2024, 6)).unwrap();
    assert_eq!(again, data);

    let before_start = ledger.ensure_and_summarize("alice", p(2023, 12)).unwrap();
    assert!(before_start.items.is_empty());
}

#[test]
fn test_summarize_requires_member() {
    let mut ledger = Ledger::open_in_memory().unwrap();
    let err = ledger.ensure_and_summarize(" ", p(2024, 6)).unwrap_err();
    assert_eq!(err.code(), "missing_member");
}

#[test]
fn test_template_is_skipped_after_store_edit() {
    let mut ledger = Ledger::open_in_memory().unwrap();
    let broken = RecurrenceTemplate {
        id: "t".into(),
        member_id: "alice".into(),
        category: "INCOME".into(),
        amount: IntField::Invalid,
        note: String::new(),
        start_year: IntField::Value(2024),
        start_month: IntField::Value(1),
        end_year: IntField::Missing,
        end_month: IntField::Missing,
        created_at: String::new(),
        updated_at: String::new(),
    };
    ledger
        .db
        .locked(Duration::from_secs(1), |s| s.append_records(&[broken]))
        .unwrap();

    let data = ledger.ensure_and_summarize("alice", p(2024, 6)).unwrap();
    assert!(data.items.is_empty());
}

#[test]
fn test_overview_combines_month_and_shared_account() {
    let mut ledger = Ledger::open_in_memory().unwrap();
    salary_template(&mut ledger);
    transfer(&mut ledger, "alice", p(2024, 6), 1000);
    transfer(&mut ledger, "bob", p(2024, 6), 500);
    ledger
        .set_shared_spending(p(2024, 6), IntField::Value(1200), "groceries")
        .unwrap();

    let overview = ledger.overview("alice", p(2024, 6)).unwrap();
    assert_eq!(overview.month.summary.recommended_transfer, 3000);
    assert_eq!(overview.transfers.total, 1500);
    assert_eq!(overview.transfer_items.len(), 2);
    assert_eq!(overview.shared_spending, 1200);
    assert_eq!(overview.shared_balance, 300);

    let json = serde_json::to_value(&overview).unwrap();
    assert_eq!(json["summary"]["income_total"], 3000);
    assert_eq!(json["items"][0]["item_type"], "INCOME");
    assert_eq!(json["transfers"]["by_member"]["bob"], 500);
    assert_eq!(json["transfer_items"][0]["member_id"], "alice");
    assert_eq!(json["shared_balance"], 300);
}

#[test]
fn test_transfers_for_month_reflects_upsert() {
    let mut ledger = Ledger::open_in_memory().unwrap();
    transfer(&mut ledger, "alice", p(2024, 6), 1000);
    transfer(&mut ledger, "alice", p(2024, 6), 1500);

    let totals = ledger.transfers_for_month(p(2024, 6)).unwrap();
    assert_eq!(totals.total, 1500);
    assert_eq!(totals.by_member.len(), 1);
}

#[test]
fn test_balance_history_from_store() {
    let mut ledger = Ledger::open_in_memory().unwrap();
    transfer(&mut ledger, "alice", p(2024, 5), 1000);
    ledger
        .set_shared_spending(p(2024, 6), IntField::Value(300), "")
        .unwrap();

    let history = ledger.balance_history().unwrap();
    let balances: Vec<(u32, i64, i64, i64)> = history
        .iter()
        .map(|b| (b.month, b.transfers, b.spending, b.balance))
        .collect();
    assert_eq!(balances, [(5, 1000, 0, 1000), (6, 0, 300, -300)]);
}

#[test]
fn test_mutation_reports_lock_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let timeouts = LockTimeouts {
        expand: Duration::from_millis(50),
        mutate: Duration::from_millis(50),
    };
    let offset = FixedOffset::east_opt(0).unwrap();
    let mut ledger = Ledger::new(Database::open(&path).unwrap(), timeouts, offset);
    salary_template(&mut ledger);

    let holder = Database::open(&path).unwrap();
    holder.execute_raw("BEGIN IMMEDIATE").unwrap();

    let err = ledger
        .add_transfer(NewTransfer {
            member_id: "alice".into(),
            period: p(2024, 6),
            amount: IntField::Value(100),
            note: String::new(),
        })
        .unwrap_err();
    assert!(matches!(err, LedgerError::LockTimeout(_)));
    assert_eq!(err.code(), "lock_timeout");

    // Expansion gives up quietly; reads still work.
    let data = ledger.ensure_and_summarize("alice", p(2024, 6)).unwrap();
    assert!(data.items.is_empty());

    holder.execute_raw("ROLLBACK").unwrap();
    let data = ledger.ensure_and_summarize("alice", p(2024, 6)).unwrap();
    assert_eq!(data.items.len(), 1);
}
