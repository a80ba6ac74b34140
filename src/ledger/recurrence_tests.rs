#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Barrier};
use std::thread;

use super::*;
use crate::models::IntField;

const STAMP: &str = "2024-06-01T09:00:00";
const WAIT: Duration = Duration::from_secs(5);

fn p(year: i32, month: u32) -> Period {
    Period::new(year, month).unwrap()
}

fn template(id: &str, start: (i64, i64), end: Option<(i64, i64)>) -> RecurrenceTemplate {
    RecurrenceTemplate {
        id: id.into(),
        member_id: "alice".into(),
        category: "POCKET_MONEY".into(),
        amount: IntField::Value(500),
        note: "allowance".into(),
        start_year: start.0.into(),
        start_month: start.1.into(),
        end_year: end.map(|e| e.0).into(),
        end_month: end.map(|e| e.1).into(),
        created_at: String::new(),
        updated_at: String::new(),
    }
}

fn plan(templates: &[RecurrenceTemplate], period: Period) -> Vec<String> {
    plan_materialization(templates, &HashSet::new(), "alice", period, STAMP)
        .into_iter()
        .map(|e| e.id)
        .collect()
}

fn seed(db: &mut Database, templates: &[RecurrenceTemplate]) {
    db.locked(WAIT, |s| s.append_records(templates)).unwrap();
}

// ── Planning ──────────────────────────────────────────────────

#[test]
fn test_open_ended_window_boundaries() {
    let t = [template("t", (2024, 6), None)];
    assert_eq!(plan(&t, p(2024, 6)), ["rec_t_2024_6"]);
    assert_eq!(plan(&t, p(2025, 1)), ["rec_t_2025_1"]);
    assert!(plan(&t, p(2024, 5)).is_empty());
}

#[test]
fn test_closed_window_boundaries() {
    let t = [template("t", (2024, 1), Some((2024, 8)))];
    assert_eq!(plan(&t, p(2024, 8)), ["rec_t_2024_8"]);
    assert!(plan(&t, p(2024, 9)).is_empty());
}

#[test]
fn test_materialized_entry_copies_template() {
    let t = [template("t", (2024, 1), None)];
    let due = plan_materialization(&t, &HashSet::new(), "alice", p(2024, 6), STAMP);
    let entry = &due[0];
    assert_eq!(entry.member_id, "alice");
    assert_eq!((entry.year, entry.month), (2024, 6));
    assert_eq!(entry.category, "POCKET_MONEY");
    assert_eq!(entry.amount, 500);
    assert_eq!(entry.note, "allowance");
    assert_eq!(entry.date, EntryDate::empty());
    assert_eq!(entry.created_at, STAMP);
    assert_eq!(entry.updated_at, STAMP);
    assert!(entry.is_materialized());
}

#[test]
fn test_other_members_templates_ignored() {
    let mut t = template("t", (2024, 1), None);
    t.member_id = "bob".into();
    assert!(plan(&[t], p(2024, 6)).is_empty());
}

#[test]
fn test_malformed_templates_skipped() {
    let mut bad_kind = template("kind", (2024, 1), None);
    bad_kind.category = "GIFT".into();
    let mut zero = template("zero", (2024, 1), None);
    zero.amount = IntField::Value(0);
    let mut garbage = template("garbage", (2024, 1), None);
    garbage.amount = IntField::Invalid;
    let mut no_start = template("nostart", (2024, 1), None);
    no_start.start_month = IntField::Missing;
    let bad_end = template("badend", (2024, 1), Some((2024, 13)));
    let mut half_end = template("half", (2024, 1), None);
    half_end.end_year = IntField::Value(2025);
    let no_id = template("", (2024, 1), None);
    let good = template("good", (2024, 1), None);

    let ids = plan(
        &[bad_kind, zero, garbage, no_start, bad_end, half_end, no_id, good],
        p(2024, 6),
    );
    assert_eq!(ids, ["rec_good_2024_6"]);
}

#[test]
fn test_existing_and_duplicate_ids_planned_once() {
    let t = [
        template("a", (2024, 1), None),
        template("b", (2024, 1), None),
        template("b", (2024, 1), None),
    ];
    let existing: HashSet<String> = ["rec_a_2024_6".to_string()].into();
    let due = plan_materialization(&t, &existing, "alice", p(2024, 6), STAMP);
    let ids: Vec<&str> = due.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["rec_b_2024_6"]);
}

#[test]
fn test_due_entry_reports_reason() {
    let t = template("t", (2024, 6), None);
    assert_eq!(
        due_entry(&t, "alice", p(2024, 5), STAMP).unwrap_err(),
        Skip::OutOfRange
    );
    assert_eq!(
        due_entry(&t, "bob", p(2024, 6), STAMP).unwrap_err(),
        Skip::OtherMember
    );
    let mut bad = t.clone();
    bad.category = "?".into();
    assert_eq!(
        due_entry(&bad, "alice", p(2024, 6), STAMP).unwrap_err(),
        Skip::Malformed(ValidationError::InvalidCategory)
    );
}

// ── ensure ────────────────────────────────────────────────────

#[test]
fn test_ensure_is_idempotent() {
    let mut db = Database::open_in_memory().unwrap();
    seed(
        &mut db,
        &[template("a", (2024, 1), None), template("b", (2024, 6), None)],
    );

    assert_eq!(ensure(&mut db, WAIT, "alice", p(2024, 6), STAMP).unwrap(), 2);
    let once = db.sheets().records::<LedgerEntry>().unwrap();
    assert_eq!(ensure(&mut db, WAIT, "alice", p(2024, 6), STAMP).unwrap(), 0);
    let twice = db.sheets().records::<LedgerEntry>().unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_ensure_without_templates_writes_nothing() {
    let mut db = Database::open_in_memory().unwrap();
    assert_eq!(ensure(&mut db, WAIT, "alice", p(2024, 6), STAMP).unwrap(), 0);
    assert!(db.sheets().records::<LedgerEntry>().unwrap().is_empty());
}

#[test]
fn test_ensure_skips_when_lock_busy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let mut db = Database::open(&path).unwrap();
    seed(&mut db, &[template("a", (2024, 1), None)]);

    let holder = Database::open(&path).unwrap();
    holder.execute_raw("BEGIN IMMEDIATE").unwrap();
    let appended = ensure(&mut db, Duration::from_millis(50), "alice", p(2024, 6), STAMP);
    holder.execute_raw("ROLLBACK").unwrap();

    assert_eq!(appended.unwrap(), 0);
    assert!(db.sheets().records::<LedgerEntry>().unwrap().is_empty());
    // A later call fills the gap.
    assert_eq!(ensure(&mut db, WAIT, "alice", p(2024, 6), STAMP).unwrap(), 1);
}

#[test]
fn test_concurrent_ensure_persists_each_id_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let mut db = Database::open(&path).unwrap();
    seed(
        &mut db,
        &[
            template("a", (2024, 1), None),
            template("b", (2024, 1), None),
            template("c", (2024, 1), None),
        ],
    );

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut db = Database::open(&path).unwrap();
                barrier.wait();
                ensure(&mut db, WAIT, "alice", p(2024, 6), STAMP).unwrap()
            })
        })
        .collect();
    let appended: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    assert_eq!(appended, 3);
    let mut ids: Vec<String> = db
        .sheets()
        .records::<LedgerEntry>()
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    ids.sort();
    assert_eq!(ids, ["rec_a_2024_6", "rec_b_2024_6", "rec_c_2024_6"]);
}
