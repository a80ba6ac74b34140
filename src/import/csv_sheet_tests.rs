#![allow(clippy::unwrap_used)]

use super::*;
use crate::ledger::EntryView;
use std::io::Write;

fn make_csv_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn view(id: &str, recurring: bool) -> EntryView {
    EntryView {
        id: id.into(),
        member_id: "alice".into(),
        year: 2024,
        month: 6,
        date: "2024-06-03".into(),
        category: "INCOME".into(),
        amount: 3000,
        note: "salary, june".into(),
        recurring,
    }
}

// ── read_sheet_csv ────────────────────────────────────────────

#[test]
fn test_read_header_and_rows() {
    let file = make_csv_file("id,year,month,amount,note\nsp-1,2024,6,300,rent\nsp-2,2024,7,,\n");
    let (header, rows) = read_sheet_csv(file.path()).unwrap();
    assert_eq!(header, ["id", "year", "month", "amount", "note"]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][3], Cell::from("300"));
    assert_eq!(rows[1][3], Cell::Empty);
    assert_eq!(rows[1][4], Cell::Empty);
}

#[test]
fn test_read_strips_byte_order_mark() {
    let file = make_csv_file("\u{feff}husband_name,wife_name,updated_at\nTaro,Hana,\n");
    let (header, _) = read_sheet_csv(file.path()).unwrap();
    assert_eq!(header[0], "husband_name");
}

#[test]
fn test_read_ragged_rows() {
    let file = make_csv_file("id,member_id,year\nx\n");
    let (_, rows) = read_sheet_csv(file.path()).unwrap();
    assert_eq!(rows[0], vec![Cell::from("x")]);
}

#[test]
fn test_read_empty_file_fails() {
    let file = make_csv_file("");
    assert!(read_sheet_csv(file.path()).is_err());
}

// ── write_month_csv ───────────────────────────────────────────

#[test]
fn test_write_month() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("june.csv");
    let data = MonthData {
        items: vec![view("a", false), view("rec_t_2024_6", true)],
        summary: Default::default(),
    };
    assert_eq!(write_month_csv(&path, &data).unwrap(), 2);

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "id,member_id,year,month,date,item_type,amount,note,recurring"
    );
    assert_eq!(
        lines.next().unwrap(),
        "a,alice,2024,6,2024-06-03,INCOME,3000,\"salary, june\",false"
    );
    assert!(lines.next().unwrap().ends_with(",true"));
}

#[test]
fn test_write_empty_month() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    assert_eq!(write_month_csv(&path, &MonthData::default()).unwrap(), 0);
    assert!(path.exists());
}
