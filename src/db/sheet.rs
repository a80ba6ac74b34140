use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection};

use crate::error::{LedgerError, Result};
use crate::models::IntField;

/// One value in a sheet row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Int(i64),
    Real(f64),
    Text(String),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// Integer reading with spreadsheet leniency: integral reals and numeric
    /// text count, blank text is missing, anything else is invalid.
    pub fn int(&self) -> IntField {
        match self {
            Self::Empty => IntField::Missing,
            Self::Int(v) => IntField::Value(*v),
            Self::Real(f) => integral(*f),
            Self::Text(s) => {
                let t = s.trim();
                if t.is_empty() {
                    IntField::Missing
                } else if let Ok(v) = t.parse::<i64>() {
                    IntField::Value(v)
                } else {
                    t.parse::<f64>().map_or(IntField::Invalid, integral)
                }
            }
        }
    }

    /// Integer or zero, for sums and period keys.
    pub fn int_or_zero(&self) -> i64 {
        self.int().value().unwrap_or(0)
    }

    pub fn text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Int(v) => v.to_string(),
            Self::Real(f) => f.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

fn integral(f: f64) -> IntField {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
        IntField::Value(f as i64)
    } else {
        IntField::Invalid
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Cell {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Cell {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<IntField> for Cell {
    fn from(v: IntField) -> Self {
        v.value().map_or(Self::Empty, Self::Int)
    }
}

impl ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Empty => ToSqlOutput::Owned(Value::Null),
            Self::Int(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            Self::Real(f) => ToSqlOutput::Owned(Value::Real(*f)),
            Self::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl FromSql for Cell {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Null | ValueRef::Blob(_) => Self::Empty,
            ValueRef::Integer(v) => Self::Int(v),
            ValueRef::Real(f) => Self::Real(f),
            ValueRef::Text(t) => Self::Text(String::from_utf8_lossy(t).into_owned()),
        })
    }
}

/// The sheets the ledger keeps, one table each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetName {
    Items,
    Recurrents,
    Transfers,
    SharedSpending,
    Settings,
}

impl SheetName {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::Recurrents => "recurrents",
            Self::Transfers => "transfers",
            Self::SharedSpending => "shared_spending",
            Self::Settings => "settings",
        }
    }

    /// Canonical column order. Also the positional fallback when a header
    /// lacks a name.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Items => &[
                "id",
                "member_id",
                "year",
                "month",
                "date",
                "category",
                "amount",
                "note",
                "created_at",
                "updated_at",
            ],
            Self::Recurrents => &[
                "id",
                "member_id",
                "category",
                "amount",
                "note",
                "start_year",
                "start_month",
                "end_year",
                "end_month",
                "created_at",
                "updated_at",
            ],
            Self::Transfers => &[
                "id",
                "member_id",
                "year",
                "month",
                "amount",
                "note",
                "created_at",
                "updated_at",
            ],
            Self::SharedSpending => &[
                "id",
                "year",
                "month",
                "amount",
                "note",
                "created_at",
                "updated_at",
            ],
            Self::Settings => &["first_name", "second_name", "updated_at"],
        }
    }

    pub fn all() -> &'static [SheetName] {
        &[
            Self::Items,
            Self::Recurrents,
            Self::Transfers,
            Self::SharedSpending,
            Self::Settings,
        ]
    }
}

impl fmt::Display for SheetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table())
    }
}

impl FromStr for SheetName {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|sheet| sheet.table() == wanted)
            .ok_or_else(|| format!("unknown sheet: {s}"))
    }
}

/// Older header spellings mapped to canonical keys.
const ALIASES: &[(&str, &str)] = &[
    ("item_type", "category"),
    ("start_y", "start_year"),
    ("state_y", "start_year"),
    ("start_m", "start_month"),
    ("end_y", "end_year"),
    ("end_m", "end_month"),
    ("husband_name", "first_name"),
    ("wife_name", "second_name"),
];

/// Where each canonical column of a sheet sits in a concrete header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndex {
    sheet: SheetName,
    positions: Vec<usize>,
}

impl ColumnIndex {
    /// Match header names case-insensitively (aliases included); keys with
    /// no matching name fall back to their canonical position.
    pub fn negotiate(sheet: SheetName, header: &[String]) -> Self {
        let names: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |key: &str| {
            names.iter().position(|n| n == key).or_else(|| {
                ALIASES
                    .iter()
                    .filter(|(_, canonical)| *canonical == key)
                    .find_map(|(alias, _)| names.iter().position(|n| n == alias))
            })
        };
        let positions = sheet
            .columns()
            .iter()
            .enumerate()
            .map(|(default_pos, key)| find(key).unwrap_or(default_pos))
            .collect();
        Self { sheet, positions }
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.sheet
            .columns()
            .iter()
            .position(|c| *c == key)
            .and_then(|i| self.positions.get(i).copied())
    }

    /// The cell for `key`, or an empty cell when the row is short.
    pub fn get<'r>(&self, cells: &'r [Cell], key: &str) -> &'r Cell {
        self.position(key)
            .and_then(|i| cells.get(i))
            .unwrap_or(&EMPTY_CELL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowRef(pub i64);

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub row_ref: RowRef,
    pub cells: Vec<Cell>,
}

/// A full scan of one sheet.
#[derive(Debug, Clone)]
pub struct Table {
    pub header: Vec<String>,
    pub index: ColumnIndex,
    pub rows: Vec<Row>,
}

/// Read access to the sheets.
pub struct Sheets<'c> {
    conn: &'c Connection,
}

impl<'c> Sheets<'c> {
    pub(crate) fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// All rows in insertion order.
    pub fn scan(&self, sheet: SheetName) -> Result<Table> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT rowid, * FROM {} ORDER BY rowid", sheet.table()))?;
        let header: Vec<String> = stmt
            .column_names()
            .iter()
            .skip(1)
            .map(|s| s.to_string())
            .collect();
        let width = header.len();
        let rows = stmt.query_map([], |row| {
            let mut cells = Vec::with_capacity(width);
            for i in 1..=width {
                cells.push(row.get::<_, Cell>(i)?);
            }
            Ok(Row {
                row_ref: RowRef(row.get(0)?),
                cells,
            })
        })?;
        let rows = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        let index = ColumnIndex::negotiate(sheet, &header);
        Ok(Table {
            header,
            index,
            rows,
        })
    }
}

/// Read-write access, handed out only while the store lock is held.
pub struct LockedSheets<'c> {
    read: Sheets<'c>,
}

impl<'c> std::ops::Deref for LockedSheets<'c> {
    type Target = Sheets<'c>;

    fn deref(&self) -> &Self::Target {
        &self.read
    }
}

impl<'c> LockedSheets<'c> {
    pub(crate) fn new(conn: &'c Connection) -> Self {
        Self {
            read: Sheets::new(conn),
        }
    }

    /// Append rows given in canonical column order.
    pub fn append(&self, sheet: SheetName, rows: &[Vec<Cell>]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let cols = sheet.columns();
        let placeholders: Vec<String> = (1..=cols.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            sheet.table(),
            cols.join(", "),
            placeholders.join(", ")
        );
        let mut stmt = self.read.conn.prepare(&sql)?;
        for row in rows {
            stmt.execute(params_from_iter(row.iter()))?;
        }
        Ok(rows.len())
    }

    /// Overwrite a row in place with cells in canonical column order.
    pub fn update(&self, sheet: SheetName, row_ref: RowRef, cells: &[Cell]) -> Result<()> {
        let cols = sheet.columns();
        let assignments: Vec<String> = cols
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{c} = ?{}", i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE rowid = ?{}",
            sheet.table(),
            assignments.join(", "),
            cols.len() + 1
        );
        let mut values: Vec<&dyn ToSql> = cells.iter().map(|c| c as &dyn ToSql).collect();
        values.push(&row_ref.0);
        let changed = self.read.conn.execute(&sql, values.as_slice())?;
        if changed == 0 {
            return Err(LedgerError::NotFound(format!("{sheet} row {}", row_ref.0)));
        }
        Ok(())
    }

    pub fn delete(&self, sheet: SheetName, row_ref: RowRef) -> Result<()> {
        let changed = self.read.conn.execute(
            &format!("DELETE FROM {} WHERE rowid = ?1", sheet.table()),
            [row_ref.0],
        )?;
        if changed == 0 {
            return Err(LedgerError::NotFound(format!("{sheet} row {}", row_ref.0)));
        }
        Ok(())
    }
}
