use super::sheet::{Cell, ColumnIndex, LockedSheets, RowRef, SheetName, Sheets};
use crate::error::Result;
use crate::models::{
    EntryDate, LedgerEntry, RecurrenceTemplate, Settings, SharedSpending, Transfer,
};

/// Mapping between an entity and a sheet row.
pub trait SheetRecord: Sized {
    const SHEET: SheetName;

    fn from_cells(index: &ColumnIndex, cells: &[Cell]) -> Self;

    /// Cells in the sheet's canonical column order.
    fn to_cells(&self) -> Vec<Cell>;
}

/// A record together with the row it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub row_ref: RowRef,
    pub record: T,
}

fn year_of(cell: &Cell) -> i32 {
    i32::try_from(cell.int_or_zero()).unwrap_or(0)
}

fn month_of(cell: &Cell) -> u32 {
    u32::try_from(cell.int_or_zero()).unwrap_or(0)
}

impl SheetRecord for LedgerEntry {
    const SHEET: SheetName = SheetName::Items;

    fn from_cells(idx: &ColumnIndex, cells: &[Cell]) -> Self {
        Self {
            id: idx.get(cells, "id").text(),
            member_id: idx.get(cells, "member_id").text(),
            year: year_of(idx.get(cells, "year")),
            month: month_of(idx.get(cells, "month")),
            date: EntryDate::Text(idx.get(cells, "date").text()),
            category: idx.get(cells, "category").text(),
            amount: idx.get(cells, "amount").int_or_zero(),
            note: idx.get(cells, "note").text(),
            created_at: idx.get(cells, "created_at").text(),
            updated_at: idx.get(cells, "updated_at").text(),
        }
    }

    fn to_cells(&self) -> Vec<Cell> {
        let date = match &self.date {
            EntryDate::Native(_) => self.date.normalized(),
            EntryDate::Text(raw) => raw.clone(),
        };
        vec![
            self.id.as_str().into(),
            self.member_id.as_str().into(),
            self.year.into(),
            self.month.into(),
            date.into(),
            self.category.as_str().into(),
            self.amount.into(),
            self.note.as_str().into(),
            self.created_at.as_str().into(),
            self.updated_at.as_str().into(),
        ]
    }
}

impl SheetRecord for RecurrenceTemplate {
    const SHEET: SheetName = SheetName::Recurrents;

    fn from_cells(idx: &ColumnIndex, cells: &[Cell]) -> Self {
        Self {
            id: idx.get(cells, "id").text(),
            member_id: idx.get(cells, "member_id").text(),
            category: idx.get(cells, "category").text(),
            amount: idx.get(cells, "amount").int(),
            note: idx.get(cells, "note").text(),
            start_year: idx.get(cells, "start_year").int(),
            start_month: idx.get(cells, "start_month").int(),
            end_year: idx.get(cells, "end_year").int(),
            end_month: idx.get(cells, "end_month").int(),
            created_at: idx.get(cells, "created_at").text(),
            updated_at: idx.get(cells, "updated_at").text(),
        }
    }

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            self.id.as_str().into(),
            self.member_id.as_str().into(),
            self.category.as_str().into(),
            self.amount.into(),
            self.note.as_str().into(),
            self.start_year.into(),
            self.start_month.into(),
            self.end_year.into(),
            self.end_month.into(),
            self.created_at.as_str().into(),
            self.updated_at.as_str().into(),
        ]
    }
}

impl SheetRecord for Transfer {
    const SHEET: SheetName = SheetName::Transfers;

    fn from_cells(idx: &ColumnIndex, cells: &[Cell]) -> Self {
        Self {
            id: idx.get(cells, "id").text(),
            member_id: idx.get(cells, "member_id").text(),
            year: year_of(idx.get(cells, "year")),
            month: month_of(idx.get(cells, "month")),
            amount: idx.get(cells, "amount").int_or_zero(),
            note: idx.get(cells, "note").text(),
            created_at: idx.get(cells, "created_at").text(),
            updated_at: idx.get(cells, "updated_at").text(),
        }
    }

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            self.id.as_str().into(),
            self.member_id.as_str().into(),
            self.year.into(),
            self.month.into(),
            self.amount.into(),
            self.note.as_str().into(),
            self.created_at.as_str().into(),
            self.updated_at.as_str().into(),
        ]
    }
}

impl SheetRecord for SharedSpending {
    const SHEET: SheetName = SheetName::SharedSpending;

    fn from_cells(idx: &ColumnIndex, cells: &[Cell]) -> Self {
        Self {
            id: idx.get(cells, "id").text(),
            year: year_of(idx.get(cells, "year")),
            month: month_of(idx.get(cells, "month")),
            amount: idx.get(cells, "amount").int_or_zero(),
            note: idx.get(cells, "note").text(),
            created_at: idx.get(cells, "created_at").text(),
            updated_at: idx.get(cells, "updated_at").text(),
        }
    }

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            self.id.as_str().into(),
            self.year.into(),
            self.month.into(),
            self.amount.into(),
            self.note.as_str().into(),
            self.created_at.as_str().into(),
            self.updated_at.as_str().into(),
        ]
    }
}

impl SheetRecord for Settings {
    const SHEET: SheetName = SheetName::Settings;

    fn from_cells(idx: &ColumnIndex, cells: &[Cell]) -> Self {
        Self {
            first_name: idx.get(cells, "first_name").text(),
            second_name: idx.get(cells, "second_name").text(),
            updated_at: idx.get(cells, "updated_at").text(),
        }
    }

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            self.first_name.as_str().into(),
            self.second_name.as_str().into(),
            self.updated_at.as_str().into(),
        ]
    }
}

impl Sheets<'_> {
    pub fn load<T: SheetRecord>(&self) -> Result<Vec<Stored<T>>> {
        let table = self.scan(T::SHEET)?;
        Ok(table
            .rows
            .iter()
            .map(|row| Stored {
                row_ref: row.row_ref,
                record: T::from_cells(&table.index, &row.cells),
            })
            .collect())
    }

    /// Records without their row references.
    pub fn records<T: SheetRecord>(&self) -> Result<Vec<T>> {
        Ok(self.load::<T>()?.into_iter().map(|s| s.record).collect())
    }
}

impl LockedSheets<'_> {
    pub fn append_records<T: SheetRecord>(&self, records: &[T]) -> Result<usize> {
        let rows: Vec<Vec<Cell>> = records.iter().map(SheetRecord::to_cells).collect();
        self.append(T::SHEET, &rows)
    }

    pub fn update_record<T: SheetRecord>(&self, row_ref: RowRef, record: &T) -> Result<()> {
        self.update(T::SHEET, row_ref, &record.to_cells())
    }
}
