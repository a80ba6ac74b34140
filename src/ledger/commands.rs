use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use uuid::Uuid;

use super::reconcile::{self, SpendingView};
use super::summary::{self, MonthData};
use super::{require, Ledger};
use crate::db::{Cell, ColumnIndex, SheetName, Sheets, Stored};
use crate::error::{LedgerError, Result, ValidationError};
use crate::models::{
    end_period, ActiveWindow, Category, EntryDate, IntField, LedgerEntry, Period,
    RecurrenceTemplate, Settings, SharedSpending, Transfer,
};

/// A manual entry as submitted by a member.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NewEntry {
    pub(crate) member_id: String,
    pub(crate) period: Period,
    pub(crate) date: String,
    pub(crate) category: String,
    pub(crate) amount: IntField,
    pub(crate) note: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NewTemplate {
    pub(crate) member_id: String,
    pub(crate) category: String,
    pub(crate) amount: IntField,
    pub(crate) note: String,
    pub(crate) start_year: IntField,
    pub(crate) start_month: IntField,
    pub(crate) end_year: IntField,
    pub(crate) end_month: IntField,
}

/// New boundaries for a template. An absent start keeps the stored one; an
/// absent end makes the template open-ended.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct WindowEdit {
    pub(crate) start_year: Option<IntField>,
    pub(crate) start_month: Option<IntField>,
    pub(crate) end_year: IntField,
    pub(crate) end_month: IntField,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NewTransfer {
    pub(crate) member_id: String,
    pub(crate) period: Period,
    pub(crate) amount: IntField,
    pub(crate) note: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub(crate) struct ImportReport {
    pub(crate) appended: usize,
    pub(crate) skipped: usize,
}

fn find_by_id<T>(
    rows: Vec<Stored<T>>,
    id: &str,
    what: &str,
    key: impl Fn(&T) -> &str,
) -> Result<Stored<T>> {
    rows.into_iter()
        .find(|s| key(&s.record) == id)
        .ok_or_else(|| LedgerError::NotFound(format!("{what} {id}")))
}

fn positive(amount: IntField) -> std::result::Result<i64, ValidationError> {
    amount
        .value()
        .filter(|a| *a > 0)
        .ok_or(ValidationError::InvalidAmount)
}

impl Ledger {
    // ── Entries ──────────────────────────────────────────────

    pub(crate) fn add_entry(&mut self, new: NewEntry) -> Result<MonthData> {
        require(&new.member_id, ValidationError::MissingRequired)?;
        let amount = positive(new.amount)?;
        let kind = Category::parse(&new.category).ok_or(ValidationError::InvalidCategory)?;

        let stamp = self.stamp();
        let entry = LedgerEntry {
            id: Uuid::new_v4().to_string(),
            member_id: new.member_id.clone(),
            year: new.period.year(),
            month: new.period.month(),
            date: EntryDate::from_text(&new.date),
            category: kind.as_str().to_string(),
            amount,
            note: new.note,
            created_at: stamp.clone(),
            updated_at: stamp,
        };
        self.db
            .locked(self.timeouts.mutate, |s| s.append_records(std::slice::from_ref(&entry)))?;
        tracing::info!(
            id = %entry.id,
            member = %entry.member_id,
            period = %new.period,
            "added entry"
        );

        summary::month_data(&self.db.sheets(), &new.member_id, new.period)
    }

    /// Delete an entry by id and return what is left of its month.
    pub(crate) fn delete_entry(&mut self, id: &str) -> Result<MonthData> {
        require(id, ValidationError::MissingId)?;
        let removed = self.db.locked(self.timeouts.mutate, |s| {
            let target = find_by_id(s.load::<LedgerEntry>()?, id, "entry", |e| &e.id)?;
            s.delete(SheetName::Items, target.row_ref)?;
            Ok(target.record)
        })?;
        tracing::info!(%id, "deleted entry");

        match Period::new(removed.year, removed.month) {
            Ok(period) => summary::month_data(&self.db.sheets(), &removed.member_id, period),
            Err(_) => Ok(MonthData::default()),
        }
    }

    // ── Recurrence templates ─────────────────────────────────

    pub(crate) fn list_templates(&self, member_id: &str) -> Result<Vec<RecurrenceTemplate>> {
        require(member_id, ValidationError::MissingMember)?;
        templates_of(&self.db.sheets(), member_id)
    }

    pub(crate) fn add_template(&mut self, new: NewTemplate) -> Result<Vec<RecurrenceTemplate>> {
        let incomplete = new.member_id.trim().is_empty()
            || new.category.trim().is_empty()
            || new.amount.is_missing()
            || new.start_year.is_missing()
            || new.start_month.is_missing();
        if incomplete {
            return Err(ValidationError::MissingRequired.into());
        }

        let stamp = self.stamp();
        let mut template = RecurrenceTemplate {
            id: Uuid::new_v4().to_string(),
            member_id: new.member_id,
            category: new.category,
            amount: new.amount,
            note: new.note,
            start_year: new.start_year,
            start_month: new.start_month,
            end_year: new.end_year,
            end_month: new.end_month,
            created_at: stamp.clone(),
            updated_at: stamp,
        };
        template.category = template.kind()?.as_str().to_string();
        template.positive_amount()?;
        let window = template.window()?;
        if window.end.is_some_and(|end| end < window.start) {
            return Err(ValidationError::RangeInconsistent.into());
        }

        self.db.locked(self.timeouts.mutate, |s| {
            s.append_records(std::slice::from_ref(&template))
        })?;
        tracing::info!(id = %template.id, member = %template.member_id, "added recurring template");

        self.list_templates(&template.member_id)
    }

    /// Move a template's start and end. Category and amount never change.
    pub(crate) fn update_template_window(
        &mut self,
        id: &str,
        edit: WindowEdit,
    ) -> Result<Vec<RecurrenceTemplate>> {
        require(id, ValidationError::MissingId)?;
        let current = self.current_period();
        let stamp = self.stamp();

        let member_id = self.db.locked(self.timeouts.mutate, |s| {
            let stored = find_by_id(s.load::<RecurrenceTemplate>()?, id, "template", |t| &t.id)?;
            let mut template = stored.record;

            let start_year = edit.start_year.unwrap_or(template.start_year);
            let start_month = edit.start_month.unwrap_or(template.start_month);
            let start = Period::from_parts(
                start_year.value(),
                start_month.value(),
                ValidationError::InvalidStartYear,
                ValidationError::InvalidStartMonth,
            )?;
            let end = end_period(edit.end_year, edit.end_month)?;
            ActiveWindow { start, end }.check_edit(current)?;

            template.start_year = i64::from(start.year()).into();
            template.start_month = i64::from(start.month()).into();
            template.end_year = end.map(|p| i64::from(p.year())).into();
            template.end_month = end.map(|p| i64::from(p.month())).into();
            template.updated_at = stamp;
            s.update_record(stored.row_ref, &template)?;
            Ok(template.member_id)
        })?;
        tracing::info!(%id, "updated template window");

        templates_of(&self.db.sheets(), &member_id)
    }

    pub(crate) fn delete_template(&mut self, id: &str) -> Result<Vec<RecurrenceTemplate>> {
        require(id, ValidationError::MissingId)?;
        let member_id = self.db.locked(self.timeouts.mutate, |s| {
            let target = find_by_id(s.load::<RecurrenceTemplate>()?, id, "template", |t| &t.id)?;
            s.delete(SheetName::Recurrents, target.row_ref)?;
            Ok(target.record.member_id)
        })?;
        tracing::info!(%id, "deleted recurring template");

        templates_of(&self.db.sheets(), &member_id)
    }

    // ── Transfers ────────────────────────────────────────────

    pub(crate) fn list_transfers(&self, member_id: &str, period: Period) -> Result<Vec<Transfer>> {
        require(member_id, ValidationError::MissingMember)?;
        transfers_of(&self.db.sheets(), member_id, period)
    }

    /// Record a member's transfer for a month, replacing any earlier one.
    pub(crate) fn add_transfer(&mut self, new: NewTransfer) -> Result<Vec<Transfer>> {
        require(&new.member_id, ValidationError::MissingRequired)?;
        let amount = positive(new.amount)?;
        let stamp = self.stamp();

        self.db.locked(self.timeouts.mutate, |s| {
            let existing = s
                .load::<Transfer>()?
                .into_iter()
                .find(|t| t.record.is_slot(&new.member_id, new.period));
            match existing {
                Some(Stored { row_ref, record }) => {
                    let updated = Transfer {
                        amount,
                        note: new.note.clone(),
                        updated_at: stamp.clone(),
                        ..record
                    };
                    s.update_record(row_ref, &updated)
                }
                None => {
                    let transfer = Transfer {
                        id: Uuid::new_v4().to_string(),
                        member_id: new.member_id.clone(),
                        year: new.period.year(),
                        month: new.period.month(),
                        amount,
                        note: new.note.clone(),
                        created_at: stamp.clone(),
                        updated_at: stamp.clone(),
                    };
                    s.append_records(&[transfer]).map(|_| ())
                }
            }
        })?;
        tracing::info!(member = %new.member_id, period = %new.period, amount, "recorded transfer");

        transfers_of(&self.db.sheets(), &new.member_id, new.period)
    }

    pub(crate) fn delete_transfer(&mut self, id: &str) -> Result<Vec<Transfer>> {
        require(id, ValidationError::MissingId)?;
        let removed = self.db.locked(self.timeouts.mutate, |s| {
            let target = find_by_id(s.load::<Transfer>()?, id, "transfer", |t| &t.id)?;
            s.delete(SheetName::Transfers, target.row_ref)?;
            Ok(target.record)
        })?;
        tracing::info!(%id, "deleted transfer");

        match Period::new(removed.year, removed.month) {
            Ok(period) => transfers_of(&self.db.sheets(), &removed.member_id, period),
            Err(_) => Ok(Vec::new()),
        }
    }

    // ── Shared spending ──────────────────────────────────────

    pub(crate) fn shared_spending(&self, period: Period) -> Result<SpendingView> {
        let spending = self.db.sheets().records::<SharedSpending>()?;
        Ok(reconcile::shared_spending_for_month(&spending, period))
    }

    /// Set what the shared account spent in a month. Zero is allowed.
    pub(crate) fn set_shared_spending(
        &mut self,
        period: Period,
        amount: IntField,
        note: &str,
    ) -> Result<SpendingView> {
        let amount = amount
            .value()
            .filter(|a| *a >= 0)
            .ok_or(ValidationError::InvalidAmount)?;
        let stamp = self.stamp();

        self.db.locked(self.timeouts.mutate, |s| {
            let existing = s
                .load::<SharedSpending>()?
                .into_iter()
                .find(|r| r.record.in_period(period));
            match existing {
                Some(Stored { row_ref, record }) => {
                    let updated = SharedSpending {
                        amount,
                        note: note.to_string(),
                        updated_at: stamp.clone(),
                        ..record
                    };
                    s.update_record(row_ref, &updated)
                }
                None => {
                    let record = SharedSpending {
                        id: Uuid::new_v4().to_string(),
                        year: period.year(),
                        month: period.month(),
                        amount,
                        note: note.to_string(),
                        created_at: stamp.clone(),
                        updated_at: stamp.clone(),
                    };
                    s.append_records(&[record]).map(|_| ())
                }
            }
        })?;
        tracing::info!(%period, amount, "recorded shared spending");

        self.shared_spending(period)
    }

    pub(crate) fn spending_history(&self) -> Result<Vec<SharedSpending>> {
        let spending = self.db.sheets().records::<SharedSpending>()?;
        Ok(reconcile::spending_history(&spending))
    }

    // ── Settings ─────────────────────────────────────────────

    /// The latest settings row with blank names filled in.
    pub(crate) fn settings(&self) -> Result<Settings> {
        let latest = self.db.sheets().records::<Settings>()?.pop();
        Ok(latest.map(Settings::resolved).unwrap_or_default())
    }

    pub(crate) fn set_settings(&mut self, first: &str, second: &str) -> Result<Settings> {
        let settings = Settings::from_input(first, second, self.stamp())?;
        self.db.locked(self.timeouts.mutate, |s| {
            s.append_records(std::slice::from_ref(&settings))
        })?;
        tracing::info!("updated member names");
        Ok(settings.resolved())
    }

    // ── CSV ──────────────────────────────────────────────────

    /// Append rows from a sheet export. Rows without an id, or whose id the
    /// store already holds, are skipped. So are transfer and spending rows
    /// for a slot that already has a record.
    pub(crate) fn import_rows(
        &mut self,
        sheet: SheetName,
        header: &[String],
        rows: &[Vec<Cell>],
    ) -> Result<ImportReport> {
        let index = ColumnIndex::negotiate(sheet, header);
        let keyed = sheet.columns().contains(&"id");

        let report = self.db.locked(self.timeouts.mutate, |s| {
            let mut seen = HashSet::new();
            let mut taken = HashSet::new();
            if keyed {
                let table = s.scan(sheet)?;
                for row in &table.rows {
                    seen.insert(table.index.get(&row.cells, "id").text());
                    if let Some(slot) = slot_key(sheet, &table.index, &row.cells) {
                        taken.insert(slot);
                    }
                }
            }

            let mut batch = Vec::new();
            for row in rows {
                let cells: Vec<Cell> = sheet
                    .columns()
                    .iter()
                    .map(|key| index.get(row, key).clone())
                    .collect();
                if keyed {
                    let id = index.get(row, "id").text().trim().to_string();
                    if id.is_empty() || seen.contains(&id) {
                        continue;
                    }
                    if let Some(slot) = slot_key(sheet, &index, row) {
                        if !taken.insert(slot) {
                            continue;
                        }
                    }
                    seen.insert(id);
                }
                batch.push(cells);
            }

            let appended = s.append(sheet, &batch)?;
            Ok(ImportReport {
                appended,
                skipped: rows.len() - appended,
            })
        })?;
        tracing::info!(
            %sheet,
            appended = report.appended,
            skipped = report.skipped,
            "imported rows"
        );
        Ok(report)
    }

    pub(crate) fn import_sheet(
        &mut self,
        sheet: SheetName,
        path: &Path,
    ) -> anyhow::Result<ImportReport> {
        let (header, rows) = crate::import::read_sheet_csv(path)?;
        Ok(self.import_rows(sheet, &header, &rows)?)
    }

    /// Write a member's month, recurring entries included, to CSV.
    pub(crate) fn export_month(
        &mut self,
        member_id: &str,
        period: Period,
        path: &Path,
    ) -> anyhow::Result<usize> {
        let data = self.ensure_and_summarize(member_id, period)?;
        crate::import::write_month_csv(path, &data)
            .with_context(|| format!("Failed to export {period} to {}", path.display()))
    }
}

/// One transfer per member and month, one spending record per month.
fn slot_key(sheet: SheetName, index: &ColumnIndex, cells: &[Cell]) -> Option<(String, i64, i64)> {
    let year = index.get(cells, "year").int_or_zero();
    let month = index.get(cells, "month").int_or_zero();
    match sheet {
        SheetName::Transfers => {
            let member_id = index.get(cells, "member_id").text().trim().to_string();
            Some((member_id, year, month))
        }
        SheetName::SharedSpending => Some((String::new(), year, month)),
        SheetName::Items | SheetName::Recurrents | SheetName::Settings => None,
    }
}

fn templates_of(sheets: &Sheets<'_>, member_id: &str) -> Result<Vec<RecurrenceTemplate>> {
    Ok(sheets
        .records::<RecurrenceTemplate>()?
        .into_iter()
        .filter(|t| t.member_id == member_id)
        .collect())
}

fn transfers_of(sheets: &Sheets<'_>, member_id: &str, period: Period) -> Result<Vec<Transfer>> {
    Ok(sheets
        .records::<Transfer>()?
        .into_iter()
        .filter(|t| t.is_slot(member_id, period))
        .collect())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
