use anyhow::{Context, Result};
use std::path::Path;

use crate::db::Cell;
use crate::ledger::MonthData;

/// Read a sheet export: the first record is the header, the rest are rows.
/// Blank fields become empty cells.
pub(crate) fn read_sheet_csv(path: &Path) -> Result<(Vec<String>, Vec<Vec<Cell>>)> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let mut records = rdr.records();
    let header: Vec<String> = match records.next() {
        Some(first) => first
            .context("Failed to read CSV header")?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect(),
        None => anyhow::bail!("CSV file is empty"),
    };

    let mut rows = Vec::new();
    for result in records {
        let record = result.context("Failed to read CSV record")?;
        rows.push(record.iter().map(to_cell).collect());
    }
    Ok((header, rows))
}

fn to_cell(field: &str) -> Cell {
    if field.trim().is_empty() {
        Cell::Empty
    } else {
        Cell::from(field)
    }
}

/// Write the listed entries of a month. Returns how many were written.
pub(crate) fn write_month_csv(path: &Path, data: &MonthData) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    for item in &data.items {
        wtr.serialize(item).context("Failed to write CSV record")?;
    }
    wtr.flush().context("Failed to flush CSV file")?;
    Ok(data.items.len())
}

#[cfg(test)]
#[path = "csv_sheet_tests.rs"]
mod tests;
