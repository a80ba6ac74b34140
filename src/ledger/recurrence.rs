//! Turning recurrence templates into concrete monthly entries.
//!
//! An entry produced from a template is identified by
//! [`materialized_id`]`(template, period)`, so its identity depends only on
//! where it came from. Expansion checks that id against the store before
//! appending, which makes repeated runs for the same month no-ops.

use std::collections::HashSet;
use std::time::Duration;

use crate::db::{Database, OnTimeout};
use crate::error::{Result, ValidationError};
use crate::models::{materialized_id, EntryDate, LedgerEntry, Period, RecurrenceTemplate};

/// Why a template produces nothing for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Skip {
    OtherMember,
    Malformed(ValidationError),
    MissingId,
    OutOfRange,
    AlreadyPresent,
}

/// Decide what a single template contributes to `period`.
pub(crate) fn due_entry(
    template: &RecurrenceTemplate,
    member_id: &str,
    period: Period,
    stamp: &str,
) -> std::result::Result<LedgerEntry, Skip> {
    if template.member_id.is_empty() || template.member_id != member_id {
        return Err(Skip::OtherMember);
    }
    let kind = template.kind().map_err(Skip::Malformed)?;
    let amount = template.positive_amount().map_err(Skip::Malformed)?;
    let window = template.window().map_err(Skip::Malformed)?;
    if template.id.trim().is_empty() {
        return Err(Skip::MissingId);
    }
    if !window.contains(period) {
        return Err(Skip::OutOfRange);
    }

    Ok(LedgerEntry {
        id: materialized_id(&template.id, period),
        member_id: member_id.to_string(),
        year: period.year(),
        month: period.month(),
        date: EntryDate::empty(),
        category: kind.as_str().to_string(),
        amount,
        note: template.note.clone(),
        created_at: stamp.to_string(),
        updated_at: stamp.to_string(),
    })
}

/// Entries that `member_id`'s templates owe `period` and that are not in
/// `existing_ids` yet.
pub(crate) fn plan_materialization(
    templates: &[RecurrenceTemplate],
    existing_ids: &HashSet<String>,
    member_id: &str,
    period: Period,
    stamp: &str,
) -> Vec<LedgerEntry> {
    let mut planned: HashSet<String> = HashSet::new();
    let mut due = Vec::new();

    for template in templates {
        let outcome = due_entry(template, member_id, period, stamp).and_then(|entry| {
            if existing_ids.contains(&entry.id) || planned.contains(&entry.id) {
                Err(Skip::AlreadyPresent)
            } else {
                Ok(entry)
            }
        });
        match outcome {
            Ok(entry) => {
                planned.insert(entry.id.clone());
                due.push(entry);
            }
            Err(Skip::Malformed(reason)) => {
                tracing::debug!(template = %template.id, %reason, "skipping malformed template");
            }
            Err(Skip::MissingId) => {
                tracing::debug!(member = %member_id, "skipping template without id");
            }
            Err(_) => {}
        }
    }
    due
}

/// Make sure every template of `member_id` active in `period` has its entry.
///
/// Best effort: when the store lock is not free within `timeout` nothing is
/// written and `Ok(0)` is returned; a later call fills the gap.
pub(crate) fn ensure(
    db: &mut Database,
    timeout: Duration,
    member_id: &str,
    period: Period,
    stamp: &str,
) -> Result<usize> {
    let appended = db.with_lock(timeout, OnTimeout::Skip, |sheets| {
        let templates = sheets.records::<RecurrenceTemplate>()?;
        if templates.is_empty() {
            return Ok(0);
        }
        let existing: HashSet<String> = sheets
            .records::<LedgerEntry>()?
            .into_iter()
            .map(|e| e.id)
            .collect();
        let due = plan_materialization(&templates, &existing, member_id, period, stamp);
        sheets.append_records(&due)
    })?;

    let appended = appended.unwrap_or(0);
    if appended > 0 {
        tracing::info!(member = %member_id, %period, appended, "materialized recurring entries");
    }
    Ok(appended)
}

#[cfg(test)]
#[path = "recurrence_tests.rs"]
mod tests;
