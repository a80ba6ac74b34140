mod commands;
mod recurrence;
mod reconcile;
mod summary;

use chrono::{FixedOffset, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::config::Config;
use crate::db::Database;
use crate::error::{Result, ValidationError};
use crate::models::{Period, SharedSpending, Transfer};

pub(crate) use commands::{NewEntry, NewTemplate, NewTransfer, WindowEdit};
use reconcile::{BalancePoint, TransferTotals};
#[cfg(test)]
pub(crate) use summary::EntryView;
pub(crate) use summary::MonthData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LockTimeouts {
    /// Recurrence expansion; gives up quietly.
    pub(crate) expand: Duration,
    /// User mutations; report `lock_timeout`.
    pub(crate) mutate: Duration,
}

/// Month summary together with the shared account's state for that month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Overview {
    #[serde(flatten)]
    pub(crate) month: MonthData,
    pub(crate) transfers: TransferTotals,
    pub(crate) transfer_items: Vec<Transfer>,
    pub(crate) shared_spending: i64,
    pub(crate) shared_balance: i64,
}

/// Queries and commands over one store.
pub(crate) struct Ledger {
    db: Database,
    timeouts: LockTimeouts,
    utc_offset: FixedOffset,
}

impl Ledger {
    pub(crate) fn new(db: Database, timeouts: LockTimeouts, utc_offset: FixedOffset) -> Self {
        Self {
            db,
            timeouts,
            utc_offset,
        }
    }

    pub(crate) fn from_config(db: Database, config: &Config) -> anyhow::Result<Self> {
        let timeouts = LockTimeouts {
            expand: config.expand_timeout(),
            mutate: config.mutation_timeout(),
        };
        Ok(Self::new(db, timeouts, config.utc_offset()?))
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> anyhow::Result<Self> {
        let timeouts = LockTimeouts {
            expand: Duration::from_millis(500),
            mutate: Duration::from_millis(500),
        };
        let offset = FixedOffset::east_opt(9 * 3600)
            .ok_or_else(|| anyhow::anyhow!("bad offset"))?;
        Ok(Self::new(Database::open_in_memory()?, timeouts, offset))
    }

    /// Wall-clock timestamp for `created_at`/`updated_at`.
    fn stamp(&self) -> String {
        Utc::now()
            .with_timezone(&self.utc_offset)
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string()
    }

    fn current_period(&self) -> Period {
        Period::current(self.utc_offset)
    }

    /// Materialize due recurring entries, then summarize the month.
    pub(crate) fn ensure_and_summarize(
        &mut self,
        member_id: &str,
        period: Period,
    ) -> Result<MonthData> {
        require(member_id, ValidationError::MissingMember)?;
        let stamp = self.stamp();
        recurrence::ensure(&mut self.db, self.timeouts.expand, member_id, period, &stamp)?;
        summary::month_data(&self.db.sheets(), member_id, period)
    }

    pub(crate) fn overview(&mut self, member_id: &str, period: Period) -> Result<Overview> {
        let month = self.ensure_and_summarize(member_id, period)?;
        let sheets = self.db.sheets();
        let transfer_rows = sheets.records::<Transfer>()?;
        let spending_rows = sheets.records::<SharedSpending>()?;

        let transfers = reconcile::transfers_for_month(&transfer_rows, period);
        let spending = reconcile::shared_spending_for_month(&spending_rows, period);
        let shared_balance = reconcile::shared_balance(&transfers, &spending);
        Ok(Overview {
            month,
            transfer_items: reconcile::transfer_items_for_month(&transfer_rows, period),
            transfers,
            shared_spending: spending.amount,
            shared_balance,
        })
    }

    pub(crate) fn transfers_for_month(&self, period: Period) -> Result<TransferTotals> {
        let transfers = self.db.sheets().records::<Transfer>()?;
        Ok(reconcile::transfers_for_month(&transfers, period))
    }

    pub(crate) fn balance_history(&self) -> Result<Vec<BalancePoint>> {
        let sheets = self.db.sheets();
        let transfers = sheets.records::<Transfer>()?;
        let spending = sheets.records::<SharedSpending>()?;
        Ok(reconcile::balance_history(&transfers, &spending))
    }
}

fn require(value: &str, missing: ValidationError) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(missing)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests;
