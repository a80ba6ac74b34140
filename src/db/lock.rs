use std::time::Duration;

use rusqlite::{ErrorCode, TransactionBehavior};

use super::sheet::LockedSheets;
use super::Database;
use crate::error::{LedgerError, Result};

/// What to do when the store lock cannot be taken in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OnTimeout {
    /// Give up quietly; the caller gets `Ok(None)`.
    Skip,
    /// Report [`LedgerError::LockTimeout`].
    Fail,
}

impl Database {
    /// Run `f` while holding the store-wide write lock.
    ///
    /// The lock is SQLite's reserved lock taken by `BEGIN IMMEDIATE`, so it
    /// excludes writers in other processes as well as other connections in
    /// this one. `f`'s writes commit when it returns `Ok`; on `Err` or a panic
    /// the transaction is dropped, which rolls back and releases the lock.
    pub(crate) fn with_lock<T>(
        &mut self,
        timeout: Duration,
        on_timeout: OnTimeout,
        f: impl FnOnce(&LockedSheets<'_>) -> Result<T>,
    ) -> Result<Option<T>> {
        self.conn.busy_timeout(timeout)?;
        let tx = match self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
        {
            Ok(tx) => tx,
            Err(e) if is_busy(&e) => {
                return match on_timeout {
                    OnTimeout::Skip => {
                        tracing::warn!(?timeout, "store lock busy; skipping");
                        Ok(None)
                    }
                    OnTimeout::Fail => Err(LedgerError::LockTimeout(timeout)),
                };
            }
            Err(e) => return Err(e.into()),
        };

        let out = f(&LockedSheets::new(&tx))?;
        tx.commit()?;
        Ok(Some(out))
    }

    /// [`Database::with_lock`] with [`OnTimeout::Fail`].
    pub(crate) fn locked<T>(
        &mut self,
        timeout: Duration,
        f: impl FnOnce(&LockedSheets<'_>) -> Result<T>,
    ) -> Result<T> {
        self.with_lock(timeout, OnTimeout::Fail, f)?
            .ok_or(LedgerError::LockTimeout(timeout))
    }
}

fn is_busy(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if matches!(err.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}
