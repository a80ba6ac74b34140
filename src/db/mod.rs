mod lock;
mod records;
mod schema;
mod sheet;

use anyhow::Context;
use rusqlite::{params, Connection, TransactionBehavior};
use std::path::Path;

pub(crate) use lock::OnTimeout;
pub(crate) use records::Stored;
#[cfg(test)]
use sheet::RowRef;
pub(crate) use sheet::{Cell, ColumnIndex, SheetName, Sheets};

/// The tabular store: one SQLite file shared by every process that opens it.
pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Raw SQL on the underlying connection, for tests that play a second writer.
    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> rusqlite::Result<()> {
        self.conn.execute_batch(sql)
    }

    fn migrate(&mut self) -> rusqlite::Result<()> {
        // Immediate, so two processes opening a fresh file don't both seed it.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let has_version_table: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            // Fresh database - apply full schema
            tx.execute_batch(schema::SCHEMA_V1)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return tx.commit();
        }

        let current: i32 = tx
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                tx.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            tx.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        tx.commit()
    }

    /// Lock-free read view. Reads may interleave with another process's write.
    pub(crate) fn sheets(&self) -> Sheets<'_> {
        Sheets::new(&self.conn)
    }
}
