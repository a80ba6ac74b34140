pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS items (
    id          TEXT NOT NULL,
    member_id   TEXT DEFAULT '',
    year        INTEGER,
    month       INTEGER,
    date        TEXT DEFAULT '',
    category    TEXT DEFAULT '',
    amount      INTEGER,
    note        TEXT DEFAULT '',
    created_at  TEXT DEFAULT '',
    updated_at  TEXT DEFAULT ''
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_items_id ON items(id);
CREATE INDEX IF NOT EXISTS idx_items_member_period ON items(member_id, year, month);

CREATE TABLE IF NOT EXISTS recurrents (
    id           TEXT NOT NULL,
    member_id    TEXT DEFAULT '',
    category     TEXT DEFAULT '',
    amount       INTEGER,
    note         TEXT DEFAULT '',
    start_year   INTEGER,
    start_month  INTEGER,
    end_year     INTEGER,
    end_month    INTEGER,
    created_at   TEXT DEFAULT '',
    updated_at   TEXT DEFAULT ''
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_recurrents_id ON recurrents(id);

CREATE TABLE IF NOT EXISTS transfers (
    id          TEXT NOT NULL,
    member_id   TEXT DEFAULT '',
    year        INTEGER,
    month       INTEGER,
    amount      INTEGER,
    note        TEXT DEFAULT '',
    created_at  TEXT DEFAULT '',
    updated_at  TEXT DEFAULT ''
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_transfers_id ON transfers(id);

CREATE TABLE IF NOT EXISTS shared_spending (
    id          TEXT NOT NULL,
    year        INTEGER,
    month       INTEGER,
    amount      INTEGER,
    note        TEXT DEFAULT '',
    created_at  TEXT DEFAULT '',
    updated_at  TEXT DEFAULT ''
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_shared_spending_id ON shared_spending(id);

CREATE TABLE IF NOT EXISTS settings (
    first_name   TEXT DEFAULT '',
    second_name  TEXT DEFAULT '',
    updated_at   TEXT DEFAULT ''
);
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[
    // Future migrations go here:
    // (1, "ALTER TABLE items ADD COLUMN receipt TEXT DEFAULT '';"),
];
