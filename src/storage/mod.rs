//! SQLite persistence.
//!
//! One [`Store`] owns one connection for the lifetime of a command. The
//! schema is created on open; each submodule adds the queries for one table.

mod dates;
mod fixed;
mod habits;
mod reflections;
mod rewards;
mod summaries;
mod tasks;
mod timeline;
mod users;

use std::fs;
use std::path::Path;

use chrono::Weekday;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{Connection, ToSql};

use crate::error::{ParseValueError, Result};
use crate::models::{DateKind, EntrySource, EntryStatus, Priority, SummaryKind, TaskStatus};
use crate::recurrence::Recurrence;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    username          TEXT NOT NULL UNIQUE,
    email             TEXT NOT NULL UNIQUE,
    password_hash     TEXT NOT NULL,
    day_start         TEXT NOT NULL,
    day_end           TEXT NOT NULL,
    max_daily_minutes INTEGER NOT NULL,
    created_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id           INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title             TEXT NOT NULL,
    description       TEXT,
    estimated_minutes INTEGER NOT NULL,
    deadline          TEXT,
    priority          TEXT NOT NULL,
    category          TEXT NOT NULL,
    is_meeting        INTEGER NOT NULL DEFAULT 0,
    location          TEXT,
    recurrence        TEXT NOT NULL DEFAULT 'none',
    recurrence_until  TEXT,
    next_task_id      INTEGER REFERENCES tasks(id) ON DELETE SET NULL,
    status            TEXT NOT NULL DEFAULT 'pending',
    completed_at      TEXT,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks(user_id, status);

CREATE TABLE IF NOT EXISTS timeline_entries (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    date        TEXT NOT NULL,
    start_time  TEXT NOT NULL,
    end_time    TEXT NOT NULL,
    task_id     INTEGER REFERENCES tasks(id) ON DELETE SET NULL,
    title       TEXT NOT NULL,
    category    TEXT,
    location    TEXT,
    is_break    INTEGER NOT NULL DEFAULT 0,
    is_meeting  INTEGER NOT NULL DEFAULT 0,
    source      TEXT NOT NULL,
    reasoning   TEXT,
    status      TEXT NOT NULL DEFAULT 'planned',
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_entries_user_date ON timeline_entries(user_id, date);
CREATE INDEX IF NOT EXISTS idx_entries_task ON timeline_entries(task_id);

CREATE TABLE IF NOT EXISTS feedback (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_id       INTEGER NOT NULL UNIQUE REFERENCES timeline_entries(id) ON DELETE CASCADE,
    status         TEXT NOT NULL,
    actual_minutes INTEGER,
    notes          TEXT,
    recorded_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS summaries (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id           INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    kind              TEXT NOT NULL,
    start_date        TEXT NOT NULL,
    end_date          TEXT NOT NULL,
    total_entries     INTEGER NOT NULL,
    completed_entries INTEGER NOT NULL,
    completion_rate   REAL NOT NULL,
    total_minutes     INTEGER NOT NULL,
    category_minutes  TEXT NOT NULL,
    trend             TEXT NOT NULL,
    narrative         TEXT,
    suggestions       TEXT,
    notes             TEXT,
    created_at        TEXT NOT NULL,
    UNIQUE (user_id, kind, start_date, end_date)
);

CREATE TABLE IF NOT EXISTS reward_rules (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id             INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title               TEXT NOT NULL,
    description         TEXT,
    category            TEXT NOT NULL,
    target_minutes      INTEGER NOT NULL,
    accumulated_minutes INTEGER NOT NULL DEFAULT 0,
    achieved            INTEGER NOT NULL DEFAULT 0,
    achieved_at         TEXT,
    redeemed            INTEGER NOT NULL DEFAULT 0,
    redeemed_at         TEXT,
    created_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS fixed_commitments (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title       TEXT NOT NULL,
    description TEXT,
    category    TEXT NOT NULL,
    location    TEXT,
    weekday     INTEGER NOT NULL,
    start_time  TEXT NOT NULL,
    end_time    TEXT NOT NULL,
    start_date  TEXT NOT NULL,
    end_date    TEXT,
    active      INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS important_dates (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id            INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title              TEXT NOT NULL,
    description        TEXT,
    kind               TEXT NOT NULL,
    date               TEXT NOT NULL,
    time               TEXT,
    yearly             INTEGER NOT NULL DEFAULT 0,
    remind_days_before INTEGER NOT NULL DEFAULT 0,
    completed          INTEGER NOT NULL DEFAULT 0,
    created_at         TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_dates_user ON important_dates(user_id, date);

CREATE TABLE IF NOT EXISTS reflections (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id            INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    date               TEXT NOT NULL,
    core_progress      TEXT,
    long_term_value    INTEGER NOT NULL DEFAULT 0,
    deep_work_minutes  INTEGER,
    high_energy_period TEXT,
    key_insight        TEXT,
    changed_judgment   INTEGER NOT NULL DEFAULT 0,
    influences_future  INTEGER NOT NULL DEFAULT 0,
    time_waste         TEXT,
    waste_reason       TEXT,
    tomorrow_focus     TEXT,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL,
    UNIQUE (user_id, date)
);

CREATE TABLE IF NOT EXISTS habits (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title        TEXT NOT NULL,
    description  TEXT,
    category     TEXT NOT NULL,
    frequency    TEXT NOT NULL,
    target_value REAL,
    target_unit  TEXT,
    points       INTEGER NOT NULL,
    active       INTEGER NOT NULL DEFAULT 1,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS habit_checkins (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    habit_id   INTEGER NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
    user_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    date       TEXT NOT NULL,
    value      REAL,
    notes      TEXT,
    created_at TEXT NOT NULL,
    UNIQUE (habit_id, date)
);

CREATE TABLE IF NOT EXISTS points_history (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    change        INTEGER NOT NULL,
    habit_id      INTEGER REFERENCES habits(id) ON DELETE SET NULL,
    description   TEXT NOT NULL,
    balance_after INTEGER NOT NULL,
    created_at    TEXT NOT NULL
);
"#;

/// Handle to the planwise database.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (creating if needed) the database file at `path`.
    pub fn open(path: &Path) -> Result<Store> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Store> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Store> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Store { conn })
    }

    /// Runs `f` inside a transaction; any error rolls everything back.
    ///
    /// Not re-entrant: `f` must not call `in_transaction` again.
    pub fn in_transaction<T>(&self, f: impl FnOnce(&Store) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }
}

/// Deletes the database file (and its WAL/SHM companions).
pub fn delete_database(path: &Path) -> std::io::Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    for suffix in ["-wal", "-shm"] {
        let mut side = path.as_os_str().to_owned();
        side.push(suffix);
        let side = Path::new(&side);
        if side.exists() {
            fs::remove_file(side)?;
        }
    }
    Ok(())
}

macro_rules! text_column {
    ($($ty:ty),+) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse()
                        .map_err(|e: ParseValueError| FromSqlError::Other(Box::new(e)))
                }
            }
        )+
    };
}

text_column!(Priority, TaskStatus, EntryStatus, EntrySource, SummaryKind, DateKind);

impl ToSql for Recurrence {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Recurrence {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e: ParseValueError| FromSqlError::Other(Box::new(e)))
    }
}

fn weekday_to_sql(day: Weekday) -> u8 {
    // chrono numbers Monday as 0
    day.num_days_from_monday() as u8
}

fn weekday_from_sql(idx: usize, value: u8) -> rusqlite::Result<Weekday> {
    Weekday::try_from(value).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Integer,
            Box::new(ParseValueError::new("weekday", value.to_string())),
        )
    })
}

/// Decodes a JSON text column.
fn json_column<T: serde::de::DeserializeOwned>(idx: usize, text: &str) -> rusqlite::Result<T> {
    serde_json::from_str(text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
