//! Command handlers behind the `planwise` binary.
//!
//! Each `cmd_*` function runs one CLI command against a [`Context`] and
//! prints its result; errors are returned to `main` for reporting.

mod account;
mod insights;
mod journal;
mod plan;
mod tasks;

pub use account::*;
pub use insights::*;
pub use journal::*;
pub use plan::*;
pub use tasks::*;

use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};

use crate::ai::{AiError, ChatClient};
use crate::auth::{current_user, session_path};
use crate::config::Config;
use crate::error::Result;
use crate::models::User;
use crate::storage::{delete_database, Store};

/// Everything a command needs: configuration, the open store and the clock.
pub struct Context {
    pub config: Config,
    pub db_path: PathBuf,
    pub store: Store,
}

impl Context {
    pub fn open(config: Config) -> Result<Context> {
        let db_path = config.db_path()?;
        tracing::debug!(path = %db_path.display(), "Opening database");
        let store = Store::open(&db_path)?;
        Ok(Context { config, db_path, store })
    }

    pub fn session_file(&self) -> PathBuf {
        session_path(&self.db_path)
    }

    /// The signed-in user, or an auth error asking to log in.
    pub fn user(&self) -> Result<User> {
        current_user(&self.store, &self.session_file())
    }

    pub fn client(&self) -> std::result::Result<ChatClient, AiError> {
        ChatClient::new(&self.config.ai)
    }

    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Parses `YYYY-MM-DD`, `today` or `tomorrow`.
pub fn parse_date(text: &str) -> std::result::Result<NaiveDate, String> {
    let today = Local::now().date_naive();
    match text.trim().to_lowercase().as_str() {
        "today" => Ok(today),
        "tomorrow" => today.succ_opt().ok_or_else(|| "date out of range".to_string()),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .map_err(|e| format!("invalid date '{text}': {e}. Use YYYY-MM-DD.")),
    }
}

/// Parses `HH:MM`.
pub fn parse_time(text: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M")
        .map_err(|e| format!("invalid time '{text}': {e}. Use HH:MM."))
}

/// Parses `YYYY-MM-DD HH:MM`, or a bare date meaning the end of that day.
pub fn parse_deadline(text: &str) -> std::result::Result<NaiveDateTime, String> {
    let trimmed = text.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M") {
        return Ok(dt);
    }
    let date = parse_date(trimmed)?;
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default();
    Ok(date.and_time(end_of_day))
}

pub fn parse_weekday(text: &str) -> std::result::Result<Weekday, String> {
    text.trim()
        .parse::<Weekday>()
        .map_err(|_| format!("invalid weekday '{text}'. Use mon, tue, ..."))
}

/// A table with the shared look and bold headers.
pub(crate) fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

/// `95` -> `1h 35m`.
pub fn format_minutes(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Resets the database by deleting every user and their data.
pub fn cmd_reset(ctx: Context, force: bool) -> Result<()> {
    if !force {
        print!("Are you sure you want to delete all users, tasks and plans? This cannot be undone. [y/N] ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }

    let Context { db_path, store, .. } = ctx;
    let session = session_path(&db_path);
    drop(store);
    delete_database(&db_path)?;
    crate::auth::clear_session(&session)?;
    println!("Database reset successfully.");
    Ok(())
}
