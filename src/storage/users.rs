use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::Store;
use crate::error::Result;
use crate::models::{Preferences, User};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, day_start, day_end, max_daily_minutes, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        preferences: Preferences {
            day_start: row.get(4)?,
            day_end: row.get(5)?,
            max_daily_minutes: row.get(6)?,
        },
        created_at: row.get(7)?,
    })
}

impl Store {
    pub fn insert_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        preferences: &Preferences,
        created_at: DateTime<Utc>,
    ) -> Result<User> {
        self.conn.execute(
            "INSERT INTO users (username, email, password_hash, day_start, day_end, max_daily_minutes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                username,
                email,
                password_hash,
                preferences.day_start,
                preferences.day_end,
                preferences.max_daily_minutes,
                created_at,
            ],
        )?;
        Ok(User {
            id: self.conn.last_insert_rowid(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            preferences: *preferences,
            created_at,
        })
    }

    pub fn user(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        Ok(self.conn.query_row(&sql, [id], user_from_row).optional()?)
    }

    /// Looks a user up by username or email, case-insensitively.
    pub fn user_by_login(&self, login: &str) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE lower(username) = lower(?1) OR lower(email) = lower(?1)"
        );
        Ok(self.conn.query_row(&sql, [login], user_from_row).optional()?)
    }

    pub fn username_taken(&self, username: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE lower(username) = lower(?1)",
            [username],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn email_taken(&self, email: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE lower(email) = lower(?1)",
            [email],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn update_preferences(&self, user_id: i64, preferences: &Preferences) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE users SET day_start = ?1, day_end = ?2, max_daily_minutes = ?3 WHERE id = ?4",
            params![
                preferences.day_start,
                preferences.day_end,
                preferences.max_daily_minutes,
                user_id,
            ],
        )?;
        Ok(changed > 0)
    }
}
