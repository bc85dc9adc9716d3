use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::Store;
use crate::error::Result;
use crate::models::{Habit, HabitCheckin, PointsEntry};

const HABIT_COLUMNS: &str = "id, user_id, title, description, category, frequency, target_value, \
     target_unit, points, active, created_at";

const CHECKIN_COLUMNS: &str = "id, habit_id, user_id, date, value, notes, created_at";

const POINTS_COLUMNS: &str = "id, user_id, change, habit_id, description, balance_after, created_at";

fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<Habit> {
    Ok(Habit {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        frequency: row.get(5)?,
        target_value: row.get(6)?,
        target_unit: row.get(7)?,
        points: row.get(8)?,
        active: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn checkin_from_row(row: &Row<'_>) -> rusqlite::Result<HabitCheckin> {
    Ok(HabitCheckin {
        id: row.get(0)?,
        habit_id: row.get(1)?,
        user_id: row.get(2)?,
        date: row.get(3)?,
        value: row.get(4)?,
        notes: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn points_from_row(row: &Row<'_>) -> rusqlite::Result<PointsEntry> {
    Ok(PointsEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        change: row.get(2)?,
        habit_id: row.get(3)?,
        description: row.get(4)?,
        balance_after: row.get(5)?,
        created_at: row.get(6)?,
    })
}

impl Store {
    pub fn insert_habit(&self, habit: &Habit) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO habits (user_id, title, description, category, frequency, target_value,
                                 target_unit, points, active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                habit.user_id,
                habit.title,
                habit.description,
                habit.category,
                habit.frequency,
                habit.target_value,
                habit.target_unit,
                habit.points,
                habit.active,
                habit.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn habit(&self, user_id: i64, habit_id: i64) -> Result<Option<Habit>> {
        let sql = format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1 AND user_id = ?2");
        Ok(self.conn.query_row(&sql, params![habit_id, user_id], habit_from_row).optional()?)
    }

    /// Active habits first, then by creation.
    pub fn habits_for_user(&self, user_id: i64) -> Result<Vec<Habit>> {
        let sql = format!(
            "SELECT {HABIT_COLUMNS} FROM habits WHERE user_id = ?1 ORDER BY active DESC, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([user_id], habit_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn set_habit_active(&self, user_id: i64, habit_id: i64, active: bool) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE habits SET active = ?1 WHERE id = ?2 AND user_id = ?3",
            params![active, habit_id, user_id],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_habit(&self, user_id: i64, habit_id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM habits WHERE id = ?1 AND user_id = ?2",
            params![habit_id, user_id],
        )?;
        Ok(changed > 0)
    }

    pub fn insert_checkin(&self, checkin: &HabitCheckin) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO habit_checkins (habit_id, user_id, date, value, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                checkin.habit_id,
                checkin.user_id,
                checkin.date,
                checkin.value,
                checkin.notes,
                checkin.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_checkin(&self, checkin: &HabitCheckin) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE habit_checkins SET value = ?1, notes = ?2 WHERE id = ?3",
            params![checkin.value, checkin.notes, checkin.id],
        )?;
        Ok(changed > 0)
    }

    pub fn checkin_on(&self, habit_id: i64, date: NaiveDate) -> Result<Option<HabitCheckin>> {
        let sql = format!(
            "SELECT {CHECKIN_COLUMNS} FROM habit_checkins WHERE habit_id = ?1 AND date = ?2"
        );
        Ok(self.conn.query_row(&sql, params![habit_id, date], checkin_from_row).optional()?)
    }

    /// Newest first.
    pub fn checkins_for_habit(&self, habit_id: i64) -> Result<Vec<HabitCheckin>> {
        let sql = format!(
            "SELECT {CHECKIN_COLUMNS} FROM habit_checkins WHERE habit_id = ?1 ORDER BY date DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([habit_id], checkin_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn delete_checkin(&self, checkin_id: i64) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM habit_checkins WHERE id = ?1", [checkin_id])?;
        Ok(changed > 0)
    }

    pub fn insert_points(&self, entry: &PointsEntry) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO points_history (user_id, change, habit_id, description, balance_after,
                                         created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.user_id,
                entry.change,
                entry.habit_id,
                entry.description,
                entry.balance_after,
                entry.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn points_balance(&self, user_id: i64) -> Result<i64> {
        let balance = self.conn.query_row(
            "SELECT COALESCE(SUM(change), 0) FROM points_history WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(balance)
    }

    /// Newest first, at most `limit` rows.
    pub fn points_history(&self, user_id: i64, limit: u32) -> Result<Vec<PointsEntry>> {
        let sql = format!(
            "SELECT {POINTS_COLUMNS} FROM points_history WHERE user_id = ?1
             ORDER BY id DESC LIMIT ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id, limit], points_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
