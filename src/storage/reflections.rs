use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::Store;
use crate::error::Result;
use crate::models::Reflection;

const REFLECTION_COLUMNS: &str = "id, user_id, date, core_progress, long_term_value, \
     deep_work_minutes, high_energy_period, key_insight, changed_judgment, influences_future, \
     time_waste, waste_reason, tomorrow_focus, created_at, updated_at";

fn reflection_from_row(row: &Row<'_>) -> rusqlite::Result<Reflection> {
    Ok(Reflection {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: row.get(2)?,
        core_progress: row.get(3)?,
        long_term_value: row.get(4)?,
        deep_work_minutes: row.get(5)?,
        high_energy_period: row.get(6)?,
        key_insight: row.get(7)?,
        changed_judgment: row.get(8)?,
        influences_future: row.get(9)?,
        time_waste: row.get(10)?,
        waste_reason: row.get(11)?,
        tomorrow_focus: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

impl Store {
    /// Inserts or replaces the reflection for (user, date). Returns the row id.
    ///
    /// An existing row keeps its `created_at`.
    pub fn upsert_reflection(&self, reflection: &Reflection) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO reflections (user_id, date, core_progress, long_term_value,
                                      deep_work_minutes, high_energy_period, key_insight,
                                      changed_judgment, influences_future, time_waste,
                                      waste_reason, tomorrow_focus, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT(user_id, date) DO UPDATE SET
                 core_progress = excluded.core_progress,
                 long_term_value = excluded.long_term_value,
                 deep_work_minutes = excluded.deep_work_minutes,
                 high_energy_period = excluded.high_energy_period,
                 key_insight = excluded.key_insight,
                 changed_judgment = excluded.changed_judgment,
                 influences_future = excluded.influences_future,
                 time_waste = excluded.time_waste,
                 waste_reason = excluded.waste_reason,
                 tomorrow_focus = excluded.tomorrow_focus,
                 updated_at = excluded.updated_at",
            params![
                reflection.user_id,
                reflection.date,
                reflection.core_progress,
                reflection.long_term_value,
                reflection.deep_work_minutes,
                reflection.high_energy_period,
                reflection.key_insight,
                reflection.changed_judgment,
                reflection.influences_future,
                reflection.time_waste,
                reflection.waste_reason,
                reflection.tomorrow_focus,
                reflection.created_at,
                reflection.updated_at,
            ],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM reflections WHERE user_id = ?1 AND date = ?2",
            params![reflection.user_id, reflection.date],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn reflection_on(&self, user_id: i64, date: NaiveDate) -> Result<Option<Reflection>> {
        let sql =
            format!("SELECT {REFLECTION_COLUMNS} FROM reflections WHERE user_id = ?1 AND date = ?2");
        Ok(self.conn.query_row(&sql, params![user_id, date], reflection_from_row).optional()?)
    }

    /// Newest first.
    pub fn reflections_for_user(&self, user_id: i64) -> Result<Vec<Reflection>> {
        let sql = format!(
            "SELECT {REFLECTION_COLUMNS} FROM reflections WHERE user_id = ?1 ORDER BY date DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([user_id], reflection_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Reflections dated `start..=end`, oldest first.
    pub fn reflections_between(&self, user_id: i64, start: NaiveDate, end: NaiveDate) -> Result<Vec<Reflection>> {
        let sql = format!(
            "SELECT {REFLECTION_COLUMNS} FROM reflections
             WHERE user_id = ?1 AND date >= ?2 AND date <= ?3 ORDER BY date"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id, start, end], reflection_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn delete_reflection(&self, user_id: i64, date: NaiveDate) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM reflections WHERE user_id = ?1 AND date = ?2",
            params![user_id, date],
        )?;
        Ok(changed > 0)
    }
}
