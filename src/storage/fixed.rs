use rusqlite::{params, OptionalExtension, Row};

use super::{weekday_from_sql, weekday_to_sql, Store};
use crate::error::Result;
use crate::models::FixedCommitment;

const FIXED_COLUMNS: &str = "id, user_id, title, description, category, location, weekday, \
     start_time, end_time, start_date, end_date, active";

fn fixed_from_row(row: &Row<'_>) -> rusqlite::Result<FixedCommitment> {
    Ok(FixedCommitment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        location: row.get(5)?,
        weekday: weekday_from_sql(6, row.get(6)?)?,
        start: row.get(7)?,
        end: row.get(8)?,
        start_date: row.get(9)?,
        end_date: row.get(10)?,
        active: row.get(11)?,
    })
}

impl Store {
    pub fn insert_fixed(&self, fixed: &FixedCommitment) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO fixed_commitments (user_id, title, description, category, location,
                                            weekday, start_time, end_time, start_date, end_date,
                                            active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                fixed.user_id,
                fixed.title,
                fixed.description,
                fixed.category,
                fixed.location,
                weekday_to_sql(fixed.weekday),
                fixed.start,
                fixed.end,
                fixed.start_date,
                fixed.end_date,
                fixed.active,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn fixed(&self, user_id: i64, fixed_id: i64) -> Result<Option<FixedCommitment>> {
        let sql =
            format!("SELECT {FIXED_COLUMNS} FROM fixed_commitments WHERE id = ?1 AND user_id = ?2");
        Ok(self.conn.query_row(&sql, params![fixed_id, user_id], fixed_from_row).optional()?)
    }

    /// Ordered by weekday, then start time.
    pub fn fixed_for_user(&self, user_id: i64) -> Result<Vec<FixedCommitment>> {
        let sql = format!(
            "SELECT {FIXED_COLUMNS} FROM fixed_commitments WHERE user_id = ?1
             ORDER BY weekday, start_time, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([user_id], fixed_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn set_fixed_active(&self, user_id: i64, fixed_id: i64, active: bool) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE fixed_commitments SET active = ?1 WHERE id = ?2 AND user_id = ?3",
            params![active, fixed_id, user_id],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_fixed(&self, user_id: i64, fixed_id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM fixed_commitments WHERE id = ?1 AND user_id = ?2",
            params![fixed_id, user_id],
        )?;
        Ok(changed > 0)
    }
}
