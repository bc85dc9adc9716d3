use rusqlite::{params, OptionalExtension, Row};

use super::Store;
use crate::error::Result;
use crate::models::ImportantDate;

const DATE_COLUMNS: &str = "id, user_id, title, description, kind, date, time, yearly, \
     remind_days_before, completed, created_at";

fn important_date_from_row(row: &Row<'_>) -> rusqlite::Result<ImportantDate> {
    Ok(ImportantDate {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        kind: row.get(4)?,
        date: row.get(5)?,
        time: row.get(6)?,
        yearly: row.get(7)?,
        remind_days_before: row.get(8)?,
        completed: row.get(9)?,
        created_at: row.get(10)?,
    })
}

impl Store {
    pub fn insert_important_date(&self, item: &ImportantDate) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO important_dates (user_id, title, description, kind, date, time, yearly,
                                          remind_days_before, completed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                item.user_id,
                item.title,
                item.description,
                item.kind,
                item.date,
                item.time,
                item.yearly,
                item.remind_days_before,
                item.completed,
                item.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn important_date(&self, user_id: i64, date_id: i64) -> Result<Option<ImportantDate>> {
        let sql =
            format!("SELECT {DATE_COLUMNS} FROM important_dates WHERE id = ?1 AND user_id = ?2");
        Ok(self.conn.query_row(&sql, params![date_id, user_id], important_date_from_row).optional()?)
    }

    /// Ordered by stored date, then time.
    pub fn important_dates_for_user(&self, user_id: i64) -> Result<Vec<ImportantDate>> {
        let sql = format!(
            "SELECT {DATE_COLUMNS} FROM important_dates WHERE user_id = ?1
             ORDER BY date, time, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([user_id], important_date_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn set_important_date_completed(&self, user_id: i64, date_id: i64, completed: bool) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE important_dates SET completed = ?1 WHERE id = ?2 AND user_id = ?3",
            params![completed, date_id, user_id],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_important_date(&self, user_id: i64, date_id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM important_dates WHERE id = ?1 AND user_id = ?2",
            params![date_id, user_id],
        )?;
        Ok(changed > 0)
    }
}
