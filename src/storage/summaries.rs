use rusqlite::{params, OptionalExtension, Row};

use super::{json_column, Store};
use crate::error::Result;
use crate::models::Summary;

const SUMMARY_COLUMNS: &str = "id, user_id, kind, start_date, end_date, total_entries, \
     completed_entries, completion_rate, total_minutes, category_minutes, trend, narrative, \
     suggestions, notes, created_at";

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<Summary> {
    let categories: String = row.get(9)?;
    let trend: String = row.get(10)?;
    Ok(Summary {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        total_entries: row.get(5)?,
        completed_entries: row.get(6)?,
        completion_rate: row.get(7)?,
        total_minutes: row.get(8)?,
        category_minutes: json_column(9, &categories)?,
        trend: json_column(10, &trend)?,
        narrative: row.get(11)?,
        suggestions: row.get(12)?,
        notes: row.get(13)?,
        created_at: row.get(14)?,
    })
}

impl Store {
    /// Inserts or replaces the snapshot for the summary's (kind, window).
    ///
    /// User notes on an existing snapshot survive regeneration. Returns the row id.
    pub fn upsert_summary(&self, summary: &Summary) -> Result<i64> {
        let categories = serde_json::to_string(&summary.category_minutes)?;
        let trend = serde_json::to_string(&summary.trend)?;
        self.conn.execute(
            "INSERT INTO summaries (user_id, kind, start_date, end_date, total_entries,
                                    completed_entries, completion_rate, total_minutes,
                                    category_minutes, trend, narrative, suggestions, notes,
                                    created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT(user_id, kind, start_date, end_date) DO UPDATE SET
                 total_entries = excluded.total_entries,
                 completed_entries = excluded.completed_entries,
                 completion_rate = excluded.completion_rate,
                 total_minutes = excluded.total_minutes,
                 category_minutes = excluded.category_minutes,
                 trend = excluded.trend,
                 narrative = excluded.narrative,
                 suggestions = excluded.suggestions,
                 created_at = excluded.created_at",
            params![
                summary.user_id,
                summary.kind,
                summary.start_date,
                summary.end_date,
                summary.total_entries,
                summary.completed_entries,
                summary.completion_rate,
                summary.total_minutes,
                categories,
                trend,
                summary.narrative,
                summary.suggestions,
                summary.notes,
                summary.created_at,
            ],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM summaries
             WHERE user_id = ?1 AND kind = ?2 AND start_date = ?3 AND end_date = ?4",
            params![summary.user_id, summary.kind, summary.start_date, summary.end_date],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn summary(&self, user_id: i64, summary_id: i64) -> Result<Option<Summary>> {
        let sql = format!("SELECT {SUMMARY_COLUMNS} FROM summaries WHERE id = ?1 AND user_id = ?2");
        Ok(self
            .conn
            .query_row(&sql, params![summary_id, user_id], summary_from_row)
            .optional()?)
    }

    /// Newest window first.
    pub fn summaries_for_user(&self, user_id: i64) -> Result<Vec<Summary>> {
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS} FROM summaries WHERE user_id = ?1
             ORDER BY end_date DESC, start_date DESC, id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([user_id], summary_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn set_summary_notes(&self, user_id: i64, summary_id: i64, notes: Option<&str>) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE summaries SET notes = ?1 WHERE id = ?2 AND user_id = ?3",
            params![notes, summary_id, user_id],
        )?;
        Ok(changed > 0)
    }
}
