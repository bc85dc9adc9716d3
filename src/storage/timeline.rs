use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::Store;
use crate::error::Result;
use crate::models::{EntrySource, EntryStatus, Feedback, NewEntry, TimelineEntry};

// Feedback columns ride along on every entry read.
const ENTRY_SELECT: &str = "SELECT e.id, e.user_id, e.date, e.start_time, e.end_time, e.task_id, \
     e.title, e.category, e.location, e.is_break, e.is_meeting, e.source, e.reasoning, e.status, \
     f.actual_minutes, f.notes, e.created_at \
     FROM timeline_entries e LEFT JOIN feedback f ON f.entry_id = e.id";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<TimelineEntry> {
    Ok(TimelineEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: row.get(2)?,
        start: row.get(3)?,
        end: row.get(4)?,
        task_id: row.get(5)?,
        title: row.get(6)?,
        category: row.get(7)?,
        location: row.get(8)?,
        is_break: row.get(9)?,
        is_meeting: row.get(10)?,
        source: row.get(11)?,
        reasoning: row.get(12)?,
        status: row.get(13)?,
        actual_minutes: row.get(14)?,
        notes: row.get(15)?,
        created_at: row.get(16)?,
    })
}

impl Store {
    pub fn insert_entry(
        &self,
        user_id: i64,
        entry: &NewEntry,
        created_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO timeline_entries (user_id, date, start_time, end_time, task_id, title,
                                           category, location, is_break, is_meeting, source,
                                           reasoning, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                user_id,
                entry.date,
                entry.start,
                entry.end,
                entry.task_id,
                entry.title,
                entry.category,
                entry.location,
                entry.is_break,
                entry.is_meeting,
                entry.source,
                entry.reasoning,
                EntryStatus::Planned,
                created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Rewrites the slot and descriptive fields of an entry.
    pub fn update_entry(&self, entry: &TimelineEntry) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE timeline_entries SET date = ?1, start_time = ?2, end_time = ?3, task_id = ?4,
                                         title = ?5, category = ?6, location = ?7, is_break = ?8,
                                         is_meeting = ?9, reasoning = ?10
             WHERE id = ?11 AND user_id = ?12",
            params![
                entry.date,
                entry.start,
                entry.end,
                entry.task_id,
                entry.title,
                entry.category,
                entry.location,
                entry.is_break,
                entry.is_meeting,
                entry.reasoning,
                entry.id,
                entry.user_id,
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn set_entry_status(&self, entry_id: i64, status: EntryStatus) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE timeline_entries SET status = ?1 WHERE id = ?2",
            params![status, entry_id],
        )?;
        Ok(changed > 0)
    }

    pub fn entry(&self, user_id: i64, entry_id: i64) -> Result<Option<TimelineEntry>> {
        let sql = format!("{ENTRY_SELECT} WHERE e.id = ?1 AND e.user_id = ?2");
        Ok(self.conn.query_row(&sql, params![entry_id, user_id], entry_from_row).optional()?)
    }

    pub fn entries_on(&self, user_id: i64, date: NaiveDate) -> Result<Vec<TimelineEntry>> {
        self.entries_between(user_id, date, date)
    }

    /// Entries dated `start..=end`, ordered by date then start time.
    pub fn entries_between(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TimelineEntry>> {
        let sql = format!(
            "{ENTRY_SELECT} WHERE e.user_id = ?1 AND e.date BETWEEN ?2 AND ?3
             ORDER BY e.date, e.start_time, e.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id, start, end], entry_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn entries_for_user(&self, user_id: i64) -> Result<Vec<TimelineEntry>> {
        let sql = format!("{ENTRY_SELECT} WHERE e.user_id = ?1 ORDER BY e.date, e.start_time, e.id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([user_id], entry_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn entries_for_task(&self, task_id: i64) -> Result<Vec<TimelineEntry>> {
        let sql = format!("{ENTRY_SELECT} WHERE e.task_id = ?1 ORDER BY e.date, e.start_time");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([task_id], entry_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// AI entries dated before `before` that are still planned and point at a task.
    pub fn carry_over_entries(&self, user_id: i64, before: NaiveDate) -> Result<Vec<TimelineEntry>> {
        let sql = format!(
            "{ENTRY_SELECT} WHERE e.user_id = ?1 AND e.date < ?2 AND e.source = ?3
                 AND e.status = ?4 AND e.task_id IS NOT NULL
             ORDER BY e.date, e.start_time"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![user_id, before, EntrySource::Ai, EntryStatus::Planned],
            entry_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Clears generated (AI and fixed) entries in `start..=end` that carry no
    /// logged time, so a new plan can take their place.
    pub fn delete_generated_entries(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM timeline_entries
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
               AND source IN (?4, ?5)
               AND status NOT IN (?6, ?7)",
            params![
                user_id,
                start,
                end,
                EntrySource::Ai,
                EntrySource::Fixed,
                EntryStatus::Done,
                EntryStatus::Partial,
            ],
        )?;
        Ok(removed)
    }

    pub fn delete_entry(&self, user_id: i64, entry_id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM timeline_entries WHERE id = ?1 AND user_id = ?2",
            params![entry_id, user_id],
        )?;
        Ok(changed > 0)
    }

    pub fn upsert_feedback(&self, feedback: &Feedback) -> Result<()> {
        self.conn.execute(
            "INSERT INTO feedback (entry_id, status, actual_minutes, notes, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(entry_id) DO UPDATE SET
                 status = excluded.status,
                 actual_minutes = excluded.actual_minutes,
                 notes = excluded.notes,
                 recorded_at = excluded.recorded_at",
            params![
                feedback.entry_id,
                feedback.status,
                feedback.actual_minutes,
                feedback.notes,
                feedback.recorded_at,
            ],
        )?;
        Ok(())
    }

    pub fn feedback_for(&self, entry_id: i64) -> Result<Option<Feedback>> {
        Ok(self
            .conn
            .query_row(
                "SELECT entry_id, status, actual_minutes, notes, recorded_at
                 FROM feedback WHERE entry_id = ?1",
                [entry_id],
                |row| {
                    Ok(Feedback {
                        entry_id: row.get(0)?,
                        status: row.get(1)?,
                        actual_minutes: row.get(2)?,
                        notes: row.get(3)?,
                        recorded_at: row.get(4)?,
                    })
                },
            )
            .optional()?)
    }
}
