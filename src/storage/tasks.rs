use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::Store;
use crate::error::Result;
use crate::models::{Task, TaskStatus};

const TASK_COLUMNS: &str = "id, user_id, title, description, estimated_minutes, deadline, priority, \
     category, is_meeting, location, recurrence, recurrence_until, next_task_id, status, \
     completed_at, created_at, updated_at";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        estimated_minutes: row.get(4)?,
        deadline: row.get(5)?,
        priority: row.get(6)?,
        category: row.get(7)?,
        is_meeting: row.get(8)?,
        location: row.get(9)?,
        recurrence: row.get(10)?,
        recurrence_until: row.get(11)?,
        next_task_id: row.get(12)?,
        status: row.get(13)?,
        completed_at: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

impl Store {
    /// Inserts `task` as given (its `id` is ignored) and returns the new id.
    pub fn insert_task(&self, task: &Task) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO tasks (user_id, title, description, estimated_minutes, deadline, priority,
                                category, is_meeting, location, recurrence, recurrence_until,
                                status, completed_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                task.user_id,
                task.title,
                task.description,
                task.estimated_minutes,
                task.deadline,
                task.priority,
                task.category,
                task.is_meeting,
                task.location,
                task.recurrence,
                task.recurrence_until,
                task.status,
                task.completed_at,
                task.created_at,
                task.updated_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Writes every mutable column of `task` back to its row.
    pub fn update_task(&self, task: &Task) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE tasks SET title = ?1, description = ?2, estimated_minutes = ?3, deadline = ?4,
                              priority = ?5, category = ?6, is_meeting = ?7, location = ?8,
                              recurrence = ?9, recurrence_until = ?10, status = ?11,
                              completed_at = ?12, updated_at = ?13
             WHERE id = ?14 AND user_id = ?15",
            params![
                task.title,
                task.description,
                task.estimated_minutes,
                task.deadline,
                task.priority,
                task.category,
                task.is_meeting,
                task.location,
                task.recurrence,
                task.recurrence_until,
                task.status,
                task.completed_at,
                task.updated_at,
                task.id,
                task.user_id,
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn set_task_status(
        &self,
        task_id: i64,
        status: TaskStatus,
        completed_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE tasks SET status = ?1, completed_at = ?2, updated_at = ?3 WHERE id = ?4",
            params![status, completed_at, now, task_id],
        )?;
        Ok(changed > 0)
    }

    /// Links a completed task to the occurrence it spawned.
    pub fn set_next_task(&self, task_id: i64, next_id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE tasks SET next_task_id = ?1 WHERE id = ?2",
            params![next_id, task_id],
        )?;
        Ok(changed > 0)
    }

    pub fn task(&self, user_id: i64, task_id: i64) -> Result<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND user_id = ?2");
        Ok(self.conn.query_row(&sql, params![task_id, user_id], task_from_row).optional()?)
    }

    /// All of a user's tasks, oldest first.
    pub fn tasks_for_user(&self, user_id: i64) -> Result<Vec<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1 ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([user_id], task_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn delete_task(&self, user_id: i64, task_id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
            params![task_id, user_id],
        )?;
        Ok(changed > 0)
    }

    pub fn task_categories(&self, user_id: i64) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT category FROM tasks WHERE user_id = ?1 ORDER BY category")?;
        let rows = stmt.query_map([user_id], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
