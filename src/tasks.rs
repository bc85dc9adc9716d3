//! Task lifecycle: create, edit, complete (with recurrence), cancel, reopen,
//! remove, and filtered listings.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::info;

use crate::error::{ParseValueError, PlanError, Result};
use crate::models::{NewTask, Priority, Task, TaskStatus, TaskUpdate, DEFAULT_CATEGORY};
use crate::storage::Store;
use crate::urgency::sort_by_urgency;

/// Longest estimate accepted for a single task.
pub const MAX_ESTIMATED_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSort {
    #[default]
    Urgency,
    Deadline,
    Priority,
    Created,
}

impl FromStr for TaskSort {
    type Err = ParseValueError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "urgency" => Ok(TaskSort::Urgency),
            "deadline" | "due" => Ok(TaskSort::Deadline),
            "priority" => Ok(TaskSort::Priority),
            "created" | "newest" => Ok(TaskSort::Created),
            _ => Err(ParseValueError::new("sort order", s)),
        }
    }
}

/// Listing filter. With no status and `all == false` only pending tasks are shown.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub all: bool,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub sort: TaskSort,
}

/// Result of completing a task.
#[derive(Debug, Clone)]
pub struct Completion {
    pub task: Task,
    /// The next occurrence, when the task recurs and the series has not ended.
    pub next: Option<Task>,
}

fn clean(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn validate_estimate(minutes: u32) -> Result<()> {
    if minutes == 0 || minutes > MAX_ESTIMATED_MINUTES {
        return Err(PlanError::validation(format!(
            "estimated minutes must be between 1 and {MAX_ESTIMATED_MINUTES}"
        )));
    }
    Ok(())
}

pub fn add_task(store: &Store, user_id: i64, new: NewTask, now: DateTime<Utc>) -> Result<Task> {
    let title = new.title.trim().to_string();
    if title.is_empty() {
        return Err(PlanError::validation("task title cannot be empty"));
    }
    validate_estimate(new.estimated_minutes)?;

    let recurrence_until = if new.recurrence.is_recurring() { new.recurrence_until } else { None };
    let mut task = Task {
        id: 0,
        user_id,
        title,
        description: clean(new.description),
        estimated_minutes: new.estimated_minutes,
        deadline: new.deadline,
        priority: new.priority,
        category: clean(new.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        is_meeting: new.is_meeting,
        location: clean(new.location),
        recurrence: new.recurrence,
        recurrence_until,
        next_task_id: None,
        status: TaskStatus::Pending,
        completed_at: None,
        created_at: now,
        updated_at: now,
    };
    task.id = store.insert_task(&task)?;
    info!(task_id = task.id, title = %task.title, "Task added");
    Ok(task)
}

pub fn get_task(store: &Store, user_id: i64, task_id: i64) -> Result<Task> {
    store.task(user_id, task_id)?.ok_or_else(|| PlanError::not_found("task", task_id))
}

pub fn edit_task(
    store: &Store,
    user_id: i64,
    task_id: i64,
    update: TaskUpdate,
    now: DateTime<Utc>,
) -> Result<Task> {
    let mut task = get_task(store, user_id, task_id)?;

    if let Some(title) = update.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(PlanError::validation("task title cannot be empty"));
        }
        task.title = title;
    }
    if let Some(description) = update.description {
        task.description = clean(Some(description));
    }
    if let Some(minutes) = update.estimated_minutes {
        validate_estimate(minutes)?;
        task.estimated_minutes = minutes;
    }
    if let Some(deadline) = update.deadline {
        task.deadline = deadline;
    }
    if let Some(priority) = update.priority {
        task.priority = priority;
    }
    if let Some(category) = update.category {
        task.category = clean(Some(category)).unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    }
    if let Some(is_meeting) = update.is_meeting {
        task.is_meeting = is_meeting;
    }
    if let Some(location) = update.location {
        task.location = clean(Some(location));
    }
    if let Some(recurrence) = update.recurrence {
        task.recurrence = recurrence;
    }
    if let Some(until) = update.recurrence_until {
        task.recurrence_until = until;
    }
    if !task.recurrence.is_recurring() {
        task.recurrence_until = None;
    }
    task.updated_at = now;

    store.update_task(&task)?;
    Ok(task)
}

/// Marks a pending task completed, spawning its next occurrence if it recurs.
pub fn complete_task(store: &Store, user_id: i64, task_id: i64, now: DateTime<Utc>) -> Result<Completion> {
    let task = get_task(store, user_id, task_id)?;
    if !task.is_pending() {
        return Err(PlanError::validation(format!("task {task_id} is already {}", task.status)));
    }
    store.in_transaction(|store| complete_pending(store, task, now))
}

/// Completion without its own transaction, for callers that already hold one.
pub(crate) fn complete_pending(store: &Store, mut task: Task, now: DateTime<Utc>) -> Result<Completion> {
    task.status = TaskStatus::Completed;
    task.completed_at = Some(now);
    task.updated_at = now;
    store.set_task_status(task.id, task.status, task.completed_at, now)?;

    // a task reopened and completed again keeps the occurrence it already spawned
    let already_spawned = match task.next_task_id {
        Some(id) => store.task(task.user_id, id)?.is_some(),
        None => false,
    };
    let next = match next_occurrence(&task, now).filter(|_| !already_spawned) {
        Some(mut next) => {
            next.id = store.insert_task(&next)?;
            store.set_next_task(task.id, next.id)?;
            task.next_task_id = Some(next.id);
            info!(task_id = task.id, next_id = next.id, "Spawned next occurrence");
            Some(next)
        }
        None => None,
    };
    info!(task_id = task.id, "Task completed");
    Ok(Completion { task, next })
}

/// Builds the follow-up occurrence of a recurring task.
///
/// The series is anchored on the deadline date (or the completion date when
/// there is none); the new deadline keeps the old time of day.
pub fn next_occurrence(task: &Task, now: DateTime<Utc>) -> Option<Task> {
    if !task.recurrence.is_recurring() {
        return None;
    }
    let anchor: NaiveDate = task.deadline.map(|d| d.date()).unwrap_or_else(|| now.date_naive());
    let next_date = task.recurrence.next_after(anchor)?;
    if task.recurrence_until.is_some_and(|until| next_date > until) {
        return None;
    }
    let time = task
        .deadline
        .map(|d| d.time())
        .or_else(|| NaiveTime::from_hms_opt(23, 59, 0))
        .unwrap_or_default();

    Some(Task {
        id: 0,
        deadline: Some(next_date.and_time(time)),
        next_task_id: None,
        status: TaskStatus::Pending,
        completed_at: None,
        created_at: now,
        updated_at: now,
        ..task.clone()
    })
}

pub fn cancel_task(store: &Store, user_id: i64, task_id: i64, now: DateTime<Utc>) -> Result<Task> {
    let mut task = get_task(store, user_id, task_id)?;
    if task.status == TaskStatus::Cancelled {
        return Err(PlanError::validation(format!("task {task_id} is already cancelled")));
    }
    task.status = TaskStatus::Cancelled;
    task.completed_at = None;
    task.updated_at = now;
    store.set_task_status(task.id, task.status, None, now)?;
    Ok(task)
}

/// Puts a completed or cancelled task back to pending.
pub fn reopen_task(store: &Store, user_id: i64, task_id: i64, now: DateTime<Utc>) -> Result<Task> {
    let mut task = get_task(store, user_id, task_id)?;
    if task.is_pending() {
        return Err(PlanError::validation(format!("task {task_id} is already pending")));
    }
    task.status = TaskStatus::Pending;
    task.completed_at = None;
    task.updated_at = now;
    store.set_task_status(task.id, task.status, None, now)?;
    Ok(task)
}

/// Hard delete. Timeline entries keep their slot but lose the task link.
pub fn remove_task(store: &Store, user_id: i64, task_id: i64) -> Result<()> {
    if !store.delete_task(user_id, task_id)? {
        return Err(PlanError::not_found("task", task_id));
    }
    info!(task_id, "Task removed");
    Ok(())
}

pub fn list_tasks(store: &Store, user_id: i64, filter: &TaskFilter, today: NaiveDate) -> Result<Vec<Task>> {
    let category = filter.category.as_deref().map(str::to_lowercase);
    let mut tasks: Vec<Task> = store
        .tasks_for_user(user_id)?
        .into_iter()
        .filter(|t| match filter.status {
            Some(status) => t.status == status,
            None => filter.all || t.is_pending(),
        })
        .filter(|t| filter.priority.map_or(true, |p| t.priority == p))
        .filter(|t| category.as_deref().map_or(true, |c| t.category.to_lowercase() == c))
        .collect();

    match filter.sort {
        TaskSort::Urgency => sort_by_urgency(&mut tasks, today),
        TaskSort::Deadline => tasks.sort_by(|a, b| match (a.deadline, b.deadline) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        }),
        TaskSort::Priority => tasks.sort_by(|a, b| {
            a.priority.cmp(&b.priority).then_with(|| a.deadline.cmp(&b.deadline))
        }),
        TaskSort::Created => tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))),
    }
    Ok(tasks)
}

pub fn categories(store: &Store, user_id: i64) -> Result<Vec<String>> {
    store.task_categories(user_id)
}
