//! Feedback on timeline entries, and the task/reward bookkeeping it triggers.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{PlanError, Result};
use crate::models::{EntryStatus, Feedback, RewardRule, TaskStatus, TimelineEntry};
use crate::rewards::refresh_rules;
use crate::storage::Store;
use crate::tasks::{complete_pending, Completion};

/// Upper bound for logged minutes on one entry.
pub const MAX_ACTUAL_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone)]
pub struct FeedbackInput {
    pub status: EntryStatus,
    pub actual_minutes: Option<u32>,
    pub notes: Option<String>,
}

/// Side effects of a status change.
#[derive(Debug, Clone)]
pub struct FeedbackOutcome {
    pub entry: TimelineEntry,
    /// Set when the change completed the linked task.
    pub completed: Option<Completion>,
    /// Set when the change put a completed task back to pending.
    pub reopened_task: Option<i64>,
    /// Reward rules that reached their target with this change.
    pub newly_achieved: Vec<RewardRule>,
}

pub fn record_feedback(
    store: &Store,
    user_id: i64,
    entry_id: i64,
    input: FeedbackInput,
    now: DateTime<Utc>,
) -> Result<FeedbackOutcome> {
    if input.actual_minutes.is_some_and(|m| m > MAX_ACTUAL_MINUTES) {
        return Err(PlanError::validation(format!(
            "actual minutes must be between 0 and {MAX_ACTUAL_MINUTES}"
        )));
    }
    let entry = load_entry(store, user_id, entry_id)?;
    let feedback = Feedback {
        entry_id,
        status: input.status,
        actual_minutes: input.actual_minutes,
        notes: input.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        recorded_at: now,
    };

    store.in_transaction(|store| {
        store.upsert_feedback(&feedback)?;
        apply_status(store, user_id, entry, input.status, now)
    })
}

/// Quick status toggle that keeps any logged minutes and notes.
pub fn set_entry_status(
    store: &Store,
    user_id: i64,
    entry_id: i64,
    status: EntryStatus,
    now: DateTime<Utc>,
) -> Result<FeedbackOutcome> {
    let entry = load_entry(store, user_id, entry_id)?;
    store.in_transaction(|store| {
        if let Some(mut feedback) = store.feedback_for(entry_id)? {
            feedback.status = status;
            feedback.recorded_at = now;
            store.upsert_feedback(&feedback)?;
        }
        apply_status(store, user_id, entry, status, now)
    })
}

fn load_entry(store: &Store, user_id: i64, entry_id: i64) -> Result<TimelineEntry> {
    store
        .entry(user_id, entry_id)?
        .ok_or_else(|| PlanError::not_found("entry", entry_id))
}

fn apply_status(
    store: &Store,
    user_id: i64,
    entry: TimelineEntry,
    status: EntryStatus,
    now: DateTime<Utc>,
) -> Result<FeedbackOutcome> {
    let previous = entry.status;
    store.set_entry_status(entry.id, status)?;

    let mut completed = None;
    let mut reopened_task = None;
    let linked = match entry.task_id {
        Some(task_id) => store.task(user_id, task_id)?,
        None => None,
    };
    if let Some(task) = linked {
        if status == EntryStatus::Done && task.is_pending() && all_entries_done(store, task.id)? {
            completed = Some(complete_pending(store, task, now)?);
        } else if previous == EntryStatus::Done
            && status != EntryStatus::Done
            && task.status == TaskStatus::Completed
        {
            store.set_task_status(task.id, TaskStatus::Pending, None, now)?;
            info!(task_id = task.id, "Task reopened after entry was reverted");
            reopened_task = Some(task.id);
        }
    }

    let newly_achieved = refresh_rules(store, user_id, now)?;
    let entry = load_entry(store, user_id, entry.id)?;
    info!(entry_id = entry.id, from = %previous, to = %status, "Entry status updated");
    Ok(FeedbackOutcome { entry, completed, reopened_task, newly_achieved })
}

/// Every non-skipped entry for the task is done.
fn all_entries_done(store: &Store, task_id: i64) -> Result<bool> {
    let entries = store.entries_for_task(task_id)?;
    let mut active = entries.iter().filter(|e| e.status != EntryStatus::Skipped).peekable();
    if active.peek().is_none() {
        return Ok(false);
    }
    Ok(active.all(|e| e.status == EntryStatus::Done))
}
