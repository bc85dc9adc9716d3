//! Scheduler adapter: turns pending tasks and preferences into a prompt, asks
//! the completion endpoint for a plan, and stores the accepted slots as
//! timeline entries. Manual timeline edits share the same slot checks.

mod parse;
mod prompt;

pub use parse::{parse_clock, parse_response, ProposedEntry};
pub use prompt::{build_prompt, PromptContext, SYSTEM_PROMPT};

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use crate::ai::{CompletionClient, CompletionRequest};
use crate::config::AiConfig;
use crate::dates::dates_between;
use crate::error::{ParseValueError, PlanError, Result};
use crate::fixed::occurrences_on;
use crate::models::{
    minutes_between, EntrySource, EntryStatus, NewEntry, Preferences, Task, TimelineEntry, User,
};
use crate::storage::Store;
use crate::urgency::sort_by_urgency;

/// Tasks whose deadline passed longer ago than this are left out of plans.
pub const STALE_DEADLINE_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanScope {
    Today,
    Week,
}

impl PlanScope {
    pub fn days(&self) -> i64 {
        match self {
            PlanScope::Today => 1,
            PlanScope::Week => 7,
        }
    }

    /// Token limit and timeout for the completion call.
    pub fn limits(&self, ai: &AiConfig) -> (u32, Duration) {
        match self {
            PlanScope::Today => (ai.day_max_tokens, Duration::from_secs(ai.day_timeout_secs)),
            PlanScope::Week => (ai.week_max_tokens, Duration::from_secs(ai.week_timeout_secs)),
        }
    }
}

impl FromStr for PlanScope {
    type Err = ParseValueError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "today" | "day" => Ok(PlanScope::Today),
            "week" => Ok(PlanScope::Week),
            _ => Err(ParseValueError::new("plan scope", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    OutsideRange,
    OutsideWindow,
    Overlap,
    DailyCap,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            DropReason::OutsideRange => "date outside the planned range",
            DropReason::OutsideWindow => "outside the working window",
            DropReason::Overlap => "overlaps another entry",
            DropReason::DailyCap => "exceeds the daily work cap",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone)]
pub struct DroppedEntry {
    pub date: NaiveDate,
    pub title: String,
    pub reason: DropReason,
}

/// What a generation request changed.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Newly written entries (fixed and AI), by date and start time.
    pub inserted: Vec<TimelineEntry>,
    pub dropped: Vec<DroppedEntry>,
    /// Entries with logged time that were kept in place.
    pub kept: usize,
    /// Earlier carry-over entries marked skipped because their task was placed again.
    pub superseded: usize,
}

/// Accepted slots for one date, used for the overlap and cap checks.
struct DaySlots {
    taken: Vec<(NaiveTime, NaiveTime)>,
    work_minutes: u32,
}

impl DaySlots {
    fn from_entries<'a>(entries: impl Iterator<Item = &'a TimelineEntry>) -> Self {
        let mut slots = DaySlots { taken: Vec::new(), work_minutes: 0 };
        for entry in entries.filter(|e| e.status != EntryStatus::Skipped) {
            slots.take(entry.start, entry.end, entry.is_break);
        }
        slots
    }

    fn overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        self.taken.iter().any(|(s, e)| *s < end && start < *e)
    }

    fn take(&mut self, start: NaiveTime, end: NaiveTime, is_break: bool) {
        self.taken.push((start, end));
        if !is_break {
            self.work_minutes += minutes_between(start, end);
        }
    }
}

/// Clips a slot to the working window; `None` when nothing is left.
fn clip_to_window(prefs: &Preferences, start: NaiveTime, end: NaiveTime) -> Option<(NaiveTime, NaiveTime)> {
    let start = start.max(prefs.day_start);
    let end = end.min(prefs.day_end);
    (start < end).then_some((start, end))
}

/// Pending tasks worth planning as of `start`, most urgent first.
pub fn candidate_tasks(store: &Store, user_id: i64, start: NaiveDate) -> Result<Vec<Task>> {
    let cutoff = start - TimeDelta::days(STALE_DEADLINE_DAYS);
    let mut tasks: Vec<Task> = store
        .tasks_for_user(user_id)?
        .into_iter()
        .filter(|t| t.is_pending())
        .filter(|t| t.deadline.map_or(true, |d| d.date() >= cutoff))
        .collect();
    sort_by_urgency(&mut tasks, start);
    Ok(tasks)
}

fn match_task<'a>(proposal: &ProposedEntry, tasks: &'a HashMap<i64, Task>) -> Option<&'a Task> {
    if let Some(task) = proposal.task_id.and_then(|id| tasks.get(&id)) {
        return Some(task);
    }
    if proposal.is_break {
        return None;
    }
    let title = proposal.title.to_lowercase();
    let mut ordered: Vec<&Task> = tasks.values().collect();
    ordered.sort_by_key(|t| t.id);
    ordered.into_iter().find(|t| {
        let candidate = t.title.to_lowercase();
        title.contains(&candidate) || candidate.contains(&title)
    })
}

/// Generates a plan for `scope` starting at `start` and stores it.
///
/// The completion call happens before any write, so a failed call leaves the
/// timeline untouched.
pub fn generate_plan(
    store: &Store,
    client: &dyn CompletionClient,
    ai: &AiConfig,
    user: &User,
    scope: PlanScope,
    start: NaiveDate,
    now: DateTime<Utc>,
) -> Result<PlanOutcome> {
    let prefs = &user.preferences;
    let end = start + TimeDelta::days(scope.days() - 1);
    let dates: Vec<NaiveDate> = (0..scope.days()).map(|d| start + TimeDelta::days(d)).collect();

    let tasks = candidate_tasks(store, user.id, start)?;
    let task_map: HashMap<i64, Task> = tasks.iter().map(|t| (t.id, t.clone())).collect();

    let commitments = store.fixed_for_user(user.id)?;
    let fixed: Vec<(NaiveDate, Vec<_>)> =
        dates.iter().map(|d| (*d, occurrences_on(&commitments, *d))).collect();
    let fixed_count: usize = fixed.iter().map(|(_, items)| items.len()).sum();

    let important_dates = dates_between(store, user.id, start, end)?;

    let carry_overs: Vec<TimelineEntry> = store
        .carry_over_entries(user.id, start)?
        .into_iter()
        .filter(|e| e.task_id.is_some_and(|id| task_map.contains_key(&id)))
        .collect();

    if tasks.is_empty() && fixed_count == 0 {
        return Err(PlanError::validation("nothing to schedule: add tasks or fixed commitments first"));
    }

    let prompt = build_prompt(&PromptContext {
        preferences: prefs,
        dates: &dates,
        fixed: &fixed,
        important_dates: &important_dates,
        carry_overs: &carry_overs,
        tasks: &tasks,
    });
    let (max_tokens, timeout) = scope.limits(ai);
    let request = CompletionRequest {
        system: SYSTEM_PROMPT.to_string(),
        prompt,
        max_tokens,
        timeout,
    };

    info!(user_id = user.id, %start, %end, tasks = tasks.len(), "Requesting plan");
    let reply = client.complete(&request).map_err(|e| {
        warn!(error = %e, "Plan generation failed, timeline left unchanged");
        PlanError::Ai(e)
    })?;
    let proposals = parse_response(&reply, start).map_err(|e| {
        warn!(error = %e, "Could not read plan reply, timeline left unchanged");
        PlanError::Ai(e)
    })?;

    store.in_transaction(|store| {
        let removed = store.delete_generated_entries(user.id, start, end)?;
        debug!(removed, "Cleared previous generated entries");

        let existing = store.entries_between(user.id, start, end)?;
        let kept = existing
            .iter()
            .filter(|e| e.source != EntrySource::Manual && e.status.counts_time())
            .count();

        let mut days: HashMap<NaiveDate, DaySlots> = dates
            .iter()
            .map(|d| (*d, DaySlots::from_entries(existing.iter().filter(|e| e.date == *d))))
            .collect();

        let mut inserted_ids = Vec::new();
        let mut dropped = Vec::new();

        for (date, items) in &fixed {
            let Some(slots) = days.get_mut(date) else { continue };
            for item in items {
                let Some((s, e)) = clip_to_window(prefs, item.start, item.end) else {
                    dropped.push(DroppedEntry { date: *date, title: item.title.clone(), reason: DropReason::OutsideWindow });
                    continue;
                };
                if slots.overlaps(s, e) {
                    dropped.push(DroppedEntry { date: *date, title: item.title.clone(), reason: DropReason::Overlap });
                    continue;
                }
                let mut entry = item.to_entry(*date);
                entry.start = s;
                entry.end = e;
                inserted_ids.push(store.insert_entry(user.id, &entry, now)?);
                slots.take(s, e, false);
            }
        }

        let mut placed_tasks = HashSet::new();
        for proposal in proposals {
            let reject = |reason: DropReason| {
                warn!(date = %proposal.date, title = %proposal.title, %reason, "Dropping proposed entry");
                DroppedEntry { date: proposal.date, title: proposal.title.clone(), reason }
            };
            let Some(slots) = days.get_mut(&proposal.date) else {
                dropped.push(reject(DropReason::OutsideRange));
                continue;
            };
            let Some((s, e)) = clip_to_window(prefs, proposal.start, proposal.end) else {
                dropped.push(reject(DropReason::OutsideWindow));
                continue;
            };
            if slots.overlaps(s, e) {
                dropped.push(reject(DropReason::Overlap));
                continue;
            }
            if !proposal.is_break && slots.work_minutes + minutes_between(s, e) > prefs.max_daily_minutes {
                dropped.push(reject(DropReason::DailyCap));
                continue;
            }

            let task = match_task(&proposal, &task_map);
            let entry = NewEntry {
                date: proposal.date,
                start: s,
                end: e,
                task_id: task.map(|t| t.id),
                title: proposal.title.clone(),
                category: task.map(|t| t.category.clone()).or(proposal.category.clone()),
                location: task.and_then(|t| t.location.clone()),
                is_break: proposal.is_break,
                is_meeting: proposal.is_meeting || task.is_some_and(|t| t.is_meeting),
                source: EntrySource::Ai,
                reasoning: proposal.reasoning.clone(),
            };
            inserted_ids.push(store.insert_entry(user.id, &entry, now)?);
            slots.take(s, e, entry.is_break);
            if let Some(task) = task {
                placed_tasks.insert(task.id);
            }
        }

        let mut superseded = 0;
        for old in &carry_overs {
            if old.task_id.is_some_and(|id| placed_tasks.contains(&id)) {
                store.set_entry_status(old.id, EntryStatus::Skipped)?;
                superseded += 1;
            }
        }

        let mut inserted = Vec::with_capacity(inserted_ids.len());
        for id in inserted_ids {
            if let Some(entry) = store.entry(user.id, id)? {
                inserted.push(entry);
            }
        }
        inserted.sort_by_key(|e| (e.date, e.start));

        info!(
            inserted = inserted.len(),
            dropped = dropped.len(),
            kept,
            superseded,
            "Plan stored"
        );
        Ok(PlanOutcome { start, end, inserted, dropped, kept, superseded })
    })
}

/// A user-entered timeline slot.
#[derive(Debug, Clone)]
pub struct EntryInput {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    /// Falls back to the linked task's title when empty.
    pub title: String,
    pub task_id: Option<i64>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub is_break: bool,
    pub is_meeting: bool,
}

/// Changes to an existing slot; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct EntryEdit {
    pub date: Option<NaiveDate>,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
}

fn check_slot(
    store: &Store,
    user: &User,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    ignore: Option<i64>,
) -> Result<()> {
    let prefs = &user.preferences;
    if start >= end {
        return Err(PlanError::validation("start time must be before end time"));
    }
    if start < prefs.day_start || end > prefs.day_end {
        return Err(PlanError::validation(format!(
            "slot must fall within {}-{}",
            prefs.day_start.format("%H:%M"),
            prefs.day_end.format("%H:%M")
        )));
    }
    let clash = store
        .entries_on(user.id, date)?
        .into_iter()
        .filter(|e| Some(e.id) != ignore && e.status != EntryStatus::Skipped)
        .find(|e| e.overlaps(start, end));
    if let Some(other) = clash {
        return Err(PlanError::validation(format!(
            "slot overlaps '{}' ({}-{})",
            other.title,
            other.start.format("%H:%M"),
            other.end.format("%H:%M")
        )));
    }
    Ok(())
}

pub fn add_manual_entry(
    store: &Store,
    user: &User,
    input: EntryInput,
    now: DateTime<Utc>,
) -> Result<TimelineEntry> {
    check_slot(store, user, input.date, input.start, input.end, None)?;

    let task = match input.task_id {
        Some(id) => Some(store.task(user.id, id)?.ok_or_else(|| PlanError::not_found("task", id))?),
        None => None,
    };
    let title = match input.title.trim() {
        "" => task
            .as_ref()
            .map(|t| t.title.clone())
            .ok_or_else(|| PlanError::validation("an entry needs a title or a task"))?,
        other => other.to_string(),
    };

    let entry = NewEntry {
        date: input.date,
        start: input.start,
        end: input.end,
        task_id: task.as_ref().map(|t| t.id),
        title,
        category: input.category.or_else(|| task.as_ref().map(|t| t.category.clone())),
        location: input.location.or_else(|| task.as_ref().and_then(|t| t.location.clone())),
        is_break: input.is_break,
        is_meeting: input.is_meeting || task.as_ref().is_some_and(|t| t.is_meeting),
        source: EntrySource::Manual,
        reasoning: None,
    };
    let id = store.insert_entry(user.id, &entry, now)?;
    store.entry(user.id, id)?.ok_or_else(|| PlanError::not_found("entry", id))
}

/// Applies `edit` and refreshes reward caches, since date, length and
/// category all feed reward progress.
pub fn edit_entry(
    store: &Store,
    user: &User,
    entry_id: i64,
    edit: EntryEdit,
    now: DateTime<Utc>,
) -> Result<TimelineEntry> {
    let mut entry = store
        .entry(user.id, entry_id)?
        .ok_or_else(|| PlanError::not_found("entry", entry_id))?;

    let date = edit.date.unwrap_or(entry.date);
    let start = edit.start.unwrap_or(entry.start);
    let end = edit.end.unwrap_or(entry.end);
    check_slot(store, user, date, start, end, Some(entry.id))?;

    entry.date = date;
    entry.start = start;
    entry.end = end;
    if let Some(title) = edit.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
        entry.title = title;
    }
    if let Some(category) = edit.category {
        entry.category = Some(category.trim().to_string()).filter(|c| !c.is_empty());
    }
    if let Some(location) = edit.location {
        entry.location = Some(location.trim().to_string()).filter(|l| !l.is_empty());
    }
    store.in_transaction(|store| {
        store.update_entry(&entry)?;
        crate::rewards::refresh_rules(store, user.id, now)?;
        Ok(())
    })?;
    Ok(entry)
}

/// Deletes an entry and brings reward caches back in line with what is left.
pub fn remove_entry(store: &Store, user_id: i64, entry_id: i64, now: DateTime<Utc>) -> Result<()> {
    store.in_transaction(|store| {
        if !store.delete_entry(user_id, entry_id)? {
            return Err(PlanError::not_found("entry", entry_id));
        }
        crate::rewards::refresh_rules(store, user_id, now)?;
        Ok(())
    })
}

/// A day's entries ordered by start time.
pub fn timeline_for(store: &Store, user_id: i64, date: NaiveDate) -> Result<Vec<TimelineEntry>> {
    store.entries_on(user_id, date)
}
