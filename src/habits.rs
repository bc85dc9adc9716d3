//! Habits: repeated behaviours checked off once per day. Each check-in earns
//! the habit's points, recorded in a ledger; undoing a check-in refunds them.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use tracing::info;

use crate::error::{PlanError, Result};
use crate::models::{Habit, HabitCheckin, NewHabit, PointsEntry, DEFAULT_CATEGORY};
use crate::storage::Store;

/// Days covered by the completion rate.
pub const COMPLETION_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone)]
pub struct CheckinInput {
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CheckinOutcome {
    pub checkin: HabitCheckin,
    /// Zero when the day was already checked and only the value or notes changed.
    pub points_awarded: u32,
    pub balance: i64,
    pub streak: u32,
}

#[derive(Debug, Clone)]
pub struct HabitStats {
    pub habit: Habit,
    pub streak: u32,
    pub total_checkins: u32,
    pub last_checkin: Option<NaiveDate>,
    /// Checked due days over due days in the last 30 days, in percent.
    pub completion_rate: f64,
}

pub fn add_habit(store: &Store, user_id: i64, new: NewHabit, now: DateTime<Utc>) -> Result<Habit> {
    let title = new.title.trim().to_string();
    if title.is_empty() {
        return Err(PlanError::validation("title cannot be empty"));
    }
    if !new.frequency.is_recurring() {
        return Err(PlanError::validation("a habit needs a frequency: daily, weekly or weekly:mon,..."));
    }
    if new.target_value.is_some_and(|v| !(v > 0.0)) {
        return Err(PlanError::validation("target value must be positive"));
    }
    let mut habit = Habit {
        id: 0,
        user_id,
        title,
        description: new.description.filter(|d| !d.trim().is_empty()),
        category: new
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        frequency: new.frequency,
        target_value: new.target_value,
        target_unit: new.target_unit.filter(|u| !u.trim().is_empty()),
        points: new.points,
        active: true,
        created_at: now,
    };
    habit.id = store.insert_habit(&habit)?;
    info!(habit_id = habit.id, frequency = %habit.frequency, "Habit added");
    Ok(habit)
}

pub fn list_habits(store: &Store, user_id: i64) -> Result<Vec<Habit>> {
    store.habits_for_user(user_id)
}

fn owned_habit(store: &Store, user_id: i64, habit_id: i64) -> Result<Habit> {
    store
        .habit(user_id, habit_id)?
        .ok_or_else(|| PlanError::not_found("habit", habit_id))
}

/// Pauses or resumes a habit and returns it.
pub fn toggle_habit(store: &Store, user_id: i64, habit_id: i64) -> Result<Habit> {
    let mut habit = owned_habit(store, user_id, habit_id)?;
    habit.active = !habit.active;
    store.set_habit_active(user_id, habit_id, habit.active)?;
    Ok(habit)
}

/// Deletes the habit and its check-ins. Points already earned stay in the ledger.
pub fn remove_habit(store: &Store, user_id: i64, habit_id: i64) -> Result<()> {
    if !store.delete_habit(user_id, habit_id)? {
        return Err(PlanError::not_found("habit", habit_id));
    }
    Ok(())
}

fn record_points(
    store: &Store,
    user_id: i64,
    habit_id: i64,
    change: i64,
    description: String,
    now: DateTime<Utc>,
) -> Result<i64> {
    let balance_after = store.points_balance(user_id)? + change;
    store.insert_points(&PointsEntry {
        id: 0,
        user_id,
        change,
        habit_id: Some(habit_id),
        description,
        balance_after,
        created_at: now,
    })?;
    Ok(balance_after)
}

/// Checks the habit off for `input.date`.
///
/// A second check-in on the same day updates its value and notes without
/// awarding points again.
pub fn check_in(
    store: &Store,
    user_id: i64,
    habit_id: i64,
    input: CheckinInput,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<CheckinOutcome> {
    let habit = owned_habit(store, user_id, habit_id)?;
    if !habit.active {
        return Err(PlanError::validation(format!("habit {habit_id} is paused")));
    }
    if input.date > today {
        return Err(PlanError::validation("cannot check in for a future date"));
    }
    let notes = input.notes.filter(|n| !n.trim().is_empty());

    let (checkin, points_awarded, balance) = store.in_transaction(|store| {
        if let Some(mut existing) = store.checkin_on(habit_id, input.date)? {
            existing.value = input.value.or(existing.value);
            existing.notes = notes.or(existing.notes);
            store.update_checkin(&existing)?;
            return Ok((existing, 0, store.points_balance(user_id)?));
        }
        let mut checkin = HabitCheckin {
            id: 0,
            habit_id,
            user_id,
            date: input.date,
            value: input.value,
            notes,
            created_at: now,
        };
        checkin.id = store.insert_checkin(&checkin)?;
        let balance = if habit.points > 0 {
            let description = format!("Checked in: {} ({})", habit.title, input.date);
            record_points(store, user_id, habit_id, i64::from(habit.points), description, now)?
        } else {
            store.points_balance(user_id)?
        };
        Ok((checkin, habit.points, balance))
    })?;

    let streak = streak(&habit, &checked_days(store, habit_id)?, today);
    info!(habit_id, date = %checkin.date, points = points_awarded, streak, "Habit checked in");
    Ok(CheckinOutcome { checkin, points_awarded, balance, streak })
}

/// Removes the check-in on `date` and refunds the points it earned.
/// Returns the new balance.
pub fn undo_checkin(
    store: &Store,
    user_id: i64,
    habit_id: i64,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<i64> {
    let habit = owned_habit(store, user_id, habit_id)?;
    let checkin = store
        .checkin_on(habit_id, date)?
        .ok_or_else(|| PlanError::NotFound(format!("check-in for habit {habit_id} on {date}")))?;
    store.in_transaction(|store| {
        store.delete_checkin(checkin.id)?;
        if habit.points == 0 {
            return store.points_balance(user_id);
        }
        let description = format!("Undid check-in: {} ({date})", habit.title);
        record_points(store, user_id, habit_id, -i64::from(habit.points), description, now)
    })
}

fn checked_days(store: &Store, habit_id: i64) -> Result<HashSet<NaiveDate>> {
    Ok(store.checkins_for_habit(habit_id)?.into_iter().map(|c| c.date).collect())
}

impl Habit {
    /// Whether the habit is expected on `date`.
    pub fn is_due(&self, date: NaiveDate) -> bool {
        self.frequency.occurs_on(self.created_at.date_naive(), date)
    }
}

/// Consecutive due days checked, counting back from `today`.
///
/// Days the habit is not due on are skipped. An unchecked `today` does not
/// break the streak, since the day is not over yet.
pub fn streak(habit: &Habit, checked: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let first = habit.created_at.date_naive();
    let mut day = today;
    if !checked.contains(&today) {
        day -= TimeDelta::days(1);
    }
    let mut count = 0;
    while day >= first {
        if habit.is_due(day) {
            if !checked.contains(&day) {
                break;
            }
            count += 1;
        }
        day -= TimeDelta::days(1);
    }
    count
}

/// Percent of due days in the last 30 days (up to `today`) that were checked.
pub fn completion_rate(habit: &Habit, checked: &HashSet<NaiveDate>, today: NaiveDate) -> f64 {
    let from = (today - TimeDelta::days(COMPLETION_WINDOW_DAYS - 1)).max(habit.created_at.date_naive());
    let mut due = 0u32;
    let mut done = 0u32;
    let mut day = from;
    while day <= today {
        if habit.is_due(day) {
            due += 1;
            if checked.contains(&day) {
                done += 1;
            }
        }
        day += TimeDelta::days(1);
    }
    if due == 0 {
        return 0.0;
    }
    (f64::from(done) / f64::from(due) * 1000.0).round() / 10.0
}

pub fn habit_stats(store: &Store, user_id: i64, habit_id: i64, today: NaiveDate) -> Result<HabitStats> {
    let habit = owned_habit(store, user_id, habit_id)?;
    stats_for(store, habit, today)
}

/// Stats for every habit, active ones first.
pub fn all_habit_stats(store: &Store, user_id: i64, today: NaiveDate) -> Result<Vec<HabitStats>> {
    store
        .habits_for_user(user_id)?
        .into_iter()
        .map(|habit| stats_for(store, habit, today))
        .collect()
}

fn stats_for(store: &Store, habit: Habit, today: NaiveDate) -> Result<HabitStats> {
    let checkins = store.checkins_for_habit(habit.id)?;
    let checked: HashSet<NaiveDate> = checkins.iter().map(|c| c.date).collect();
    Ok(HabitStats {
        streak: streak(&habit, &checked, today),
        total_checkins: checkins.len() as u32,
        last_checkin: checkins.first().map(|c| c.date),
        completion_rate: completion_rate(&habit, &checked, today),
        habit,
    })
}

pub fn points_balance(store: &Store, user_id: i64) -> Result<i64> {
    store.points_balance(user_id)
}

/// Ledger lines, newest first.
pub fn points_history(store: &Store, user_id: i64, limit: u32) -> Result<Vec<PointsEntry>> {
    store.points_history(user_id, limit)
}
