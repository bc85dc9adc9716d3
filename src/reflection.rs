//! Daily reflections: a short end-of-day review, one per date, that later
//! feeds the report narrative.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use crate::error::{PlanError, Result};
use crate::models::{Reflection, ReflectionInput};
use crate::storage::Store;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Totals over all of a user's reflections. Ratios are percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionStats {
    pub total: u32,
    /// Mean over the reflections that recorded deep work.
    pub avg_deep_work_minutes: f64,
    pub long_term_ratio: f64,
    pub changed_judgment_ratio: f64,
    pub influences_future_ratio: f64,
}

fn clean(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// Saves the reflection for `date`, replacing an earlier one for that day.
pub fn save_reflection(
    store: &Store,
    user_id: i64,
    date: NaiveDate,
    input: ReflectionInput,
    now: DateTime<Utc>,
) -> Result<Reflection> {
    if input.deep_work_minutes.is_some_and(|m| m > MINUTES_PER_DAY) {
        return Err(PlanError::validation("deep work cannot exceed 1440 minutes"));
    }
    let reflection = Reflection {
        id: 0,
        user_id,
        date,
        core_progress: clean(input.core_progress),
        long_term_value: input.long_term_value,
        deep_work_minutes: input.deep_work_minutes,
        high_energy_period: clean(input.high_energy_period),
        key_insight: clean(input.key_insight),
        changed_judgment: input.changed_judgment,
        influences_future: input.influences_future,
        time_waste: clean(input.time_waste),
        waste_reason: clean(input.waste_reason),
        tomorrow_focus: clean(input.tomorrow_focus),
        created_at: now,
        updated_at: now,
    };
    if reflection.is_blank() {
        return Err(PlanError::validation("a reflection needs at least one answer"));
    }
    store.upsert_reflection(&reflection)?;
    info!(user_id, %date, "Reflection saved");
    get_reflection(store, user_id, date)
}

pub fn get_reflection(store: &Store, user_id: i64, date: NaiveDate) -> Result<Reflection> {
    store
        .reflection_on(user_id, date)?
        .ok_or_else(|| PlanError::NotFound(format!("reflection for {date}")))
}

/// Newest first, at most `limit` when given.
pub fn list_reflections(store: &Store, user_id: i64, limit: Option<usize>) -> Result<Vec<Reflection>> {
    let mut all = store.reflections_for_user(user_id)?;
    if let Some(limit) = limit {
        all.truncate(limit);
    }
    Ok(all)
}

pub fn remove_reflection(store: &Store, user_id: i64, date: NaiveDate) -> Result<()> {
    if !store.delete_reflection(user_id, date)? {
        return Err(PlanError::NotFound(format!("reflection for {date}")));
    }
    Ok(())
}

pub fn reflection_stats(store: &Store, user_id: i64) -> Result<ReflectionStats> {
    let all = store.reflections_for_user(user_id)?;
    let total = all.len() as u32;
    let deep_work: Vec<u32> = all.iter().filter_map(|r| r.deep_work_minutes).collect();
    let avg_deep_work_minutes = if deep_work.is_empty() {
        0.0
    } else {
        round1(f64::from(deep_work.iter().sum::<u32>()) / deep_work.len() as f64)
    };
    let ratio = |flag: fn(&Reflection) -> bool| {
        if total == 0 {
            return 0.0;
        }
        let hits = all.iter().filter(|r| flag(r)).count() as u32;
        round1(f64::from(hits) / f64::from(total) * 100.0)
    };
    Ok(ReflectionStats {
        total,
        avg_deep_work_minutes,
        long_term_ratio: ratio(|r| r.long_term_value),
        changed_judgment_ratio: ratio(|r| r.changed_judgment),
        influences_future_ratio: ratio(|r| r.influences_future),
    })
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl Reflection {
    fn is_blank(&self) -> bool {
        !self.long_term_value
            && !self.changed_judgment
            && !self.influences_future
            && self.deep_work_minutes.is_none()
            && self.answers().next().is_none()
    }

    /// The free-text answers that were filled in, labelled.
    pub fn answers(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        [
            ("Core progress", &self.core_progress),
            ("High-energy period", &self.high_energy_period),
            ("Key insight", &self.key_insight),
            ("Time waste", &self.time_waste),
            ("Waste reason", &self.waste_reason),
            ("Tomorrow's focus", &self.tomorrow_focus),
        ]
        .into_iter()
        .filter_map(|(label, text)| text.as_deref().map(|t| (label, t)))
    }
}
