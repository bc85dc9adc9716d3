//! Fixed commitments: weekly blocks that are placed before AI scheduling.

use chrono::{Datelike, NaiveDate};
use tracing::info;

use crate::error::{PlanError, Result};
use crate::models::{EntrySource, FixedCommitment, NewEntry, NewFixedCommitment, DEFAULT_CATEGORY};
use crate::storage::Store;

pub fn add_fixed(store: &Store, user_id: i64, new: NewFixedCommitment) -> Result<FixedCommitment> {
    let title = new.title.trim().to_string();
    if title.is_empty() {
        return Err(PlanError::validation("title cannot be empty"));
    }
    if new.start >= new.end {
        return Err(PlanError::validation("start time must be before end time"));
    }
    if new.end_date.is_some_and(|end| end < new.start_date) {
        return Err(PlanError::validation("end date must not be before start date"));
    }
    let mut fixed = FixedCommitment {
        id: 0,
        user_id,
        title,
        description: new.description.filter(|d| !d.trim().is_empty()),
        category: new
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        location: new.location.filter(|l| !l.trim().is_empty()),
        weekday: new.weekday,
        start: new.start,
        end: new.end,
        start_date: new.start_date,
        end_date: new.end_date,
        active: true,
    };
    fixed.id = store.insert_fixed(&fixed)?;
    info!(fixed_id = fixed.id, weekday = %fixed.weekday, "Fixed commitment added");
    Ok(fixed)
}

pub fn list_fixed(store: &Store, user_id: i64) -> Result<Vec<FixedCommitment>> {
    store.fixed_for_user(user_id)
}

/// Flips the active flag and returns the updated commitment.
pub fn toggle_fixed(store: &Store, user_id: i64, fixed_id: i64) -> Result<FixedCommitment> {
    let mut fixed = store
        .fixed(user_id, fixed_id)?
        .ok_or_else(|| PlanError::not_found("fixed commitment", fixed_id))?;
    fixed.active = !fixed.active;
    store.set_fixed_active(user_id, fixed_id, fixed.active)?;
    Ok(fixed)
}

pub fn remove_fixed(store: &Store, user_id: i64, fixed_id: i64) -> Result<()> {
    if !store.delete_fixed(user_id, fixed_id)? {
        return Err(PlanError::not_found("fixed commitment", fixed_id));
    }
    Ok(())
}

impl FixedCommitment {
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        self.active
            && date.weekday() == self.weekday
            && date >= self.start_date
            && self.end_date.map_or(true, |end| date <= end)
    }

    pub fn to_entry(&self, date: NaiveDate) -> NewEntry {
        NewEntry {
            date,
            start: self.start,
            end: self.end,
            task_id: None,
            title: self.title.clone(),
            category: Some(self.category.clone()),
            location: self.location.clone(),
            is_break: false,
            is_meeting: false,
            source: EntrySource::Fixed,
            reasoning: None,
        }
    }
}

/// Commitments that fall on `date`, in start-time order.
pub fn occurrences_on(commitments: &[FixedCommitment], date: NaiveDate) -> Vec<&FixedCommitment> {
    let mut hits: Vec<&FixedCommitment> = commitments.iter().filter(|c| c.occurs_on(date)).collect();
    hits.sort_by_key(|c| c.start);
    hits
}
