//! Important dates: birthdays, deadlines and other days the planner should
//! mention. Yearly dates come back every year on the same month and day.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::info;

use crate::error::{PlanError, Result};
use crate::models::{ImportantDate, NewImportantDate};
use crate::storage::Store;

/// Longest reminder lead time accepted.
pub const MAX_REMIND_DAYS: u32 = 365;

/// An important date resolved to its next occurrence.
#[derive(Debug, Clone)]
pub struct Upcoming {
    pub on: NaiveDate,
    pub days_until: i64,
    pub item: ImportantDate,
}

pub fn add_date(
    store: &Store,
    user_id: i64,
    new: NewImportantDate,
    now: DateTime<Utc>,
) -> Result<ImportantDate> {
    let title = new.title.trim().to_string();
    if title.is_empty() {
        return Err(PlanError::validation("title cannot be empty"));
    }
    if new.remind_days_before > MAX_REMIND_DAYS {
        return Err(PlanError::validation(format!(
            "reminders can start at most {MAX_REMIND_DAYS} days ahead"
        )));
    }
    let mut item = ImportantDate {
        id: 0,
        user_id,
        title,
        description: new.description.filter(|d| !d.trim().is_empty()),
        kind: new.kind,
        date: new.date,
        time: new.time,
        yearly: new.yearly,
        remind_days_before: new.remind_days_before,
        completed: false,
        created_at: now,
    };
    item.id = store.insert_important_date(&item)?;
    info!(date_id = item.id, date = %item.date, yearly = item.yearly, "Important date added");
    Ok(item)
}

/// Dates that still lie ahead of `today` (yearly ones always do), soonest
/// first. With `all`, past one-off dates are listed too, after the rest.
pub fn list_dates(store: &Store, user_id: i64, today: NaiveDate, all: bool) -> Result<Vec<ImportantDate>> {
    let mut items: Vec<ImportantDate> = store
        .important_dates_for_user(user_id)?
        .into_iter()
        .filter(|d| all || d.next_on_or_after(today).is_some())
        .collect();
    items.sort_by_key(|d| match d.next_on_or_after(today) {
        Some(on) => (false, on, d.time),
        None => (true, d.date, d.time),
    });
    Ok(items)
}

/// Flips the completed flag and returns the updated date.
pub fn toggle_date_completed(store: &Store, user_id: i64, date_id: i64) -> Result<ImportantDate> {
    let mut item = store
        .important_date(user_id, date_id)?
        .ok_or_else(|| PlanError::not_found("important date", date_id))?;
    item.completed = !item.completed;
    store.set_important_date_completed(user_id, date_id, item.completed)?;
    Ok(item)
}

pub fn remove_date(store: &Store, user_id: i64, date_id: i64) -> Result<()> {
    if !store.delete_important_date(user_id, date_id)? {
        return Err(PlanError::not_found("important date", date_id));
    }
    Ok(())
}

/// Open dates coming up within `days` of `today`, plus any whose reminder
/// window has already started. Soonest first.
pub fn upcoming(store: &Store, user_id: i64, today: NaiveDate, days: u32) -> Result<Vec<Upcoming>> {
    let mut hits: Vec<Upcoming> = store
        .important_dates_for_user(user_id)?
        .into_iter()
        .filter(|d| !d.completed)
        .filter_map(|item| {
            let on = item.next_on_or_after(today)?;
            let days_until = (on - today).num_days();
            let window = i64::from(days.max(item.remind_days_before));
            (days_until <= window).then_some(Upcoming { on, days_until, item })
        })
        .collect();
    hits.sort_by_key(|u| (u.on, u.item.time, u.item.id));
    Ok(hits)
}

/// Occurrences of open dates inside `start..=end`, by date then time.
pub fn dates_between(
    store: &Store,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(NaiveDate, ImportantDate)>> {
    let mut hits = Vec::new();
    for item in store.important_dates_for_user(user_id)?.into_iter().filter(|d| !d.completed) {
        let mut cursor = start;
        while let Some(on) = item.next_on_or_after(cursor).filter(|on| *on <= end) {
            hits.push((on, item.clone()));
            match on.succ_opt() {
                Some(next) if item.yearly => cursor = next,
                _ => break,
            }
        }
    }
    hits.sort_by_key(|(on, item)| (*on, item.time, item.id));
    Ok(hits)
}

impl ImportantDate {
    /// The first occurrence on or after `day`, if there is one.
    ///
    /// A yearly date set on 29 February falls on the 28th in other years.
    pub fn next_on_or_after(&self, day: NaiveDate) -> Option<NaiveDate> {
        if !self.yearly {
            return (self.date >= day).then_some(self.date);
        }
        let first_year = day.year().max(self.date.year());
        (first_year..=first_year + 1)
            .filter_map(|year| self.anniversary_in(year))
            .find(|on| *on >= day && *on >= self.date)
    }

    fn anniversary_in(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.date.month(), self.date.day())
            .or_else(|| NaiveDate::from_ymd_opt(year, self.date.month(), self.date.day() - 1))
    }
}
