use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ParseValueError;

/// How often a task comes back after it is completed.
///
/// Textual form (CLI and database): `none`, `daily`, `weekly`, or
/// `weekly:mon,wed,fri`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    WeeklyOn(Vec<Weekday>),
}

impl Recurrence {
    pub fn is_recurring(&self) -> bool {
        !matches!(self, Recurrence::None)
    }

    /// The first occurrence date strictly after `date`.
    pub fn next_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Recurrence::None => None,
            Recurrence::Daily => Some(date + Duration::days(1)),
            Recurrence::Weekly => Some(date + Duration::weeks(1)),
            Recurrence::WeeklyOn(days) => {
                if days.is_empty() {
                    return None;
                }
                (1..=7)
                    .map(|offset| date + Duration::days(offset))
                    .find(|d| days.contains(&d.weekday()))
            }
        }
    }

    /// Whether a series anchored on `anchor` has an occurrence on `date`.
    pub fn occurs_on(&self, anchor: NaiveDate, date: NaiveDate) -> bool {
        if date < anchor {
            return false;
        }
        match self {
            Recurrence::None => date == anchor,
            Recurrence::Daily => true,
            Recurrence::Weekly => date.weekday() == anchor.weekday(),
            Recurrence::WeeklyOn(days) => days.contains(&date.weekday()),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recurrence::None => write!(f, "none"),
            Recurrence::Daily => write!(f, "daily"),
            Recurrence::Weekly => write!(f, "weekly"),
            Recurrence::WeeklyOn(days) => {
                let names: Vec<String> = days.iter().map(|d| weekday_name(*d).to_string()).collect();
                write!(f, "weekly:{}", names.join(","))
            }
        }
    }
}

impl FromStr for Recurrence {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        match lowered.as_str() {
            "" | "none" => Ok(Recurrence::None),
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            other => {
                let Some(list) = other.strip_prefix("weekly:") else {
                    return Err(ParseValueError::new("recurrence", s));
                };
                let mut days = Vec::new();
                for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    let day = part
                        .parse::<Weekday>()
                        .map_err(|_| ParseValueError::new("weekday", part))?;
                    if !days.contains(&day) {
                        days.push(day);
                    }
                }
                if days.is_empty() {
                    return Err(ParseValueError::new("recurrence", s));
                }
                days.sort_by_key(|d| d.num_days_from_monday());
                Ok(Recurrence::WeeklyOn(days))
            }
        }
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}
