use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ParseValueError;
use crate::recurrence::Recurrence;

/// Category assigned when none is given.
pub const DEFAULT_CATEGORY: &str = "other";

/// Implements `as_str`, `Display` and `FromStr` for a plain string-backed enum.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseValueError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ParseValueError::new($kind, s)),
                }
            }
        }
    };
}

/// Per-user scheduling window and daily work cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub day_start: NaiveTime,
    pub day_end: NaiveTime,
    pub max_daily_minutes: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            day_start: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default(),
            day_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            max_daily_minutes: 420,
        }
    }
}

impl Preferences {
    /// Length of the day window in minutes.
    pub fn window_minutes(&self) -> u32 {
        minutes_between(self.day_start, self.day_end)
    }
}

/// A registered user. The password hash never leaves the storage layer
/// except for verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
}

/// Task priority. Ordering follows urgency: `High` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

text_enum!(Priority, "priority", { High => "high", Medium => "medium", Low => "low" });

impl Priority {
    /// Multiplier applied to the urgency score.
    pub fn weight(&self) -> f64 {
        match self {
            Priority::High => 1.5,
            Priority::Medium => 1.0,
            Priority::Low => 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

text_enum!(TaskStatus, "task status", {
    Pending => "pending",
    Completed => "completed",
    Cancelled => "cancelled",
});

/// A unit of work owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub estimated_minutes: u32,
    pub deadline: Option<NaiveDateTime>,
    pub priority: Priority,
    pub category: String,
    pub is_meeting: bool,
    pub location: Option<String>,
    pub recurrence: Recurrence,
    pub recurrence_until: Option<NaiveDate>,
    /// Occurrence spawned when this task was completed.
    pub next_task_id: Option<i64>,
    pub status: TaskStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }
}

/// Fields accepted when creating a task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub estimated_minutes: u32,
    pub deadline: Option<NaiveDateTime>,
    pub priority: Priority,
    pub category: Option<String>,
    pub is_meeting: bool,
    pub location: Option<String>,
    pub recurrence: Recurrence,
    pub recurrence_until: Option<NaiveDate>,
}

/// Partial update for a task; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub estimated_minutes: Option<u32>,
    pub deadline: Option<Option<NaiveDateTime>>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub is_meeting: Option<bool>,
    pub location: Option<String>,
    pub recurrence: Option<Recurrence>,
    pub recurrence_until: Option<Option<NaiveDate>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EntryStatus {
    #[default]
    Planned,
    Done,
    Partial,
    Skipped,
}

text_enum!(EntryStatus, "entry status", {
    Planned => "planned",
    Done => "done",
    Partial => "partial",
    Skipped => "skipped",
});

impl EntryStatus {
    /// Done and partial entries count towards time totals.
    pub fn counts_time(&self) -> bool {
        matches!(self, EntryStatus::Done | EntryStatus::Partial)
    }
}

/// Where a timeline entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntrySource {
    Ai,
    Fixed,
    Manual,
}

text_enum!(EntrySource, "entry source", { Ai => "ai", Fixed => "fixed", Manual => "manual" });

/// One scheduled slot in a day plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub task_id: Option<i64>,
    pub title: String,
    pub category: Option<String>,
    pub location: Option<String>,
    pub is_break: bool,
    pub is_meeting: bool,
    pub source: EntrySource,
    pub reasoning: Option<String>,
    pub status: EntryStatus,
    pub actual_minutes: Option<u32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TimelineEntry {
    pub fn planned_minutes(&self) -> u32 {
        minutes_between(self.start, self.end)
    }

    /// Minutes credited to this entry in reports and rewards.
    ///
    /// Feedback actual minutes win for done/partial entries; otherwise the
    /// planned duration is used, and breaks never count.
    pub fn effective_minutes(&self) -> u32 {
        if !self.status.counts_time() {
            return 0;
        }
        match self.actual_minutes {
            Some(actual) if actual > 0 => actual,
            _ if self.is_break => 0,
            _ => self.planned_minutes(),
        }
    }

    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }

    pub fn overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        self.start < end && start < self.end
    }
}

/// A timeline entry before it has been stored.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub task_id: Option<i64>,
    pub title: String,
    pub category: Option<String>,
    pub location: Option<String>,
    pub is_break: bool,
    pub is_meeting: bool,
    pub source: EntrySource,
    pub reasoning: Option<String>,
}

/// Feedback logged against a timeline entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub entry_id: i64,
    pub status: EntryStatus,
    pub actual_minutes: Option<u32>,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryKind {
    Daily,
    Weekly,
    Monthly,
}

text_enum!(SummaryKind, "report period", {
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
});

/// One point of a report's per-day trend series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub planned_minutes: u32,
    pub completed_minutes: u32,
    pub completion_rate: f64,
}

/// A stored report snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub id: i64,
    pub user_id: i64,
    pub kind: SummaryKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_entries: u32,
    pub completed_entries: u32,
    pub completion_rate: f64,
    pub total_minutes: u32,
    pub category_minutes: BTreeMap<String, u32>,
    pub trend: Vec<TrendPoint>,
    pub narrative: Option<String>,
    pub suggestions: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A category time goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardRule {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub target_minutes: u32,
    pub accumulated_minutes: u32,
    pub achieved: bool,
    pub achieved_at: Option<DateTime<Utc>>,
    pub redeemed: bool,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RewardRule {
    pub fn progress_percent(&self) -> f64 {
        if self.target_minutes == 0 {
            return 100.0;
        }
        let pct = f64::from(self.accumulated_minutes) / f64::from(self.target_minutes) * 100.0;
        (pct * 10.0).round() / 10.0
    }
}

/// A weekly block placed before AI scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedCommitment {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub location: Option<String>,
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct NewFixedCommitment {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateKind {
    Birthday,
    Anniversary,
    Deadline,
    Holiday,
    #[default]
    Other,
}

text_enum!(DateKind, "date kind", {
    Birthday => "birthday",
    Anniversary => "anniversary",
    Deadline => "deadline",
    Holiday => "holiday",
    Other => "other",
});

/// A date worth remembering. Yearly dates come back on the same month and day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportantDate {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub kind: DateKind,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub yearly: bool,
    pub remind_days_before: u32,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewImportantDate {
    pub title: String,
    pub description: Option<String>,
    pub kind: DateKind,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub yearly: bool,
    pub remind_days_before: u32,
}

/// End-of-day answers, one per user and date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reflection {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub core_progress: Option<String>,
    pub long_term_value: bool,
    pub deep_work_minutes: Option<u32>,
    pub high_energy_period: Option<String>,
    pub key_insight: Option<String>,
    pub changed_judgment: bool,
    pub influences_future: bool,
    pub time_waste: Option<String>,
    pub waste_reason: Option<String>,
    pub tomorrow_focus: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a user fills in for a reflection.
#[derive(Debug, Clone, Default)]
pub struct ReflectionInput {
    pub core_progress: Option<String>,
    pub long_term_value: bool,
    pub deep_work_minutes: Option<u32>,
    pub high_energy_period: Option<String>,
    pub key_insight: Option<String>,
    pub changed_judgment: bool,
    pub influences_future: bool,
    pub time_waste: Option<String>,
    pub waste_reason: Option<String>,
    pub tomorrow_focus: Option<String>,
}

/// A repeated behaviour checked off once per due day.
///
/// `frequency` reuses the recurrence form; `weekly` means the weekday the
/// habit was created on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub frequency: Recurrence,
    pub target_value: Option<f64>,
    pub target_unit: Option<String>,
    pub points: u32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewHabit {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub frequency: Recurrence,
    pub target_value: Option<f64>,
    pub target_unit: Option<String>,
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitCheckin {
    pub id: i64,
    pub habit_id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One line of the points ledger. The balance is the sum of all changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsEntry {
    pub id: i64,
    pub user_id: i64,
    pub change: i64,
    pub habit_id: Option<i64>,
    pub description: String,
    pub balance_after: i64,
    pub created_at: DateTime<Utc>,
}

/// Whole minutes from `start` to `end`, zero when the range is empty.
pub fn minutes_between(start: NaiveTime, end: NaiveTime) -> u32 {
    let mins = (end - start).num_minutes();
    u32::try_from(mins).unwrap_or(0)
}
