use std::fmt::Write as _;

use chrono::{Datelike, NaiveDate};

use crate::models::{FixedCommitment, ImportantDate, Preferences, Task, TimelineEntry};
use crate::recurrence::weekday_name;

pub const SYSTEM_PROMPT: &str = "You are a careful personal scheduling assistant. \
You arrange a user's tasks into concrete time slots and reply with the requested JSON only.";

/// Everything the model is told about one planning request.
pub struct PromptContext<'a> {
    pub preferences: &'a Preferences,
    pub dates: &'a [NaiveDate],
    /// Fixed commitments per date, in the same order as `dates`.
    pub fixed: &'a [(NaiveDate, Vec<&'a FixedCommitment>)],
    /// Important dates falling inside the planned range.
    pub important_dates: &'a [(NaiveDate, ImportantDate)],
    pub carry_overs: &'a [TimelineEntry],
    /// Pending tasks, most urgent first.
    pub tasks: &'a [Task],
}

pub fn build_prompt(ctx: &PromptContext<'_>) -> String {
    let prefs = ctx.preferences;
    let mut out = String::new();

    let first = ctx.dates.first().copied();
    let last = ctx.dates.last().copied();
    if let (Some(first), Some(last)) = (first, last) {
        if first == last {
            let _ = writeln!(out, "Plan the day {} ({}).", first, weekday_name(first.weekday()));
        } else {
            let _ = writeln!(out, "Plan each day from {first} to {last}.");
        }
    }
    let _ = writeln!(
        out,
        "Working window: {} to {}. At most {} minutes of work per day, breaks excluded.",
        prefs.day_start.format("%H:%M"),
        prefs.day_end.format("%H:%M"),
        prefs.max_daily_minutes
    );

    let has_fixed = ctx.fixed.iter().any(|(_, items)| !items.is_empty());
    if has_fixed {
        out.push_str("\nFixed commitments (already placed, do not overlap them):\n");
        for (date, items) in ctx.fixed {
            for item in items {
                let location = item.location.as_deref().map(|l| format!(" @ {l}")).unwrap_or_default();
                let _ = writeln!(
                    out,
                    "- {date} {}-{}: {}{location}",
                    item.start.format("%H:%M"),
                    item.end.format("%H:%M"),
                    item.title
                );
            }
        }
    }

    if !ctx.important_dates.is_empty() {
        out.push_str("\nImportant dates (mention them in the plan; a timed one blocks its hour):\n");
        for (date, item) in ctx.important_dates {
            let time = item.time.map(|t| format!(" {}", t.format("%H:%M"))).unwrap_or_default();
            let _ = writeln!(out, "- {date}{time}: {} ({})", item.title, item.kind);
        }
    }

    if !ctx.carry_overs.is_empty() {
        out.push_str("\nUnfinished from earlier plans (place these first):\n");
        for entry in ctx.carry_overs {
            let _ = writeln!(
                out,
                "- {} (task_id {}, planned {} but not done)",
                entry.title,
                entry.task_id.unwrap_or_default(),
                entry.date
            );
        }
    }

    let (meetings, regular): (Vec<&Task>, Vec<&Task>) = ctx.tasks.iter().partition(|t| t.is_meeting);
    if !meetings.is_empty() {
        out.push_str("\nMeetings (highest priority, mark with is_meeting):\n");
        for task in meetings {
            write_task_line(&mut out, task);
        }
    }
    if !regular.is_empty() {
        out.push_str("\nTasks, most urgent first:\n");
        for task in regular {
            write_task_line(&mut out, task);
        }
    }

    out.push_str(
        "\nRules:\n\
         - Only use times inside the working window.\n\
         - Never overlap two slots or a fixed commitment.\n\
         - Leave short breaks between long tasks and mark them with is_break.\n\
         - Group tasks of the same category where possible.\n\
         - Use the task_id of the task a slot works on.\n\
         \nReply with JSON only, in this shape:\n\
         {\"days\":[{\"date\":\"YYYY-MM-DD\",\"entries\":[{\"start\":\"HH:MM\",\"end\":\"HH:MM\",\
         \"title\":\"...\",\"task_id\":1,\"category\":\"...\",\"is_break\":false,\
         \"is_meeting\":false,\"reasoning\":\"...\"}]}]}\n",
    );
    out
}

fn write_task_line(out: &mut String, task: &Task) {
    let deadline = task
        .deadline
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "none".to_string());
    let location = task.location.as_deref().map(|l| format!(" | location: {l}")).unwrap_or_default();
    let _ = writeln!(
        out,
        "- [task_id {}] {} | deadline: {deadline} | priority: {} | estimate: {} min | category: {}{location}",
        task.id, task.title, task.priority, task.estimated_minutes, task.category
    );
}
