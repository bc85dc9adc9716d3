use chrono::{NaiveDate, TimeDelta};
use comfy_table::{Cell, Color};

use super::{format_minutes, new_table, Context};
use crate::error::{PlanError, Result};
use crate::feedback::{self, FeedbackInput, FeedbackOutcome};
use crate::models::{EntryStatus, TimelineEntry};
use crate::scheduler::{self, EntryEdit, EntryInput, PlanScope};

pub fn cmd_plan_generate(ctx: &Context, scope: PlanScope, start: Option<NaiveDate>) -> Result<()> {
    let user = ctx.user()?;
    let start = start.unwrap_or_else(|| ctx.today());
    let client = ctx.client().map_err(PlanError::Ai)?;
    let outcome =
        scheduler::generate_plan(&ctx.store, &client, &ctx.config.ai, &user, scope, start, ctx.now())?;

    println!(
        "Plan for {} to {}: {} entries added.",
        outcome.start,
        outcome.end,
        outcome.inserted.len()
    );
    if outcome.kept > 0 {
        println!("Kept {} entries that already have logged time.", outcome.kept);
    }
    if outcome.superseded > 0 {
        println!("Skipped {} unfinished entries from earlier plans.", outcome.superseded);
    }
    for dropped in &outcome.dropped {
        println!("  dropped {} '{}': {}", dropped.date, dropped.title, dropped.reason);
    }
    print_entries(&outcome.inserted);
    Ok(())
}

/// Prints the timeline for `days` days starting at `date`.
pub fn cmd_plan_show(ctx: &Context, date: Option<NaiveDate>, days: u32) -> Result<()> {
    let user = ctx.user()?;
    let start = date.unwrap_or_else(|| ctx.today());
    let end = start + TimeDelta::days(i64::from(days.max(1)) - 1);
    let entries = ctx.store.entries_between(user.id, start, end)?;
    if entries.is_empty() {
        println!("Nothing planned for {start}. Try `planwise plan today`.");
        return Ok(());
    }
    print_entries(&entries);
    Ok(())
}

pub fn cmd_plan_add(ctx: &Context, input: EntryInput) -> Result<()> {
    let user = ctx.user()?;
    let entry = scheduler::add_manual_entry(&ctx.store, &user, input, ctx.now())?;
    println!("Entry added (id = {})", entry.id);
    Ok(())
}

pub fn cmd_plan_edit(ctx: &Context, id: i64, edit: EntryEdit) -> Result<()> {
    let user = ctx.user()?;
    scheduler::edit_entry(&ctx.store, &user, id, edit, ctx.now())?;
    println!("Entry {id} updated.");
    Ok(())
}

pub fn cmd_plan_remove(ctx: &Context, id: i64) -> Result<()> {
    let user = ctx.user()?;
    scheduler::remove_entry(&ctx.store, user.id, id, ctx.now())?;
    println!("Entry {id} removed.");
    Ok(())
}

pub fn cmd_feedback(ctx: &Context, id: i64, input: FeedbackInput) -> Result<()> {
    let user = ctx.user()?;
    let outcome = feedback::record_feedback(&ctx.store, user.id, id, input, ctx.now())?;
    println!("Feedback saved for entry {id}.");
    print_outcome(&outcome);
    Ok(())
}

pub fn cmd_status(ctx: &Context, id: i64, status: EntryStatus) -> Result<()> {
    let user = ctx.user()?;
    let outcome = feedback::set_entry_status(&ctx.store, user.id, id, status, ctx.now())?;
    println!("Entry {id} is now {}.", outcome.entry.status);
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &FeedbackOutcome) {
    if let Some(done) = &outcome.completed {
        println!("Task {} completed.", done.task.id);
        if let Some(next) = &done.next {
            println!("Recurring task created (id = {}).", next.id);
        }
    }
    if let Some(task_id) = outcome.reopened_task {
        println!("Task {task_id} is pending again.");
    }
    for rule in &outcome.newly_achieved {
        println!("Reward unlocked: {} ({} minutes of {}).", rule.title, rule.accumulated_minutes, rule.category);
    }
}

fn status_color(status: EntryStatus) -> Color {
    match status {
        EntryStatus::Planned => Color::Reset,
        EntryStatus::Done => Color::Green,
        EntryStatus::Partial => Color::Yellow,
        EntryStatus::Skipped => Color::Grey,
    }
}

fn print_entries(entries: &[TimelineEntry]) {
    if entries.is_empty() {
        return;
    }
    let mut table = new_table(&["ID", "Date", "Time", "Title", "Category", "Length", "Source", "Status", "Logged"]);
    for e in entries {
        let mut title = e.title.clone();
        if e.is_meeting {
            title = format!("[meeting] {title}");
        }
        if let Some(location) = &e.location {
            title = format!("{title} @ {location}");
        }
        table.add_row(vec![
            Cell::new(e.id),
            Cell::new(e.date),
            Cell::new(format!("{}-{}", e.start.format("%H:%M"), e.end.format("%H:%M"))),
            Cell::new(title).fg(if e.is_break { Color::Grey } else { Color::Reset }),
            Cell::new(e.category_label()),
            Cell::new(format_minutes(e.planned_minutes())),
            Cell::new(e.source),
            Cell::new(e.status).fg(status_color(e.status)),
            Cell::new(e.actual_minutes.map(format_minutes).unwrap_or_else(|| "-".into())),
        ]);
    }
    println!("{table}");
}
