use comfy_table::{Cell, Color};

use super::{format_minutes, new_table, Context};
use crate::error::Result;
use crate::fixed;
use crate::models::{NewFixedCommitment, NewTask, Priority, TaskStatus, TaskUpdate};
use crate::recurrence::weekday_name;
use crate::tasks::{self, TaskFilter};
use crate::urgency::compute_urgency;

pub fn cmd_task_add(ctx: &Context, new: NewTask) -> Result<()> {
    let user = ctx.user()?;
    let task = tasks::add_task(&ctx.store, user.id, new, ctx.now())?;
    println!("Task added (id = {})", task.id);
    Ok(())
}

/// Lists tasks in a formatted table, most urgent first unless another sort is asked for.
pub fn cmd_task_list(ctx: &Context, filter: &TaskFilter) -> Result<()> {
    let user = ctx.user()?;
    let today = ctx.today();
    let tasks = tasks::list_tasks(&ctx.store, user.id, filter, today)?;
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    let mut table = new_table(&[
        "ID", "Title", "Category", "Priority", "Deadline", "Time Left", "Est", "Repeat", "Urg", "Status",
    ]);

    for t in tasks {
        let urgency = compute_urgency(&t, today);
        let (deadline, time_left, overdue) = match t.deadline {
            Some(d) => {
                let days_left = (d.date() - today).num_days();
                let left = if days_left < 0 {
                    format!("{}d overdue", days_left.abs())
                } else if days_left == 0 {
                    "Today".to_string()
                } else {
                    format!("{days_left}d")
                };
                (d.format("%Y-%m-%d %H:%M").to_string(), left, days_left < 0)
            }
            None => ("-".to_string(), "-".to_string(), false),
        };

        let urgency_color = if !t.is_pending() {
            Color::Grey
        } else if urgency > 50.0 {
            Color::Red
        } else if urgency > 20.0 {
            Color::Yellow
        } else {
            Color::Green
        };
        let priority_color = match t.priority {
            Priority::High => Color::Red,
            Priority::Medium => Color::Yellow,
            Priority::Low => Color::Reset,
        };
        let status_color = match t.status {
            TaskStatus::Pending => Color::Yellow,
            TaskStatus::Completed => Color::Green,
            TaskStatus::Cancelled => Color::Grey,
        };
        let title = if t.is_meeting { format!("[meeting] {}", t.title) } else { t.title.clone() };

        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(title),
            Cell::new(&t.category),
            Cell::new(t.priority).fg(priority_color),
            Cell::new(deadline),
            Cell::new(time_left).fg(if overdue && t.is_pending() { Color::Red } else { Color::Reset }),
            Cell::new(format_minutes(t.estimated_minutes)),
            Cell::new(&t.recurrence),
            Cell::new(format!("{urgency:.1}")).fg(urgency_color),
            Cell::new(t.status).fg(status_color),
        ]);
    }

    println!("{table}");
    Ok(())
}

pub fn cmd_task_edit(ctx: &Context, id: i64, update: TaskUpdate) -> Result<()> {
    let user = ctx.user()?;
    tasks::edit_task(&ctx.store, user.id, id, update, ctx.now())?;
    println!("Task {id} updated.");
    Ok(())
}

/// Marks a task as complete. Recurring tasks get their next occurrence.
pub fn cmd_task_complete(ctx: &Context, id: i64) -> Result<()> {
    let user = ctx.user()?;
    let done = tasks::complete_task(&ctx.store, user.id, id, ctx.now())?;
    println!("Task {id} marked as complete.");
    if let Some(next) = done.next {
        let due = next.deadline.map(|d| d.date().to_string()).unwrap_or_default();
        println!("Recurring task created (id = {}) due on {due}", next.id);
    }
    Ok(())
}

pub fn cmd_task_cancel(ctx: &Context, id: i64) -> Result<()> {
    let user = ctx.user()?;
    tasks::cancel_task(&ctx.store, user.id, id, ctx.now())?;
    println!("Task {id} cancelled.");
    Ok(())
}

pub fn cmd_task_reopen(ctx: &Context, id: i64) -> Result<()> {
    let user = ctx.user()?;
    tasks::reopen_task(&ctx.store, user.id, id, ctx.now())?;
    println!("Task {id} is pending again.");
    Ok(())
}

pub fn cmd_task_remove(ctx: &Context, id: i64) -> Result<()> {
    let user = ctx.user()?;
    tasks::remove_task(&ctx.store, user.id, id)?;
    println!("Task {id} removed.");
    Ok(())
}

pub fn cmd_task_categories(ctx: &Context) -> Result<()> {
    let user = ctx.user()?;
    let categories = tasks::categories(&ctx.store, user.id)?;
    if categories.is_empty() {
        println!("No categories yet.");
    }
    for category in categories {
        println!("{category}");
    }
    Ok(())
}

pub fn cmd_fixed_add(ctx: &Context, new: NewFixedCommitment) -> Result<()> {
    let user = ctx.user()?;
    let item = fixed::add_fixed(&ctx.store, user.id, new)?;
    println!("Fixed commitment added (id = {})", item.id);
    Ok(())
}

pub fn cmd_fixed_list(ctx: &Context) -> Result<()> {
    let user = ctx.user()?;
    let items = fixed::list_fixed(&ctx.store, user.id)?;
    if items.is_empty() {
        println!("No fixed commitments.");
        return Ok(());
    }
    let mut table = new_table(&["ID", "Day", "Time", "Title", "Category", "Location", "From", "Until", "Active"]);
    for f in items {
        table.add_row(vec![
            Cell::new(f.id),
            Cell::new(weekday_name(f.weekday)),
            Cell::new(format!("{}-{}", f.start.format("%H:%M"), f.end.format("%H:%M"))),
            Cell::new(&f.title),
            Cell::new(&f.category),
            Cell::new(f.location.as_deref().unwrap_or("-")),
            Cell::new(f.start_date),
            Cell::new(f.end_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())),
            Cell::new(if f.active { "yes" } else { "no" })
                .fg(if f.active { Color::Green } else { Color::Grey }),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn cmd_fixed_toggle(ctx: &Context, id: i64) -> Result<()> {
    let user = ctx.user()?;
    let item = fixed::toggle_fixed(&ctx.store, user.id, id)?;
    let state = if item.active { "active" } else { "paused" };
    println!("Fixed commitment {id} is now {state}.");
    Ok(())
}

pub fn cmd_fixed_remove(ctx: &Context, id: i64) -> Result<()> {
    let user = ctx.user()?;
    fixed::remove_fixed(&ctx.store, user.id, id)?;
    println!("Fixed commitment {id} removed.");
    Ok(())
}
