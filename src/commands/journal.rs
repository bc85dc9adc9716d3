use chrono::NaiveDate;
use comfy_table::{Cell, Color};

use super::insights::rate_color;
use super::{format_minutes, new_table, Context};
use crate::dates;
use crate::error::Result;
use crate::habits::{self, CheckinInput};
use crate::models::{NewHabit, NewImportantDate, ReflectionInput};
use crate::reflection;

pub fn cmd_date_add(ctx: &Context, new: NewImportantDate) -> Result<()> {
    let user = ctx.user()?;
    let item = dates::add_date(&ctx.store, user.id, new, ctx.now())?;
    println!("Important date added (id = {})", item.id);
    Ok(())
}

pub fn cmd_date_list(ctx: &Context, all: bool) -> Result<()> {
    let user = ctx.user()?;
    let today = ctx.today();
    let items = dates::list_dates(&ctx.store, user.id, today, all)?;
    if items.is_empty() {
        println!("No important dates ahead.");
        return Ok(());
    }
    let mut table = new_table(&["ID", "Next", "Time", "Title", "Kind", "Yearly", "Remind", "Done"]);
    for d in items {
        let next = match d.next_on_or_after(today) {
            Some(on) => on.to_string(),
            None => format!("{} (past)", d.date),
        };
        table.add_row(vec![
            Cell::new(d.id),
            Cell::new(next),
            Cell::new(d.time.map(|t| t.format("%H:%M").to_string()).unwrap_or_else(|| "-".into())),
            Cell::new(&d.title),
            Cell::new(d.kind),
            Cell::new(if d.yearly { "yes" } else { "no" }),
            Cell::new(format!("{}d", d.remind_days_before)),
            Cell::new(if d.completed { "yes" } else { "no" })
                .fg(if d.completed { Color::Green } else { Color::Reset }),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn cmd_date_upcoming(ctx: &Context, days: u32) -> Result<()> {
    let user = ctx.user()?;
    let hits = dates::upcoming(&ctx.store, user.id, ctx.today(), days)?;
    if hits.is_empty() {
        println!("Nothing coming up in the next {days} days.");
        return Ok(());
    }
    for hit in hits {
        let when = match hit.days_until {
            0 => "today".to_string(),
            1 => "tomorrow".to_string(),
            n => format!("in {n} days"),
        };
        println!("{} ({when}): {} [{}]", hit.on, hit.item.title, hit.item.kind);
    }
    Ok(())
}

pub fn cmd_date_done(ctx: &Context, id: i64) -> Result<()> {
    let user = ctx.user()?;
    let item = dates::toggle_date_completed(&ctx.store, user.id, id)?;
    let state = if item.completed { "done" } else { "open" };
    println!("Important date {id} is now {state}.");
    Ok(())
}

pub fn cmd_date_remove(ctx: &Context, id: i64) -> Result<()> {
    let user = ctx.user()?;
    dates::remove_date(&ctx.store, user.id, id)?;
    println!("Important date {id} removed.");
    Ok(())
}

pub fn cmd_reflect_save(ctx: &Context, date: Option<NaiveDate>, input: ReflectionInput) -> Result<()> {
    let user = ctx.user()?;
    let date = date.unwrap_or_else(|| ctx.today());
    reflection::save_reflection(&ctx.store, user.id, date, input, ctx.now())?;
    println!("Reflection for {date} saved.");
    Ok(())
}

pub fn cmd_reflect_show(ctx: &Context, date: Option<NaiveDate>) -> Result<()> {
    let user = ctx.user()?;
    let r = reflection::get_reflection(&ctx.store, user.id, date.unwrap_or_else(|| ctx.today()))?;
    println!("Reflection for {}", r.date);
    if let Some(minutes) = r.deep_work_minutes {
        println!("  Deep work: {}", format_minutes(minutes));
    }
    for (label, text) in r.answers() {
        println!("  {label}: {text}");
    }
    println!(
        "  Long-term value: {}  Changed judgment: {}  Influences future: {}",
        yes_no(r.long_term_value),
        yes_no(r.changed_judgment),
        yes_no(r.influences_future)
    );
    Ok(())
}

pub fn cmd_reflect_list(ctx: &Context, limit: usize) -> Result<()> {
    let user = ctx.user()?;
    let items = reflection::list_reflections(&ctx.store, user.id, Some(limit))?;
    if items.is_empty() {
        println!("No reflections yet. Try `planwise reflect save --progress \"...\"`.");
        return Ok(());
    }
    let mut table = new_table(&["Date", "Deep work", "Core progress", "Tomorrow"]);
    for r in items {
        table.add_row(vec![
            Cell::new(r.date),
            Cell::new(r.deep_work_minutes.map(format_minutes).unwrap_or_else(|| "-".into())),
            Cell::new(r.core_progress.as_deref().unwrap_or("-")),
            Cell::new(r.tomorrow_focus.as_deref().unwrap_or("-")),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn cmd_reflect_stats(ctx: &Context) -> Result<()> {
    let user = ctx.user()?;
    let stats = reflection::reflection_stats(&ctx.store, user.id)?;
    println!("Reflections: {}", stats.total);
    println!("Average deep work: {:.1} minutes", stats.avg_deep_work_minutes);
    println!("Long-term value: {:.1}%", stats.long_term_ratio);
    println!("Changed judgment: {:.1}%", stats.changed_judgment_ratio);
    println!("Influences future: {:.1}%", stats.influences_future_ratio);
    Ok(())
}

pub fn cmd_reflect_remove(ctx: &Context, date: NaiveDate) -> Result<()> {
    let user = ctx.user()?;
    reflection::remove_reflection(&ctx.store, user.id, date)?;
    println!("Reflection for {date} removed.");
    Ok(())
}

pub fn cmd_habit_add(ctx: &Context, new: NewHabit) -> Result<()> {
    let user = ctx.user()?;
    let habit = habits::add_habit(&ctx.store, user.id, new, ctx.now())?;
    println!("Habit added (id = {})", habit.id);
    Ok(())
}

/// Lists habits with their streak and 30-day completion rate.
pub fn cmd_habit_list(ctx: &Context) -> Result<()> {
    let user = ctx.user()?;
    let today = ctx.today();
    let stats = habits::all_habit_stats(&ctx.store, user.id, today)?;
    if stats.is_empty() {
        println!("No habits yet.");
        return Ok(());
    }
    let mut table =
        new_table(&["ID", "Title", "Frequency", "Target", "Points", "Streak", "30 days", "Today", "Active"]);
    for s in stats {
        let h = &s.habit;
        let target = match (h.target_value, h.target_unit.as_deref()) {
            (Some(value), Some(unit)) => format!("{value} {unit}"),
            (Some(value), None) => value.to_string(),
            _ => "-".into(),
        };
        let checked_today = s.last_checkin == Some(today);
        table.add_row(vec![
            Cell::new(h.id),
            Cell::new(&h.title),
            Cell::new(&h.frequency),
            Cell::new(target),
            Cell::new(h.points),
            Cell::new(s.streak),
            Cell::new(format!("{:.1}%", s.completion_rate)).fg(rate_color(s.completion_rate)),
            Cell::new(if checked_today { "done" } else if h.is_due(today) { "due" } else { "-" })
                .fg(if checked_today { Color::Green } else { Color::Reset }),
            Cell::new(if h.active { "yes" } else { "no" })
                .fg(if h.active { Color::Green } else { Color::Grey }),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn cmd_habit_checkin(ctx: &Context, id: i64, input: CheckinInput) -> Result<()> {
    let user = ctx.user()?;
    let outcome = habits::check_in(&ctx.store, user.id, id, input, ctx.today(), ctx.now())?;
    if outcome.points_awarded > 0 {
        println!(
            "Checked in for {} (+{} points, balance {}). Streak: {}.",
            outcome.checkin.date, outcome.points_awarded, outcome.balance, outcome.streak
        );
    } else {
        println!("Check-in for {} updated. Streak: {}.", outcome.checkin.date, outcome.streak);
    }
    Ok(())
}

pub fn cmd_habit_undo(ctx: &Context, id: i64, date: Option<NaiveDate>) -> Result<()> {
    let user = ctx.user()?;
    let date = date.unwrap_or_else(|| ctx.today());
    let balance = habits::undo_checkin(&ctx.store, user.id, id, date, ctx.now())?;
    println!("Check-in for {date} removed. Balance: {balance} points.");
    Ok(())
}

pub fn cmd_habit_toggle(ctx: &Context, id: i64) -> Result<()> {
    let user = ctx.user()?;
    let habit = habits::toggle_habit(&ctx.store, user.id, id)?;
    let state = if habit.active { "active" } else { "paused" };
    println!("Habit {id} is now {state}.");
    Ok(())
}

pub fn cmd_habit_remove(ctx: &Context, id: i64) -> Result<()> {
    let user = ctx.user()?;
    habits::remove_habit(&ctx.store, user.id, id)?;
    println!("Habit {id} removed.");
    Ok(())
}

pub fn cmd_points(ctx: &Context, limit: u32) -> Result<()> {
    let user = ctx.user()?;
    println!("Balance: {} points", habits::points_balance(&ctx.store, user.id)?);
    let history = habits::points_history(&ctx.store, user.id, limit)?;
    if history.is_empty() {
        return Ok(());
    }
    let mut table = new_table(&["When", "Change", "Balance", "Description"]);
    for p in history {
        table.add_row(vec![
            Cell::new(p.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(format!("{:+}", p.change)).fg(if p.change >= 0 { Color::Green } else { Color::Red }),
            Cell::new(p.balance_after),
            Cell::new(&p.description),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
