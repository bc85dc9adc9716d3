use comfy_table::{Cell, Color};

use super::{format_minutes, new_table, Context};
use crate::ai::CompletionClient;
use crate::error::Result;
use crate::models::{Summary, SummaryKind};
use crate::report;
use crate::rewards::{self, NewRewardRule};

const BAR_WIDTH: u32 = 40;

/// Parses a chart range: `30`, `90`, `30d` or `all`.
pub fn parse_chart_range(text: &str) -> std::result::Result<Option<u32>, String> {
    let trimmed = text.trim().to_lowercase();
    if trimmed == "all" {
        return Ok(None);
    }
    trimmed
        .trim_end_matches('d')
        .parse::<u32>()
        .map(Some)
        .map_err(|_| format!("invalid range '{text}'. Use 30, 90 or all."))
}

pub fn cmd_report_generate(ctx: &Context, kind: SummaryKind, no_ai: bool) -> Result<()> {
    let user = ctx.user()?;
    let client = if no_ai || !ctx.config.ai.is_configured() {
        None
    } else {
        match ctx.client() {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "AI client unavailable, report without narrative");
                None
            }
        }
    };
    let summary = report::generate_summary(
        &ctx.store,
        user.id,
        kind,
        ctx.today(),
        client.as_ref().map(|c| c as &dyn CompletionClient),
        &ctx.config.ai,
        ctx.now(),
    )?;
    print_summary(&summary);
    Ok(())
}

pub fn cmd_report_list(ctx: &Context) -> Result<()> {
    let user = ctx.user()?;
    let summaries = report::list_summaries(&ctx.store, user.id)?;
    if summaries.is_empty() {
        println!("No reports yet. Try `planwise report generate weekly`.");
        return Ok(());
    }
    let mut table = new_table(&["ID", "Kind", "From", "To", "Entries", "Done", "Rate", "Logged"]);
    for s in summaries {
        table.add_row(vec![
            Cell::new(s.id),
            Cell::new(s.kind),
            Cell::new(s.start_date),
            Cell::new(s.end_date),
            Cell::new(s.total_entries),
            Cell::new(s.completed_entries),
            Cell::new(format!("{:.1}%", s.completion_rate)).fg(rate_color(s.completion_rate)),
            Cell::new(format_minutes(s.total_minutes)),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn cmd_report_show(ctx: &Context, id: i64) -> Result<()> {
    let user = ctx.user()?;
    let summary = report::get_summary(&ctx.store, user.id, id)?;
    print_summary(&summary);
    Ok(())
}

pub fn cmd_report_notes(ctx: &Context, id: i64, notes: &str) -> Result<()> {
    let user = ctx.user()?;
    report::add_summary_notes(&ctx.store, user.id, id, notes)?;
    println!("Notes saved on report {id}.");
    Ok(())
}

pub fn cmd_report_chart(ctx: &Context, days: Option<u32>) -> Result<()> {
    let user = ctx.user()?;
    let chart = report::category_chart(&ctx.store, user.id, days, ctx.today())?;
    if chart.is_empty() {
        println!("No logged time in this range.");
        return Ok(());
    }
    let max = chart.iter().map(|(_, m)| *m).max().unwrap_or(1).max(1);
    let width = chart.iter().map(|(c, _)| c.chars().count()).max().unwrap_or(0);
    for (category, minutes) in chart {
        let bar = "█".repeat((minutes * BAR_WIDTH / max).max(1) as usize);
        println!("{category:<width$}  {bar} {}", format_minutes(minutes));
    }
    Ok(())
}

pub(super) fn rate_color(rate: f64) -> Color {
    if rate >= 80.0 {
        Color::Green
    } else if rate >= 50.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn print_summary(summary: &Summary) {
    println!(
        "{} report {} to {} (id = {})",
        summary.kind, summary.start_date, summary.end_date, summary.id
    );
    println!(
        "Completed {} of {} entries ({:.1}%), {} logged.",
        summary.completed_entries,
        summary.total_entries,
        summary.completion_rate,
        format_minutes(summary.total_minutes)
    );

    if !summary.category_minutes.is_empty() {
        let mut table = new_table(&["Category", "Time"]);
        for (category, minutes) in &summary.category_minutes {
            table.add_row(vec![Cell::new(category), Cell::new(format_minutes(*minutes))]);
        }
        println!("{table}");
    }

    if summary.trend.len() > 1 {
        let mut table = new_table(&["Date", "Planned", "Done", "Rate"]);
        for point in &summary.trend {
            table.add_row(vec![
                Cell::new(point.date),
                Cell::new(format_minutes(point.planned_minutes)),
                Cell::new(format_minutes(point.completed_minutes)),
                Cell::new(format!("{:.1}%", point.completion_rate)).fg(rate_color(point.completion_rate)),
            ]);
        }
        println!("{table}");
    }

    if let Some(narrative) = &summary.narrative {
        println!("\n{narrative}");
    }
    if let Some(suggestions) = &summary.suggestions {
        println!("\n{suggestions}");
    }
    if let Some(notes) = &summary.notes {
        println!("\nNotes: {notes}");
    }
}

pub fn cmd_reward_add(ctx: &Context, new: NewRewardRule) -> Result<()> {
    let user = ctx.user()?;
    let rule = rewards::add_rule(&ctx.store, user.id, new, ctx.now())?;
    println!("Reward added (id = {})", rule.id);
    if rule.achieved {
        println!("Already achieved: {} of {} minutes.", rule.accumulated_minutes, rule.target_minutes);
    }
    Ok(())
}

pub fn cmd_reward_list(ctx: &Context) -> Result<()> {
    let user = ctx.user()?;
    rewards::refresh_rules(&ctx.store, user.id, ctx.now())?;
    let rules = rewards::list_rules(&ctx.store, user.id)?;
    if rules.is_empty() {
        println!("No rewards defined.");
        return Ok(());
    }
    let mut table = new_table(&["ID", "Reward", "Category", "Progress", "Percent", "State"]);
    for r in rules {
        let (state, color) = if r.redeemed {
            ("redeemed", Color::Grey)
        } else if r.achieved {
            ("ready", Color::Green)
        } else {
            ("in progress", Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(r.id),
            Cell::new(&r.title),
            Cell::new(&r.category),
            Cell::new(format!(
                "{} / {}",
                format_minutes(r.accumulated_minutes),
                format_minutes(r.target_minutes)
            )),
            Cell::new(format!("{:.1}%", r.progress_percent())),
            Cell::new(state).fg(color),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn cmd_reward_remove(ctx: &Context, id: i64) -> Result<()> {
    let user = ctx.user()?;
    rewards::remove_rule(&ctx.store, user.id, id)?;
    println!("Reward {id} removed.");
    Ok(())
}

pub fn cmd_reward_redeem(ctx: &Context, id: i64) -> Result<()> {
    let user = ctx.user()?;
    let rule = rewards::redeem_rule(&ctx.store, user.id, id, ctx.now())?;
    println!("Enjoy: {}!", rule.title);
    Ok(())
}

pub fn cmd_reward_progress(ctx: &Context) -> Result<()> {
    let user = ctx.user()?;
    let progress = rewards::category_progress(&ctx.store, user.id)?;
    if progress.is_empty() {
        println!("No logged time yet.");
        return Ok(());
    }
    let mut table = new_table(&["Category", "Time", "Entries"]);
    for p in progress {
        table.add_row(vec![Cell::new(&p.category), Cell::new(format_minutes(p.minutes)), Cell::new(p.entries)]);
    }
    println!("{table}");
    Ok(())
}
