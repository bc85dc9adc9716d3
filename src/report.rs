//! Report aggregator: completion rate, category totals and a per-day trend
//! over a day/week/month window, with an optional AI narrative.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};
use tracing::{info, warn};

use crate::ai::{CompletionClient, CompletionRequest};
use crate::config::AiConfig;
use crate::error::{PlanError, Result};
use crate::models::{EntryStatus, Reflection, Summary, SummaryKind, TimelineEntry, TrendPoint};
use crate::storage::Store;

/// Stored in place of a narrative when the completion call fails.
pub const NARRATIVE_FALLBACK: &str = "AI summary unavailable; check the AI configuration and try again.";

const REPORT_SYSTEM_PROMPT: &str = "You are a productivity analyst. You read time-tracking \
statistics and give a short, honest review followed by practical suggestions.";

/// Computed figures for one window.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub total_entries: u32,
    pub completed_entries: u32,
    pub completion_rate: f64,
    pub total_minutes: u32,
    pub category_minutes: BTreeMap<String, u32>,
    pub trend: Vec<TrendPoint>,
}

/// Window for a report kind ending today: daily is today, weekly starts on
/// Monday, monthly on the 1st.
pub fn period_window(kind: SummaryKind, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = match kind {
        SummaryKind::Daily => today,
        SummaryKind::Weekly => {
            today - TimeDelta::days(i64::from(today.weekday().num_days_from_monday()))
        }
        SummaryKind::Monthly => today.with_day(1).unwrap_or(today),
    };
    (start, today)
}

fn rate(done: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(f64::from(done) / f64::from(total) * 100.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Aggregates the non-break entries dated `start..=end`.
pub fn aggregate(entries: &[TimelineEntry], start: NaiveDate, end: NaiveDate) -> Aggregate {
    let in_window: Vec<&TimelineEntry> = entries
        .iter()
        .filter(|e| !e.is_break && e.date >= start && e.date <= end)
        .collect();

    let total_entries = in_window.len() as u32;
    let completed_entries = in_window.iter().filter(|e| e.status == EntryStatus::Done).count() as u32;

    let mut category_minutes: BTreeMap<String, u32> = BTreeMap::new();
    let mut total_minutes = 0;
    for entry in &in_window {
        let minutes = entry.effective_minutes();
        if minutes == 0 {
            continue;
        }
        total_minutes += minutes;
        *category_minutes.entry(entry.category_label().to_string()).or_default() += minutes;
    }

    let mut trend = Vec::new();
    let mut day = start;
    while day <= end {
        let todays: Vec<&&TimelineEntry> = in_window.iter().filter(|e| e.date == day).collect();
        let done = todays.iter().filter(|e| e.status == EntryStatus::Done).count() as u32;
        trend.push(TrendPoint {
            date: day,
            planned_minutes: todays.iter().map(|e| e.planned_minutes()).sum(),
            completed_minutes: todays.iter().map(|e| e.effective_minutes()).sum(),
            completion_rate: rate(done, todays.len() as u32),
        });
        day += TimeDelta::days(1);
    }

    Aggregate {
        total_entries,
        completed_entries,
        completion_rate: rate(completed_entries, total_entries),
        total_minutes,
        category_minutes,
        trend,
    }
}

fn narrative_prompt(
    kind: SummaryKind,
    start: NaiveDate,
    end: NaiveDate,
    agg: &Aggregate,
    reflections: &[Reflection],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Review this {kind} period ({start} to {end}).");
    let _ = writeln!(
        out,
        "Scheduled entries: {}, completed: {}, completion rate: {:.1}%.",
        agg.total_entries, agg.completed_entries, agg.completion_rate
    );
    let _ = writeln!(out, "Time logged: {} minutes.", agg.total_minutes);
    if !agg.category_minutes.is_empty() {
        out.push_str("Minutes by category:\n");
        for (category, minutes) in &agg.category_minutes {
            let _ = writeln!(out, "- {category}: {minutes}");
        }
    }
    out.push_str("Per day (planned / completed minutes, completion %):\n");
    for point in &agg.trend {
        let _ = writeln!(
            out,
            "- {}: {} / {}, {:.1}%",
            point.date, point.planned_minutes, point.completed_minutes, point.completion_rate
        );
    }
    if !reflections.is_empty() {
        out.push_str("The user's own reflections:\n");
        for reflection in reflections {
            write_reflection(&mut out, reflection);
        }
    }
    out.push_str(
        "\nWrite a short review of how the period went. Then add a section headed \
         \"Suggestions\" with concrete changes for the next period.",
    );
    out
}

fn write_reflection(out: &mut String, reflection: &Reflection) {
    let _ = writeln!(out, "- {}:", reflection.date);
    if let Some(minutes) = reflection.deep_work_minutes {
        let _ = writeln!(out, "  Deep work: {minutes} minutes");
    }
    for (label, text) in reflection.answers() {
        let _ = writeln!(out, "  {label}: {text}");
    }
    let flags: Vec<&str> = [
        (reflection.long_term_value, "progress had long-term value"),
        (reflection.changed_judgment, "changed a judgment"),
        (reflection.influences_future, "will influence future decisions"),
    ]
    .into_iter()
    .filter_map(|(set, text)| set.then_some(text))
    .collect();
    if !flags.is_empty() {
        let _ = writeln!(out, "  Marked: {}", flags.join(", "));
    }
}

/// Splits a narrative at its "Suggestions" heading.
pub fn split_narrative(text: &str) -> (String, Option<String>) {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let heading = line
            .trim()
            .trim_start_matches(|c: char| c == '#' || c == '*' || c.is_whitespace())
            .to_lowercase();
        if heading.starts_with("suggestion") {
            let summary = text[..offset].trim().to_string();
            let suggestions = text[offset..].trim().to_string();
            return (summary, Some(suggestions).filter(|s| !s.is_empty()));
        }
        offset += line.len();
    }
    (text.trim().to_string(), None)
}

/// Builds and stores the report for `kind` ending `today`.
///
/// With a client, a narrative is requested; if that call fails the report is
/// still stored, with [`NARRATIVE_FALLBACK`] as its narrative.
pub fn generate_summary(
    store: &Store,
    user_id: i64,
    kind: SummaryKind,
    today: NaiveDate,
    client: Option<&dyn CompletionClient>,
    ai: &AiConfig,
    now: DateTime<Utc>,
) -> Result<Summary> {
    let (start, end) = period_window(kind, today);
    let entries = store.entries_between(user_id, start, end)?;
    let agg = aggregate(&entries, start, end);

    let (narrative, suggestions) = match client {
        Some(client) => {
            let reflections = store.reflections_between(user_id, start, end)?;
            let request = CompletionRequest {
                system: REPORT_SYSTEM_PROMPT.to_string(),
                prompt: narrative_prompt(kind, start, end, &agg, &reflections),
                max_tokens: ai.report_max_tokens,
                timeout: Duration::from_secs(ai.report_timeout_secs),
            };
            match client.complete(&request) {
                Ok(text) => {
                    let (summary, suggestions) = split_narrative(&text);
                    (Some(summary), suggestions)
                }
                Err(e) => {
                    warn!(error = %e, "Report narrative failed, storing fallback");
                    (Some(NARRATIVE_FALLBACK.to_string()), None)
                }
            }
        }
        None => (None, None),
    };

    let mut summary = Summary {
        id: 0,
        user_id,
        kind,
        start_date: start,
        end_date: end,
        total_entries: agg.total_entries,
        completed_entries: agg.completed_entries,
        completion_rate: agg.completion_rate,
        total_minutes: agg.total_minutes,
        category_minutes: agg.category_minutes,
        trend: agg.trend,
        narrative,
        suggestions,
        notes: None,
        created_at: now,
    };
    summary.id = store.upsert_summary(&summary)?;
    summary.notes = store.summary(user_id, summary.id)?.and_then(|s| s.notes);
    info!(
        summary_id = summary.id,
        %kind,
        rate = summary.completion_rate,
        "Report generated"
    );
    Ok(summary)
}

pub fn list_summaries(store: &Store, user_id: i64) -> Result<Vec<Summary>> {
    store.summaries_for_user(user_id)
}

pub fn get_summary(store: &Store, user_id: i64, summary_id: i64) -> Result<Summary> {
    store
        .summary(user_id, summary_id)?
        .ok_or_else(|| PlanError::not_found("report", summary_id))
}

/// Replaces the user's notes on a report; empty text clears them.
pub fn add_summary_notes(store: &Store, user_id: i64, summary_id: i64, notes: &str) -> Result<Summary> {
    let notes = Some(notes.trim()).filter(|n| !n.is_empty());
    if !store.set_summary_notes(user_id, summary_id, notes)? {
        return Err(PlanError::not_found("report", summary_id));
    }
    get_summary(store, user_id, summary_id)
}

/// Minutes per category over the last `days` days (all time when `None`),
/// largest first.
pub fn category_chart(
    store: &Store,
    user_id: i64,
    days: Option<u32>,
    today: NaiveDate,
) -> Result<Vec<(String, u32)>> {
    let entries = match days {
        Some(days) => {
            let start = today - TimeDelta::days(i64::from(days));
            store.entries_between(user_id, start, today)?
        }
        None => store.entries_for_user(user_id)?,
    };
    let mut totals: BTreeMap<String, u32> = BTreeMap::new();
    for entry in entries.iter().filter(|e| !e.is_break) {
        let minutes = entry.effective_minutes();
        if minutes > 0 {
            *totals.entry(entry.category_label().to_string()).or_default() += minutes;
        }
    }
    let mut chart: Vec<(String, u32)> = totals.into_iter().collect();
    chart.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(chart)
}
