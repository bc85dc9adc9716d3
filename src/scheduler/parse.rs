//! Turns a completion reply into proposed timeline slots.
//!
//! Two shapes are accepted. The preferred one is a JSON document:
//!
//! ```text
//! {"days":[{"date":"2026-03-02","entries":[
//!     {"start":"09:00","end":"10:30","title":"Write report","task_id":4,"category":"work"}
//! ]}]}
//! ```
//!
//! Replies that are not JSON are read line by line: `=== YYYY-MM-DD ===`
//! switches the current day, and `HH:MM-HH:MM | title | duration | category | priority`
//! adds a slot to it.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use tracing::debug;

use crate::ai::AiError;

/// One slot as proposed by the model, before validation against the user's day.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedEntry {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub title: String,
    pub task_id: Option<i64>,
    pub category: Option<String>,
    pub is_break: bool,
    pub is_meeting: bool,
    pub reasoning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlanDoc {
    days: Vec<DayDoc>,
}

#[derive(Debug, Deserialize)]
struct DayDoc {
    date: Option<String>,
    #[serde(default)]
    entries: Vec<EntryDoc>,
}

#[derive(Debug, Deserialize)]
struct EntryDoc {
    start: String,
    end: String,
    title: String,
    task_id: Option<i64>,
    category: Option<String>,
    #[serde(default)]
    is_break: bool,
    #[serde(default)]
    is_meeting: bool,
    reasoning: Option<String>,
}

const MEETING_MARKER: &str = "[meeting]";

/// Parses a reply. Days without a readable date fall on `default_date`.
pub fn parse_response(text: &str, default_date: NaiveDate) -> Result<Vec<ProposedEntry>, AiError> {
    let body = strip_code_fence(text);
    let entries = match parse_json(body, default_date) {
        Some(entries) => entries,
        None => parse_lines(body, default_date),
    };
    if entries.is_empty() {
        return Err(AiError::InvalidResponse("reply contained no schedule entries".to_string()));
    }
    debug!(count = entries.len(), "Parsed proposed entries");
    Ok(entries)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string (`json`, ...) on the fence line
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_json(text: &str, default_date: NaiveDate) -> Option<Vec<ProposedEntry>> {
    let open = text.find('{')?;
    let close = text.rfind('}')?;
    if close <= open {
        return None;
    }
    let doc: PlanDoc = serde_json::from_str(&text[open..=close]).ok()?;

    let mut out = Vec::new();
    for day in doc.days {
        let date = day
            .date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
            .unwrap_or(default_date);
        for entry in day.entries {
            let (Some(start), Some(end)) = (parse_clock(&entry.start), parse_clock(&entry.end)) else {
                debug!(start = %entry.start, end = %entry.end, "Skipping entry with unreadable times");
                continue;
            };
            let (title, marked_meeting) = split_meeting_marker(&entry.title);
            if title.is_empty() {
                continue;
            }
            out.push(ProposedEntry {
                date,
                start,
                end,
                title,
                task_id: entry.task_id,
                category: entry.category.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
                is_break: entry.is_break,
                is_meeting: entry.is_meeting || marked_meeting,
                reasoning: entry.reasoning.filter(|r| !r.trim().is_empty()),
            });
        }
    }
    Some(out)
}

fn parse_lines(text: &str, default_date: NaiveDate) -> Vec<ProposedEntry> {
    let mut current = default_date;
    let mut out = Vec::new();

    for raw in text.lines() {
        let line = raw.trim().trim_start_matches(['-', '*']).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix("===") {
            let header = header.trim_end_matches('=').trim();
            match header
                .split_whitespace()
                .next()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            {
                Some(date) => current = date,
                None => debug!(header, "Ignoring day header without a date"),
            }
            continue;
        }

        if let Some(entry) = parse_slot_line(line, current) {
            out.push(entry);
        }
    }
    out
}

fn parse_slot_line(line: &str, date: NaiveDate) -> Option<ProposedEntry> {
    let parts: Vec<&str> = line.split('|').map(str::trim).collect();
    let (range, title) = if parts.len() > 1 {
        (parts[0], parts[1])
    } else {
        line.split_once(char::is_whitespace)
            .map(|(r, t)| (r, t.trim()))
            .unwrap_or((line, ""))
    };

    let (start, end) = range.split_once(['-', '~', '–'])?;
    let start = parse_clock(start)?;
    let end = parse_clock(end)?;

    let (title, is_meeting) = split_meeting_marker(title);
    if title.is_empty() {
        return None;
    }
    let category = parts.get(3).map(|c| c.to_string()).filter(|c| !c.is_empty());

    Some(ProposedEntry {
        date,
        start,
        end,
        is_break: looks_like_break(&title),
        title,
        task_id: None,
        category,
        is_meeting,
        reasoning: None,
    })
}

/// Reads `H:MM` or `HH:MM`.
pub fn parse_clock(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M").ok()
}

fn split_meeting_marker(title: &str) -> (String, bool) {
    let trimmed = title.trim();
    let marked = trimmed
        .get(..MEETING_MARKER.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(MEETING_MARKER));
    match trimmed.get(MEETING_MARKER.len()..) {
        Some(rest) if marked => (rest.trim().to_string(), true),
        _ => (trimmed.to_string(), false),
    }
}

fn looks_like_break(title: &str) -> bool {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == "break" || word == "rest")
}
