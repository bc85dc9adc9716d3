//! Reward tracker: category time goals with redemption.
//!
//! `accumulated_minutes` on a rule is only a cache. [`refresh_rules`]
//! recomputes it from the timeline after every change that can move it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{PlanError, Result};
use crate::models::{RewardRule, TimelineEntry};
use crate::storage::Store;

#[derive(Debug, Clone)]
pub struct NewRewardRule {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub target_minutes: u32,
}

/// Logged time for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryProgress {
    pub category: String,
    pub minutes: u32,
    pub entries: u32,
}

/// Whether an entry's time is credited to `category`.
///
/// Labels match exactly, the same way [`category_progress`] groups them.
fn credits(entry: &TimelineEntry, category: &str) -> bool {
    !entry.is_break && entry.status.counts_time() && entry.category_label() == category
}

/// Minutes credited to `category` across the whole timeline.
pub fn accumulated_minutes(entries: &[TimelineEntry], category: &str) -> u32 {
    entries
        .iter()
        .filter(|e| credits(e, category))
        .map(TimelineEntry::effective_minutes)
        .sum()
}

pub fn add_rule(store: &Store, user_id: i64, new: NewRewardRule, now: DateTime<Utc>) -> Result<RewardRule> {
    let title = new.title.trim().to_string();
    let category = new.category.trim().to_string();
    if title.is_empty() || category.is_empty() {
        return Err(PlanError::validation("a reward needs a title and a category"));
    }
    if new.target_minutes == 0 {
        return Err(PlanError::validation("target minutes must be greater than zero"));
    }

    let entries = store.entries_for_user(user_id)?;
    let accumulated = accumulated_minutes(&entries, &category);
    let achieved = accumulated >= new.target_minutes;
    let mut rule = RewardRule {
        id: 0,
        user_id,
        title,
        description: new.description.filter(|d| !d.trim().is_empty()),
        category,
        target_minutes: new.target_minutes,
        accumulated_minutes: accumulated,
        achieved,
        achieved_at: achieved.then_some(now),
        redeemed: false,
        redeemed_at: None,
        created_at: now,
    };
    rule.id = store.insert_rule(&rule)?;
    info!(rule_id = rule.id, category = %rule.category, target = rule.target_minutes, "Reward added");
    Ok(rule)
}

pub fn list_rules(store: &Store, user_id: i64) -> Result<Vec<RewardRule>> {
    store.rules_for_user(user_id)
}

pub fn remove_rule(store: &Store, user_id: i64, rule_id: i64) -> Result<()> {
    if !store.delete_rule(user_id, rule_id)? {
        return Err(PlanError::not_found("reward", rule_id));
    }
    Ok(())
}

/// Redeems an achieved rule. Each rule can be redeemed once.
pub fn redeem_rule(store: &Store, user_id: i64, rule_id: i64, now: DateTime<Utc>) -> Result<RewardRule> {
    let mut rule = store
        .rule(user_id, rule_id)?
        .ok_or_else(|| PlanError::not_found("reward", rule_id))?;
    if rule.redeemed {
        return Err(PlanError::validation(format!("reward '{}' was already redeemed", rule.title)));
    }
    if !rule.achieved {
        return Err(PlanError::validation(format!(
            "reward '{}' is not achieved yet ({} of {} minutes)",
            rule.title, rule.accumulated_minutes, rule.target_minutes
        )));
    }
    store.mark_rule_redeemed(rule.id, now)?;
    rule.redeemed = true;
    rule.redeemed_at = Some(now);
    info!(rule_id = rule.id, "Reward redeemed");
    Ok(rule)
}

/// Recomputes every rule's cache and returns the rules that became achieved.
///
/// A rule that drops back under its target loses `achieved`, unless it was
/// already redeemed.
pub fn refresh_rules(store: &Store, user_id: i64, now: DateTime<Utc>) -> Result<Vec<RewardRule>> {
    let rules = store.rules_for_user(user_id)?;
    if rules.is_empty() {
        return Ok(Vec::new());
    }
    let entries = store.entries_for_user(user_id)?;

    let mut newly_achieved = Vec::new();
    for mut rule in rules {
        let accumulated = accumulated_minutes(&entries, &rule.category);
        let reached = accumulated >= rule.target_minutes;
        let achieved = reached || rule.redeemed;
        let achieved_at = match (achieved, rule.achieved) {
            (true, true) => rule.achieved_at,
            (true, false) => Some(now),
            (false, _) => None,
        };

        if accumulated == rule.accumulated_minutes && achieved == rule.achieved {
            continue;
        }
        store.update_rule_progress(rule.id, accumulated, achieved, achieved_at)?;

        let became_achieved = achieved && !rule.achieved;
        rule.accumulated_minutes = accumulated;
        rule.achieved = achieved;
        rule.achieved_at = achieved_at;
        if became_achieved {
            info!(rule_id = rule.id, title = %rule.title, "Reward achieved");
            newly_achieved.push(rule);
        }
    }
    Ok(newly_achieved)
}

/// Logged minutes and entry counts per category, largest first.
pub fn category_progress(store: &Store, user_id: i64) -> Result<Vec<CategoryProgress>> {
    let mut totals: BTreeMap<String, (u32, u32)> = BTreeMap::new();
    for entry in store.entries_for_user(user_id)? {
        if entry.is_break || !entry.status.counts_time() {
            continue;
        }
        let slot = totals.entry(entry.category_label().to_string()).or_default();
        slot.0 += entry.effective_minutes();
        slot.1 += 1;
    }
    let mut progress: Vec<CategoryProgress> = totals
        .into_iter()
        .map(|(category, (minutes, entries))| CategoryProgress { category, minutes, entries })
        .collect();
    progress.sort_by(|a, b| b.minutes.cmp(&a.minutes).then_with(|| a.category.cmp(&b.category)));
    Ok(progress)
}
