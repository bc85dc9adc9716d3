mod common;

use common::{date, entry, now, setup, today, StubClient};
use planwise::ai::CompletionClient;
use planwise::config::AiConfig;
use planwise::feedback::{record_feedback, set_entry_status, FeedbackInput};
use planwise::models::{EntryStatus, SummaryKind};
use planwise::report::*;

fn done(minutes: Option<u32>) -> FeedbackInput {
    FeedbackInput { status: EntryStatus::Done, actual_minutes: minutes, notes: None }
}

#[test]
fn test_period_window() {
    // 2026-03-04 is a Wednesday
    let wed = date(2026, 3, 4);
    assert_eq!(period_window(SummaryKind::Daily, wed), (wed, wed));
    assert_eq!(period_window(SummaryKind::Weekly, wed), (date(2026, 3, 2), wed));
    assert_eq!(period_window(SummaryKind::Monthly, wed), (date(2026, 3, 1), wed));
    assert_eq!(period_window(SummaryKind::Weekly, date(2026, 3, 2)), (date(2026, 3, 2), date(2026, 3, 2)));
}

#[test]
fn test_aggregate_matches_hand_count() {
    let (store, user) = setup();
    let mon = date(2026, 3, 2);
    let tue = date(2026, 3, 3);

    let a = entry(&store, &user, mon, (10, 0), (11, 0), None, "work");
    let b = entry(&store, &user, mon, (11, 0), (12, 30), None, "study");
    let _c = entry(&store, &user, mon, (13, 0), (14, 0), None, "work");
    let d = entry(&store, &user, tue, (10, 0), (10, 30), None, "work");
    let outside = entry(&store, &user, date(2026, 3, 9), (10, 0), (11, 0), None, "work");

    record_feedback(&store, user.id, a, done(Some(50)), now()).unwrap();
    set_entry_status(&store, user.id, b, EntryStatus::Partial, now()).unwrap();
    set_entry_status(&store, user.id, d, EntryStatus::Done, now()).unwrap();
    set_entry_status(&store, user.id, outside, EntryStatus::Done, now()).unwrap();

    let entries = store.entries_for_user(user.id).unwrap();
    let agg = aggregate(&entries, mon, date(2026, 3, 4));

    assert_eq!(agg.total_entries, 4);
    assert_eq!(agg.completed_entries, 2);
    assert_eq!(agg.completion_rate, 50.0);
    // 50 logged + 90 partial + 30 done
    assert_eq!(agg.total_minutes, 170);
    assert_eq!(agg.category_minutes.get("work"), Some(&80));
    assert_eq!(agg.category_minutes.get("study"), Some(&90));

    assert_eq!(agg.trend.len(), 3);
    assert_eq!(agg.trend[0].planned_minutes, 210);
    assert_eq!(agg.trend[0].completed_minutes, 140);
    assert_eq!(agg.trend[0].completion_rate, 33.3);
    assert_eq!(agg.trend[1].completion_rate, 100.0);
    assert_eq!(agg.trend[2].planned_minutes, 0);
    assert_eq!(agg.trend[2].completion_rate, 0.0);
}

#[test]
fn test_aggregate_empty_window() {
    let agg = aggregate(&[], today(), today());
    assert_eq!(agg.total_entries, 0);
    assert_eq!(agg.completion_rate, 0.0);
    assert!(agg.category_minutes.is_empty());
    assert_eq!(agg.trend.len(), 1);
}

#[test]
fn test_split_narrative() {
    let text = "You finished most of your work.\nGood focus on study.\n\n## Suggestions\n- Start earlier\n";
    let (summary, suggestions) = split_narrative(text);
    assert_eq!(summary, "You finished most of your work.\nGood focus on study.");
    assert_eq!(suggestions.as_deref(), Some("## Suggestions\n- Start earlier"));

    let (summary, suggestions) = split_narrative("Only a review.");
    assert_eq!(summary, "Only a review.");
    assert!(suggestions.is_none());

    let (_, suggestions) = split_narrative("Review\n**Suggestion:** sleep more");
    assert_eq!(suggestions.as_deref(), Some("**Suggestion:** sleep more"));
}

#[test]
fn test_generate_summary_with_narrative() {
    let (store, user) = setup();
    let a = entry(&store, &user, today(), (10, 0), (11, 0), None, "work");
    record_feedback(&store, user.id, a, done(None), now()).unwrap();

    let client = StubClient::replying("Solid day.\nSuggestions:\nTake a walk.");
    let summary = generate_summary(
        &store,
        user.id,
        SummaryKind::Daily,
        today(),
        Some(&client as &dyn CompletionClient),
        &AiConfig::default(),
        now(),
    )
    .unwrap();

    assert_eq!(summary.completion_rate, 100.0);
    assert_eq!(summary.total_minutes, 60);
    assert_eq!(summary.narrative.as_deref(), Some("Solid day."));
    assert_eq!(summary.suggestions.as_deref(), Some("Suggestions:\nTake a walk."));
    assert!(client.last_prompt.borrow().contains("completion rate: 100.0%"));

    let stored = get_summary(&store, user.id, summary.id).unwrap();
    assert_eq!(stored.category_minutes, summary.category_minutes);
    assert_eq!(stored.trend, summary.trend);
}

#[test]
fn test_generate_summary_falls_back_when_ai_fails() {
    let (store, user) = setup();
    let client = StubClient::failing();
    let summary = generate_summary(
        &store,
        user.id,
        SummaryKind::Weekly,
        today(),
        Some(&client as &dyn CompletionClient),
        &AiConfig::default(),
        now(),
    )
    .unwrap();

    assert_eq!(client.calls.get(), 1);
    assert_eq!(summary.narrative.as_deref(), Some(NARRATIVE_FALLBACK));
    assert!(summary.suggestions.is_none());
    assert_eq!(list_summaries(&store, user.id).unwrap().len(), 1);
}

#[test]
fn test_regenerating_keeps_notes() {
    let (store, user) = setup();
    let first =
        generate_summary(&store, user.id, SummaryKind::Daily, today(), None, &AiConfig::default(), now()).unwrap();
    assert!(first.narrative.is_none());

    add_summary_notes(&store, user.id, first.id, "  felt rushed ").unwrap();

    let a = entry(&store, &user, today(), (10, 0), (11, 0), None, "work");
    record_feedback(&store, user.id, a, done(None), now()).unwrap();
    let second =
        generate_summary(&store, user.id, SummaryKind::Daily, today(), None, &AiConfig::default(), now()).unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.total_entries, 1);
    assert_eq!(second.notes.as_deref(), Some("felt rushed"));
    assert_eq!(list_summaries(&store, user.id).unwrap().len(), 1);

    assert!(add_summary_notes(&store, user.id, 999, "x").is_err());
}

#[test]
fn test_category_chart() {
    let (store, user) = setup();
    let recent = entry(&store, &user, today(), (10, 0), (12, 0), None, "study");
    let older = entry(&store, &user, date(2025, 12, 1), (10, 0), (11, 0), None, "work");
    // still planned, so it adds nothing
    entry(&store, &user, today(), (13, 0), (14, 0), None, "work");
    record_feedback(&store, user.id, recent, done(None), now()).unwrap();
    record_feedback(&store, user.id, older, done(None), now()).unwrap();

    let last_30 = category_chart(&store, user.id, Some(30), today()).unwrap();
    assert_eq!(last_30, vec![("study".to_string(), 120)]);

    let all = category_chart(&store, user.id, None, today()).unwrap();
    assert_eq!(all, vec![("study".to_string(), 120), ("work".to_string(), 60)]);
}

#[test]
fn test_narrative_prompt_includes_reflections_in_window() {
    use planwise::models::ReflectionInput;
    use planwise::reflection::save_reflection;

    let (store, user) = setup();
    entry(&store, &user, today(), (10, 0), (11, 0), None, "work");
    let todays = ReflectionInput {
        core_progress: Some("Finished chapter 3".into()),
        deep_work_minutes: Some(90),
        changed_judgment: true,
        ..ReflectionInput::default()
    };
    save_reflection(&store, user.id, today(), todays, now()).unwrap();
    let older = ReflectionInput { key_insight: Some("Mornings are best".into()), ..ReflectionInput::default() };
    save_reflection(&store, user.id, date(2026, 3, 1), older, now()).unwrap();

    let client = StubClient::replying("Fine.");
    generate_summary(
        &store,
        user.id,
        SummaryKind::Daily,
        today(),
        Some(&client as &dyn CompletionClient),
        &AiConfig::default(),
        now(),
    )
    .unwrap();

    let prompt = client.last_prompt.borrow();
    assert!(prompt.contains("reflections"));
    assert!(prompt.contains("Core progress: Finished chapter 3"));
    assert!(prompt.contains("Deep work: 90 minutes"));
    assert!(prompt.contains("changed a judgment"));
    assert!(!prompt.contains("Mornings are best"), "the daily window is today only");
}
