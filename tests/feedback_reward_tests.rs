mod common;

use chrono::TimeDelta;
use common::{date, entry, now, setup, task, today};
use planwise::feedback::*;
use planwise::models::{EntryStatus, NewTask, TaskStatus};
use planwise::recurrence::Recurrence;
use planwise::rewards::*;
use planwise::scheduler::{edit_entry, remove_entry, EntryEdit};
use planwise::tasks::{add_task, get_task};
use planwise::PlanError;

fn done(minutes: Option<u32>) -> FeedbackInput {
    FeedbackInput { status: EntryStatus::Done, actual_minutes: minutes, notes: None }
}

fn rule(category: &str, target: u32) -> NewRewardRule {
    NewRewardRule { title: format!("{category} treat"), description: None, category: category.into(), target_minutes: target }
}

#[test]
fn test_record_feedback_stores_minutes_and_notes() {
    let (store, user) = setup();
    let id = entry(&store, &user, today(), (10, 0), (11, 0), None, "work");

    let input = FeedbackInput { status: EntryStatus::Partial, actual_minutes: Some(40), notes: Some(" tired ".into()) };
    let outcome = record_feedback(&store, user.id, id, input, now()).unwrap();

    assert_eq!(outcome.entry.status, EntryStatus::Partial);
    assert_eq!(outcome.entry.actual_minutes, Some(40));
    assert_eq!(outcome.entry.notes.as_deref(), Some("tired"));
    assert_eq!(outcome.entry.effective_minutes(), 40);

    // a status toggle keeps the logged minutes
    let toggled = set_entry_status(&store, user.id, id, EntryStatus::Done, now()).unwrap();
    assert_eq!(toggled.entry.actual_minutes, Some(40));
    assert_eq!(store.feedback_for(id).unwrap().unwrap().status, EntryStatus::Done);
}

#[test]
fn test_feedback_validation() {
    let (store, user) = setup();
    let id = entry(&store, &user, today(), (10, 0), (11, 0), None, "work");

    let err = record_feedback(&store, user.id, id, done(Some(MAX_ACTUAL_MINUTES + 1)), now()).unwrap_err();
    assert!(matches!(err, PlanError::Validation(_)));
    assert!(matches!(record_feedback(&store, user.id, 999, done(None), now()), Err(PlanError::NotFound(_))));
}

#[test]
fn test_task_completes_when_all_entries_done() {
    let (store, user) = setup();
    let t = task(&store, &user, "Write report", 120, "work");
    let first = entry(&store, &user, today(), (10, 0), (11, 0), Some(t.id), "work");
    let second = entry(&store, &user, today(), (11, 0), (12, 0), Some(t.id), "work");
    let third = entry(&store, &user, today(), (13, 0), (14, 0), Some(t.id), "work");

    let outcome = record_feedback(&store, user.id, first, done(None), now()).unwrap();
    assert!(outcome.completed.is_none());
    set_entry_status(&store, user.id, third, EntryStatus::Skipped, now()).unwrap();

    let outcome = record_feedback(&store, user.id, second, done(None), now()).unwrap();
    let completion = outcome.completed.expect("last open entry should complete the task");
    assert_eq!(completion.task.id, t.id);
    assert_eq!(get_task(&store, user.id, t.id).unwrap().status, TaskStatus::Completed);

    // reverting a done entry reopens the task
    let outcome = set_entry_status(&store, user.id, second, EntryStatus::Planned, now()).unwrap();
    assert_eq!(outcome.reopened_task, Some(t.id));
    assert_eq!(get_task(&store, user.id, t.id).unwrap().status, TaskStatus::Pending);
}

#[test]
fn test_recurring_task_spawns_through_feedback() {
    let (store, user) = setup();
    let new = NewTask {
        title: "Water plants".into(),
        estimated_minutes: 15,
        deadline: Some(today().and_hms_opt(18, 0, 0).unwrap()),
        recurrence: Recurrence::Daily,
        category: Some("home".into()),
        ..NewTask::default()
    };
    let t = add_task(&store, user.id, new, now()).unwrap();
    let id = entry(&store, &user, today(), (16, 0), (16, 15), Some(t.id), "home");

    let outcome = record_feedback(&store, user.id, id, done(None), now()).unwrap();
    let next = outcome.completed.and_then(|c| c.next).expect("next occurrence");
    assert_eq!(next.deadline, Some(date(2026, 3, 3).and_hms_opt(18, 0, 0).unwrap()));

    // marking it done again does not spawn a second occurrence
    let outcome = set_entry_status(&store, user.id, id, EntryStatus::Done, now()).unwrap();
    assert!(outcome.completed.is_none());
}

#[test]
fn test_redone_entry_does_not_spawn_twice() {
    let (store, user) = setup();
    let new = NewTask {
        title: "Gym".into(),
        estimated_minutes: 60,
        deadline: Some(today().and_hms_opt(18, 0, 0).unwrap()),
        recurrence: Recurrence::Daily,
        category: Some("health".into()),
        ..NewTask::default()
    };
    let t = add_task(&store, user.id, new, now()).unwrap();
    let id = entry(&store, &user, today(), (10, 0), (11, 0), Some(t.id), "health");

    let first = set_entry_status(&store, user.id, id, EntryStatus::Done, now()).unwrap();
    let spawned = first.completed.and_then(|c| c.next).expect("next occurrence");

    let undone = set_entry_status(&store, user.id, id, EntryStatus::Planned, now()).unwrap();
    assert_eq!(undone.reopened_task, Some(t.id));

    let again = set_entry_status(&store, user.id, id, EntryStatus::Done, now()).unwrap();
    let completion = again.completed.expect("task completes again");
    assert!(completion.next.is_none());
    assert_eq!(completion.task.next_task_id, Some(spawned.id));

    let pending: Vec<_> = store
        .tasks_for_user(user.id)
        .unwrap()
        .into_iter()
        .filter(|t| t.title == "Gym" && t.status == TaskStatus::Pending)
        .collect();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, spawned.id);
}

#[test]
fn test_accumulated_minutes_match_done_entries() {
    let (store, user) = setup();
    let r = add_rule(&store, user.id, rule("study", 150), now()).unwrap();
    assert_eq!(r.accumulated_minutes, 0);
    assert!(!r.achieved);

    let a = entry(&store, &user, today(), (10, 0), (11, 0), None, "Study");
    let b = entry(&store, &user, today(), (11, 0), (12, 0), None, "study");
    let c = entry(&store, &user, today(), (13, 0), (14, 0), None, "work");
    let old = entry(&store, &user, today() - TimeDelta::days(1), (10, 0), (12, 0), None, "study");

    record_feedback(&store, user.id, a, done(Some(45)), now()).unwrap();
    record_feedback(&store, user.id, c, done(None), now()).unwrap();
    record_feedback(&store, user.id, old, done(None), now()).unwrap();
    let partial = FeedbackInput { status: EntryStatus::Partial, actual_minutes: None, notes: None };
    record_feedback(&store, user.id, b, partial, now()).unwrap();

    let stored = list_rules(&store, user.id).unwrap();
    // 60 partial + 120 from yesterday; "Study" is a different label
    assert_eq!(stored[0].accumulated_minutes, 180);
    assert_eq!(
        stored[0].accumulated_minutes,
        accumulated_minutes(&store.entries_for_user(user.id).unwrap(), "study")
    );
    assert!(stored[0].achieved);

    // the progress table agrees with the rule
    let progress = category_progress(&store, user.id).unwrap();
    assert_eq!(progress[0].category, "study");
    assert_eq!(progress[0].minutes, stored[0].accumulated_minutes);
    assert_eq!(progress[0].entries, 2);
    assert!(progress.iter().any(|p| p.category == "Study" && p.minutes == 45));
}

#[test]
fn test_new_rule_counts_earlier_history() {
    let (store, user) = setup();
    let id = entry(&store, &user, today() - TimeDelta::days(1), (10, 0), (11, 0), None, "study");
    record_feedback(&store, user.id, id, done(None), now()).unwrap();

    let r = add_rule(&store, user.id, rule("study", 60), now()).unwrap();
    assert_eq!(r.accumulated_minutes, 60);
    assert!(r.achieved);
    assert!(r.achieved_at.is_some());

    // a later refresh leaves it as it is
    assert!(refresh_rules(&store, user.id, now()).unwrap().is_empty());
    assert_eq!(store.rule(user.id, r.id).unwrap().unwrap().accumulated_minutes, 60);
}

#[test]
fn test_editing_done_entry_refreshes_rewards() {
    let (store, user) = setup();
    let r = add_rule(&store, user.id, rule("study", 60), now()).unwrap();
    let id = entry(&store, &user, today(), (10, 0), (11, 0), None, "study");
    record_feedback(&store, user.id, id, done(None), now()).unwrap();
    assert!(store.rule(user.id, r.id).unwrap().unwrap().achieved);

    let recategorised = EntryEdit { category: Some("work".into()), ..EntryEdit::default() };
    edit_entry(&store, &user, id, recategorised, now()).unwrap();
    let after = store.rule(user.id, r.id).unwrap().unwrap();
    assert_eq!(after.accumulated_minutes, 0);
    assert!(!after.achieved);

    // back to study, but shorter
    let shorter = EntryEdit { end: Some(common::time(10, 30)), category: Some("study".into()), ..EntryEdit::default() };
    edit_entry(&store, &user, id, shorter, now()).unwrap();
    let after = store.rule(user.id, r.id).unwrap().unwrap();
    assert_eq!(after.accumulated_minutes, 30);
    assert!(!after.achieved);
}

#[test]
fn test_reward_achieved_redeemed_and_reverted() {
    let (store, user) = setup();
    let r = add_rule(&store, user.id, rule("health", 60), now()).unwrap();
    let id = entry(&store, &user, today(), (10, 0), (11, 0), None, "health");

    assert!(redeem_rule(&store, user.id, r.id, now()).is_err());

    let outcome = record_feedback(&store, user.id, id, done(None), now()).unwrap();
    assert_eq!(outcome.newly_achieved.len(), 1);
    assert_eq!(outcome.newly_achieved[0].id, r.id);

    // reverting drops the rule back under target
    set_entry_status(&store, user.id, id, EntryStatus::Skipped, now()).unwrap();
    let reverted = store.rule(user.id, r.id).unwrap().unwrap();
    assert_eq!(reverted.accumulated_minutes, 0);
    assert!(!reverted.achieved);

    set_entry_status(&store, user.id, id, EntryStatus::Done, now()).unwrap();
    let redeemed = redeem_rule(&store, user.id, r.id, now()).unwrap();
    assert!(redeemed.redeemed);
    assert!(redeem_rule(&store, user.id, r.id, now()).is_err());

    // a redeemed rule stays achieved even when its entry goes away
    remove_entry(&store, user.id, id, now()).unwrap();
    let after = store.rule(user.id, r.id).unwrap().unwrap();
    assert_eq!(after.accumulated_minutes, 0);
    assert!(after.achieved && after.redeemed);
}

#[test]
fn test_breaks_never_count() {
    let (store, user) = setup();
    add_rule(&store, user.id, rule("work", 30), now()).unwrap();
    let new = planwise::models::NewEntry {
        date: today(),
        start: common::time(10, 0),
        end: common::time(11, 0),
        task_id: None,
        title: "Break".into(),
        category: Some("work".into()),
        location: None,
        is_break: true,
        is_meeting: false,
        source: planwise::models::EntrySource::Manual,
        reasoning: None,
    };
    let id = store.insert_entry(user.id, &new, now()).unwrap();
    let outcome = record_feedback(&store, user.id, id, done(Some(60)), now()).unwrap();

    assert!(outcome.newly_achieved.is_empty());
    assert_eq!(list_rules(&store, user.id).unwrap()[0].accumulated_minutes, 0);
}

#[test]
fn test_rule_validation_and_removal() {
    let (store, user) = setup();
    assert!(add_rule(&store, user.id, rule("study", 0), now()).is_err());
    assert!(add_rule(&store, user.id, rule("  ", 10), now()).is_err());

    let r = add_rule(&store, user.id, rule("study", 10), now()).unwrap();
    remove_rule(&store, user.id, r.id).unwrap();
    assert!(matches!(remove_rule(&store, user.id, r.id), Err(PlanError::NotFound(_))));
}
