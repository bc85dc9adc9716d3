mod common;

use chrono::TimeDelta;
use common::{date, now, setup, today};
use planwise::models::ReflectionInput;
use planwise::reflection::*;
use planwise::PlanError;

fn progress(text: &str) -> ReflectionInput {
    ReflectionInput { core_progress: Some(text.into()), ..ReflectionInput::default() }
}

#[test]
fn test_save_and_replace_reflection() {
    let (store, user) = setup();
    let first = save_reflection(&store, user.id, today(), progress("Drafted intro"), now()).unwrap();
    assert_eq!(first.core_progress.as_deref(), Some("Drafted intro"));

    let later = now() + TimeDelta::hours(10);
    let input = ReflectionInput {
        core_progress: Some("  Finished the draft  ".into()),
        tomorrow_focus: Some("Send it out".into()),
        time_waste: Some("   ".into()),
        deep_work_minutes: Some(120),
        ..ReflectionInput::default()
    };
    let second = save_reflection(&store, user.id, today(), input, later).unwrap();

    assert_eq!(second.id, first.id, "one reflection per day");
    assert_eq!(second.core_progress.as_deref(), Some("Finished the draft"));
    assert_eq!(second.time_waste, None);
    assert_eq!(second.created_at, now());
    assert_eq!(second.updated_at, later);
    assert_eq!(list_reflections(&store, user.id, None).unwrap().len(), 1);
}

#[test]
fn test_reflection_validation() {
    let (store, user) = setup();
    let blank = ReflectionInput { key_insight: Some(" ".into()), ..ReflectionInput::default() };
    assert!(matches!(save_reflection(&store, user.id, today(), blank, now()), Err(PlanError::Validation(_))));

    let too_long = ReflectionInput { deep_work_minutes: Some(1441), ..ReflectionInput::default() };
    assert!(save_reflection(&store, user.id, today(), too_long, now()).is_err());

    // a flag alone is an answer
    let flag_only = ReflectionInput { influences_future: true, ..ReflectionInput::default() };
    assert!(save_reflection(&store, user.id, today(), flag_only, now()).is_ok());
}

#[test]
fn test_get_list_and_remove() {
    let (store, user) = setup();
    for day in 1..=3 {
        save_reflection(&store, user.id, date(2026, 3, day), progress(&format!("day {day}")), now()).unwrap();
    }

    let recent = list_reflections(&store, user.id, Some(2)).unwrap();
    let days: Vec<_> = recent.iter().map(|r| r.date).collect();
    assert_eq!(days, vec![date(2026, 3, 3), date(2026, 3, 2)]);

    assert_eq!(get_reflection(&store, user.id, date(2026, 3, 1)).unwrap().core_progress.as_deref(), Some("day 1"));
    remove_reflection(&store, user.id, date(2026, 3, 1)).unwrap();
    assert!(matches!(get_reflection(&store, user.id, date(2026, 3, 1)), Err(PlanError::NotFound(_))));
    assert!(remove_reflection(&store, user.id, date(2026, 3, 1)).is_err());
}

#[test]
fn test_reflection_stats() {
    let (store, user) = setup();
    let empty = reflection_stats(&store, user.id).unwrap();
    assert_eq!(empty.total, 0);
    assert_eq!(empty.avg_deep_work_minutes, 0.0);

    let a = ReflectionInput {
        deep_work_minutes: Some(90),
        long_term_value: true,
        changed_judgment: true,
        ..ReflectionInput::default()
    };
    let b = ReflectionInput { deep_work_minutes: Some(60), long_term_value: true, ..ReflectionInput::default() };
    let c = progress("Admin only");
    save_reflection(&store, user.id, date(2026, 3, 1), a, now()).unwrap();
    save_reflection(&store, user.id, date(2026, 3, 2), b, now()).unwrap();
    save_reflection(&store, user.id, date(2026, 3, 3), c, now()).unwrap();

    let stats = reflection_stats(&store, user.id).unwrap();
    assert_eq!(stats.total, 3);
    // only days that recorded deep work are averaged
    assert_eq!(stats.avg_deep_work_minutes, 75.0);
    assert_eq!(stats.long_term_ratio, 66.7);
    assert_eq!(stats.changed_judgment_ratio, 33.3);
    assert_eq!(stats.influences_future_ratio, 0.0);
}

#[test]
fn test_reflections_are_private() {
    let (store, user) = setup();
    let other = store
        .insert_user("bob", "bob@example.com", "x", &Default::default(), now())
        .unwrap();
    save_reflection(&store, user.id, today(), progress("Mine"), now()).unwrap();

    assert!(get_reflection(&store, other.id, today()).is_err());
    assert!(list_reflections(&store, other.id, None).unwrap().is_empty());
    assert_eq!(reflection_stats(&store, other.id).unwrap().total, 0);
}
