mod common;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use common::{date, now, setup, today};
use planwise::habits::*;
use planwise::models::{Habit, NewHabit};
use planwise::recurrence::Recurrence;
use planwise::storage::Store;
use planwise::PlanError;

/// Friday 2026-02-20, ten days before `today()`.
fn created() -> DateTime<Utc> {
    now() - TimeDelta::days(10)
}

fn habit(store: &Store, user_id: i64, title: &str, frequency: &str) -> Habit {
    let new = NewHabit {
        title: title.into(),
        frequency: frequency.parse().unwrap(),
        points: 10,
        ..NewHabit::default()
    };
    add_habit(store, user_id, new, created()).unwrap()
}

fn on(day: NaiveDate) -> CheckinInput {
    CheckinInput { date: day, value: None, notes: None }
}

#[test]
fn test_add_habit_validation() {
    let (store, user) = setup();
    let blank = NewHabit { title: " ".into(), frequency: Recurrence::Daily, ..NewHabit::default() };
    assert!(matches!(add_habit(&store, user.id, blank, now()), Err(PlanError::Validation(_))));

    let no_frequency = NewHabit { title: "Read".into(), ..NewHabit::default() };
    assert!(add_habit(&store, user.id, no_frequency, now()).is_err());

    let zero_target =
        NewHabit { title: "Read".into(), frequency: Recurrence::Daily, target_value: Some(0.0), ..NewHabit::default() };
    assert!(add_habit(&store, user.id, zero_target, now()).is_err());

    let read = NewHabit {
        title: "Read".into(),
        frequency: Recurrence::Daily,
        target_value: Some(20.0),
        target_unit: Some("pages".into()),
        ..NewHabit::default()
    };
    let read = add_habit(&store, user.id, read, now()).unwrap();
    assert_eq!(read.category, "other");
    assert!(read.active);
    assert_eq!(list_habits(&store, user.id).unwrap().len(), 1);
}

#[test]
fn test_checkin_awards_points_once_per_day() {
    let (store, user) = setup();
    let read = habit(&store, user.id, "Read", "daily");

    let first = check_in(&store, user.id, read.id, on(today()), today(), now()).unwrap();
    assert_eq!(first.points_awarded, 10);
    assert_eq!(first.balance, 10);
    assert_eq!(first.streak, 1);

    let again = CheckinInput { date: today(), value: Some(25.0), notes: Some("long chapter".into()) };
    let second = check_in(&store, user.id, read.id, again, today(), now()).unwrap();
    assert_eq!(second.points_awarded, 0);
    assert_eq!(second.balance, 10);
    assert_eq!(second.checkin.id, first.checkin.id);
    assert_eq!(second.checkin.value, Some(25.0));
    assert_eq!(second.checkin.notes.as_deref(), Some("long chapter"));

    assert_eq!(points_balance(&store, user.id).unwrap(), 10);
    assert_eq!(points_history(&store, user.id, 10).unwrap().len(), 1);
}

#[test]
fn test_undo_refunds_points() {
    let (store, user) = setup();
    let read = habit(&store, user.id, "Read", "daily");
    check_in(&store, user.id, read.id, on(today()), today(), now()).unwrap();

    let balance = undo_checkin(&store, user.id, read.id, today(), now()).unwrap();
    assert_eq!(balance, 0);
    let history = points_history(&store, user.id, 10).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].change, -10);
    assert_eq!(history[0].balance_after, 0);
    assert_eq!(history[1].change, 10);

    assert!(matches!(undo_checkin(&store, user.id, read.id, today(), now()), Err(PlanError::NotFound(_))));

    // checking in again after an undo earns the points again
    let redo = check_in(&store, user.id, read.id, on(today()), today(), now()).unwrap();
    assert_eq!(redo.points_awarded, 10);
    assert_eq!(redo.balance, 10);
}

#[test]
fn test_checkin_rejections() {
    let (store, user) = setup();
    let read = habit(&store, user.id, "Read", "daily");

    let future = on(today() + TimeDelta::days(1));
    assert!(matches!(check_in(&store, user.id, read.id, future, today(), now()), Err(PlanError::Validation(_))));

    toggle_habit(&store, user.id, read.id).unwrap();
    assert!(check_in(&store, user.id, read.id, on(today()), today(), now()).is_err());
    toggle_habit(&store, user.id, read.id).unwrap();
    assert!(check_in(&store, user.id, read.id, on(today()), today(), now()).is_ok());
}

#[test]
fn test_daily_streak() {
    let (store, user) = setup();
    let read = habit(&store, user.id, "Read", "daily");
    for day in [date(2026, 2, 27), date(2026, 2, 28), date(2026, 3, 1)] {
        check_in(&store, user.id, read.id, on(day), today(), now()).unwrap();
    }

    // today is not over, so an unchecked today keeps yesterday's streak
    assert_eq!(habit_stats(&store, user.id, read.id, today()).unwrap().streak, 3);
    let outcome = check_in(&store, user.id, read.id, on(today()), today(), now()).unwrap();
    assert_eq!(outcome.streak, 4);

    undo_checkin(&store, user.id, read.id, date(2026, 2, 28), now()).unwrap();
    let stats = habit_stats(&store, user.id, read.id, today()).unwrap();
    assert_eq!(stats.streak, 2);
    assert_eq!(stats.total_checkins, 3);
    assert_eq!(stats.last_checkin, Some(today()));

    // a missed day before today breaks it
    assert_eq!(habit_stats(&store, user.id, read.id, date(2026, 3, 4)).unwrap().streak, 0);
}

#[test]
fn test_checkins_before_creation_do_not_count() {
    let (store, user) = setup();
    let read = habit(&store, user.id, "Read", "daily");
    // the day before the habit existed is not a due day
    let early = check_in(&store, user.id, read.id, on(date(2026, 2, 19)), today(), now()).unwrap();
    assert_eq!(early.streak, 0);
    assert!(!read.is_due(date(2026, 2, 19)));
    assert_eq!(habit_stats(&store, user.id, read.id, date(2026, 2, 20)).unwrap().streak, 0);
}

#[test]
fn test_weekday_habit_skips_days_off() {
    let (store, user) = setup();
    let gym = habit(&store, user.id, "Gym", "weekly:mon,wed,fri");
    assert!(gym.is_due(date(2026, 2, 23)));
    assert!(!gym.is_due(date(2026, 2, 24)));

    // Wednesday, Friday, then Monday across the weekend
    for day in [date(2026, 2, 25), date(2026, 2, 27), today()] {
        check_in(&store, user.id, gym.id, on(day), today(), now()).unwrap();
    }
    let stats = habit_stats(&store, user.id, gym.id, today()).unwrap();
    assert_eq!(stats.streak, 3, "Monday 2026-02-23 was missed");
    // due since creation: Fri 20, Mon 23, Wed 25, Fri 27, Mon 2
    assert_eq!(stats.completion_rate, 60.0);
}

#[test]
fn test_all_stats_lists_active_first() {
    let (store, user) = setup();
    let read = habit(&store, user.id, "Read", "daily");
    habit(&store, user.id, "Stretch", "daily");
    toggle_habit(&store, user.id, read.id).unwrap();

    let stats = all_habit_stats(&store, user.id, today()).unwrap();
    let titles: Vec<&str> = stats.iter().map(|s| s.habit.title.as_str()).collect();
    assert_eq!(titles, vec!["Stretch", "Read"]);
    assert_eq!(stats[0].completion_rate, 0.0);
}

#[test]
fn test_remove_habit_keeps_earned_points() {
    let (store, user) = setup();
    let other = store
        .insert_user("bob", "bob@example.com", "x", &Default::default(), now())
        .unwrap();
    let read = habit(&store, user.id, "Read", "daily");
    check_in(&store, user.id, read.id, on(today()), today(), now()).unwrap();

    assert!(matches!(remove_habit(&store, other.id, read.id), Err(PlanError::NotFound(_))));
    assert!(check_in(&store, other.id, read.id, on(today()), today(), now()).is_err());
    assert_eq!(points_balance(&store, other.id).unwrap(), 0);

    remove_habit(&store, user.id, read.id).unwrap();
    assert!(list_habits(&store, user.id).unwrap().is_empty());
    assert_eq!(points_balance(&store, user.id).unwrap(), 10);
    assert_eq!(points_history(&store, user.id, 10).unwrap()[0].habit_id, None);
}
