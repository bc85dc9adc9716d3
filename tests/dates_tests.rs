mod common;

use common::{date, now, setup, time, today};
use planwise::dates::*;
use planwise::models::{DateKind, NewImportantDate};
use planwise::PlanError;

fn one_off(title: &str, on: chrono::NaiveDate) -> NewImportantDate {
    NewImportantDate { title: title.into(), date: on, ..NewImportantDate::default() }
}

fn yearly(title: &str, on: chrono::NaiveDate) -> NewImportantDate {
    NewImportantDate { title: title.into(), kind: DateKind::Birthday, date: on, yearly: true, ..NewImportantDate::default() }
}

#[test]
fn test_add_date_validation() {
    let (store, user) = setup();
    assert!(matches!(add_date(&store, user.id, one_off(" ", today()), now()), Err(PlanError::Validation(_))));

    let mut far = one_off("Exam", date(2026, 6, 1));
    far.remind_days_before = 400;
    assert!(add_date(&store, user.id, far, now()).is_err());

    let added = add_date(&store, user.id, one_off("Exam", date(2026, 6, 1)), now()).unwrap();
    assert_eq!(added.kind, DateKind::Other);
    assert!(!added.completed);
}

#[test]
fn test_next_occurrence() {
    let (store, user) = setup();
    let exam = add_date(&store, user.id, one_off("Exam", date(2026, 3, 10)), now()).unwrap();
    assert_eq!(exam.next_on_or_after(today()), Some(date(2026, 3, 10)));
    assert_eq!(exam.next_on_or_after(date(2026, 3, 10)), Some(date(2026, 3, 10)));
    assert_eq!(exam.next_on_or_after(date(2026, 3, 11)), None);

    let birthday = add_date(&store, user.id, yearly("Sam", date(1990, 1, 15)), now()).unwrap();
    // already passed this year
    assert_eq!(birthday.next_on_or_after(today()), Some(date(2027, 1, 15)));
    assert_eq!(birthday.next_on_or_after(date(2026, 1, 15)), Some(date(2026, 1, 15)));

    let leap = add_date(&store, user.id, yearly("Leap", date(2000, 2, 29)), now()).unwrap();
    assert_eq!(leap.next_on_or_after(date(2026, 1, 1)), Some(date(2026, 2, 28)));
    assert_eq!(leap.next_on_or_after(date(2028, 1, 1)), Some(date(2028, 2, 29)));

    // a yearly date set in the future starts on that date
    let wedding = add_date(&store, user.id, yearly("Wedding", date(2026, 9, 1)), now()).unwrap();
    assert_eq!(wedding.next_on_or_after(today()), Some(date(2026, 9, 1)));
}

#[test]
fn test_list_dates_hides_past_one_offs() {
    let (store, user) = setup();
    add_date(&store, user.id, one_off("Old deadline", date(2026, 2, 1)), now()).unwrap();
    add_date(&store, user.id, one_off("Exam", date(2026, 3, 10)), now()).unwrap();
    add_date(&store, user.id, yearly("Sam", date(1990, 3, 5)), now()).unwrap();

    let ahead = list_dates(&store, user.id, today(), false).unwrap();
    let titles: Vec<&str> = ahead.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["Sam", "Exam"]);

    let all = list_dates(&store, user.id, today(), true).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[2].title, "Old deadline");
}

#[test]
fn test_upcoming_uses_reminder_window() {
    let (store, user) = setup();
    add_date(&store, user.id, one_off("Tomorrow", date(2026, 3, 3)), now()).unwrap();
    let mut exam = one_off("Exam", date(2026, 3, 20));
    exam.remind_days_before = 21;
    add_date(&store, user.id, exam, now()).unwrap();
    add_date(&store, user.id, one_off("Trip", date(2026, 4, 1)), now()).unwrap();

    let hits = upcoming(&store, user.id, today(), 7).unwrap();
    let summary: Vec<(&str, i64)> = hits.iter().map(|h| (h.item.title.as_str(), h.days_until)).collect();
    assert_eq!(summary, vec![("Tomorrow", 1), ("Exam", 18)]);
}

#[test]
fn test_completed_dates_drop_out() {
    let (store, user) = setup();
    let call = add_date(&store, user.id, one_off("Call bank", date(2026, 3, 3)), now()).unwrap();

    let done = toggle_date_completed(&store, user.id, call.id).unwrap();
    assert!(done.completed);
    assert!(upcoming(&store, user.id, today(), 7).unwrap().is_empty());
    assert!(dates_between(&store, user.id, today(), date(2026, 3, 8)).unwrap().is_empty());

    let reopened = toggle_date_completed(&store, user.id, call.id).unwrap();
    assert!(!reopened.completed);
    assert_eq!(upcoming(&store, user.id, today(), 7).unwrap().len(), 1);
}

#[test]
fn test_dates_between_orders_by_day_and_time() {
    let (store, user) = setup();
    let mut dinner = one_off("Dinner", date(2026, 3, 4));
    dinner.time = Some(time(19, 0));
    add_date(&store, user.id, dinner, now()).unwrap();
    let mut lunch = one_off("Lunch", date(2026, 3, 4));
    lunch.time = Some(time(12, 30));
    add_date(&store, user.id, lunch, now()).unwrap();
    add_date(&store, user.id, yearly("Sam", date(1990, 3, 2)), now()).unwrap();
    add_date(&store, user.id, one_off("Later", date(2026, 3, 9)), now()).unwrap();

    let hits = dates_between(&store, user.id, today(), date(2026, 3, 8)).unwrap();
    let order: Vec<(chrono::NaiveDate, &str)> = hits.iter().map(|(on, d)| (*on, d.title.as_str())).collect();
    assert_eq!(
        order,
        vec![(date(2026, 3, 2), "Sam"), (date(2026, 3, 4), "Lunch"), (date(2026, 3, 4), "Dinner")]
    );
}

#[test]
fn test_remove_date_and_ownership() {
    let (store, user) = setup();
    let other = store
        .insert_user("bob", "bob@example.com", "x", &Default::default(), now())
        .unwrap();
    let exam = add_date(&store, user.id, one_off("Exam", date(2026, 3, 10)), now()).unwrap();

    assert!(matches!(remove_date(&store, other.id, exam.id), Err(PlanError::NotFound(_))));
    assert!(toggle_date_completed(&store, other.id, exam.id).is_err());
    remove_date(&store, user.id, exam.id).unwrap();
    assert!(list_dates(&store, user.id, today(), true).unwrap().is_empty());
}
