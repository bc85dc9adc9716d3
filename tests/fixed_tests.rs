mod common;

use chrono::Weekday;
use common::{date, setup, time};
use planwise::fixed::*;
use planwise::models::{EntrySource, NewFixedCommitment};
use planwise::PlanError;

fn monday_block(title: &str, start: (u32, u32), end: (u32, u32)) -> NewFixedCommitment {
    NewFixedCommitment {
        title: title.into(),
        description: None,
        category: Some("school".into()),
        location: Some("Room 4".into()),
        weekday: Weekday::Mon,
        start: time(start.0, start.1),
        end: time(end.0, end.1),
        // 2026-03-02 and 2026-03-23 are Mondays
        start_date: date(2026, 3, 2),
        end_date: Some(date(2026, 3, 23)),
    }
}

#[test]
fn test_add_fixed_validation() {
    let (store, user) = setup();

    let blank = monday_block("  ", (9, 0), (10, 0));
    assert!(matches!(add_fixed(&store, user.id, blank), Err(PlanError::Validation(_))));

    let backwards = monday_block("Lecture", (10, 0), (9, 0));
    assert!(add_fixed(&store, user.id, backwards).is_err());

    let mut inverted = monday_block("Lecture", (9, 0), (10, 0));
    inverted.end_date = Some(date(2026, 3, 1));
    assert!(add_fixed(&store, user.id, inverted).is_err());

    let mut uncategorised = monday_block("Lecture", (9, 0), (10, 0));
    uncategorised.category = Some(" ".into());
    let added = add_fixed(&store, user.id, uncategorised).unwrap();
    assert_eq!(added.category, "other");
    assert!(added.active);
}

#[test]
fn test_occurs_on_respects_date_range() {
    let (store, user) = setup();
    let lecture = add_fixed(&store, user.id, monday_block("Lecture", (9, 0), (10, 0))).unwrap();

    assert!(!lecture.occurs_on(date(2026, 2, 23)), "before start_date");
    assert!(lecture.occurs_on(date(2026, 3, 2)), "first day");
    assert!(!lecture.occurs_on(date(2026, 3, 3)), "wrong weekday");
    assert!(lecture.occurs_on(date(2026, 3, 23)), "end_date is inclusive");
    assert!(!lecture.occurs_on(date(2026, 3, 30)), "after end_date");

    let mut open_ended = monday_block("Choir", (18, 0), (19, 0));
    open_ended.end_date = None;
    let choir = add_fixed(&store, user.id, open_ended).unwrap();
    assert!(choir.occurs_on(date(2027, 1, 4)));
}

#[test]
fn test_toggle_pauses_occurrences() {
    let (store, user) = setup();
    let lecture = add_fixed(&store, user.id, monday_block("Lecture", (9, 0), (10, 0))).unwrap();

    let paused = toggle_fixed(&store, user.id, lecture.id).unwrap();
    assert!(!paused.active);
    assert!(!paused.occurs_on(date(2026, 3, 2)));
    let stored = list_fixed(&store, user.id).unwrap();
    assert!(occurrences_on(&stored, date(2026, 3, 2)).is_empty());

    let resumed = toggle_fixed(&store, user.id, lecture.id).unwrap();
    assert!(resumed.active);
    let stored = list_fixed(&store, user.id).unwrap();
    assert_eq!(occurrences_on(&stored, date(2026, 3, 2)).len(), 1);

    assert!(matches!(toggle_fixed(&store, user.id, 999), Err(PlanError::NotFound(_))));
}

#[test]
fn test_occurrences_sorted_by_start() {
    let (store, user) = setup();
    add_fixed(&store, user.id, monday_block("Lab", (14, 0), (16, 0))).unwrap();
    add_fixed(&store, user.id, monday_block("Lecture", (9, 0), (10, 0))).unwrap();
    let mut tuesday = monday_block("Seminar", (8, 0), (9, 0));
    tuesday.weekday = Weekday::Tue;
    add_fixed(&store, user.id, tuesday).unwrap();

    let all = list_fixed(&store, user.id).unwrap();
    let titles: Vec<&str> =
        occurrences_on(&all, date(2026, 3, 9)).iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Lecture", "Lab"]);

    let entry = occurrences_on(&all, date(2026, 3, 9))[0].to_entry(date(2026, 3, 9));
    assert_eq!(entry.source, EntrySource::Fixed);
    assert_eq!(entry.location.as_deref(), Some("Room 4"));
    assert_eq!(entry.category.as_deref(), Some("school"));
}

#[test]
fn test_remove_fixed() {
    let (store, user) = setup();
    let lecture = add_fixed(&store, user.id, monday_block("Lecture", (9, 0), (10, 0))).unwrap();

    remove_fixed(&store, user.id, lecture.id).unwrap();
    assert!(list_fixed(&store, user.id).unwrap().is_empty());
    assert!(matches!(remove_fixed(&store, user.id, lecture.id), Err(PlanError::NotFound(_))));
}

#[test]
fn test_fixed_is_private_to_owner() {
    let (store, user) = setup();
    let other = store
        .insert_user("bob", "bob@example.com", "x", &Default::default(), common::now())
        .unwrap();
    let lecture = add_fixed(&store, user.id, monday_block("Lecture", (9, 0), (10, 0))).unwrap();

    assert!(toggle_fixed(&store, other.id, lecture.id).is_err());
    assert!(remove_fixed(&store, other.id, lecture.id).is_err());
    assert!(list_fixed(&store, other.id).unwrap().is_empty());
}
