use std::path::Path;

use chrono::NaiveDate;
use planwise::ai::AiError;
use planwise::auth::RegisterInput;
use planwise::commands::*;
use planwise::config::Config;
use planwise::models::{EntryStatus, NewTask, TaskStatus};
use planwise::scheduler::{EntryInput, PlanScope};
use planwise::tasks::TaskFilter;
use planwise::PlanError;
use tempfile::tempdir;

fn open(dir: &Path) -> Context {
    let mut config = Config::default();
    config.database.path = Some(dir.join("data").join("planwise.db"));
    Context::open(config).unwrap()
}

fn signed_in(dir: &Path) -> Context {
    let ctx = open(dir);
    let input = RegisterInput {
        username: "alice".into(),
        email: "alice@example.com".into(),
        password: "correct-horse".into(),
        confirm_password: "correct-horse".into(),
    };
    cmd_register(&ctx, input).unwrap();
    cmd_login(&ctx, "alice", "correct-horse").unwrap();
    ctx
}

#[test]
fn test_commands_require_login() {
    let dir = tempdir().unwrap();
    let ctx = open(dir.path());
    let new = NewTask { title: "x".into(), estimated_minutes: 10, ..NewTask::default() };
    assert!(matches!(cmd_task_add(&ctx, new), Err(PlanError::Auth(_))));
    assert!(matches!(cmd_whoami(&ctx), Err(PlanError::Auth(_))));
}

#[test]
fn test_login_logout_cycle() {
    let dir = tempdir().unwrap();
    let ctx = signed_in(dir.path());
    assert_eq!(ctx.user().unwrap().username, "alice");

    cmd_logout(&ctx).unwrap();
    assert!(ctx.user().is_err());
    // logging out twice is harmless
    cmd_logout(&ctx).unwrap();

    assert!(cmd_login(&ctx, "alice", "wrong-horse").is_err());
    cmd_login(&ctx, "ALICE@example.com", "correct-horse").unwrap();
    assert!(ctx.user().is_ok());
}

#[test]
fn test_task_commands() {
    let dir = tempdir().unwrap();
    let ctx = signed_in(dir.path());
    let user = ctx.user().unwrap();

    let new = NewTask { title: "Read paper".into(), estimated_minutes: 45, ..NewTask::default() };
    cmd_task_add(&ctx, new).unwrap();
    cmd_task_list(&ctx, &TaskFilter::default()).unwrap();

    let id = ctx.store.tasks_for_user(user.id).unwrap()[0].id;
    cmd_task_complete(&ctx, id).unwrap();
    assert_eq!(ctx.store.task(user.id, id).unwrap().unwrap().status, TaskStatus::Completed);

    cmd_task_reopen(&ctx, id).unwrap();
    cmd_task_remove(&ctx, id).unwrap();
    assert!(matches!(cmd_task_remove(&ctx, id), Err(PlanError::NotFound(_))));
}

#[test]
fn test_plan_commands_without_ai_key() {
    let dir = tempdir().unwrap();
    let ctx = signed_in(dir.path());
    let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

    let err = cmd_plan_generate(&ctx, PlanScope::Today, Some(day)).unwrap_err();
    assert!(matches!(err, PlanError::Ai(AiError::NotConfigured)));

    let input = EntryInput {
        date: day,
        start: parse_time("10:00").unwrap(),
        end: parse_time("11:30").unwrap(),
        title: "Deep work".into(),
        task_id: None,
        category: Some("work".into()),
        location: None,
        is_break: false,
        is_meeting: false,
    };
    cmd_plan_add(&ctx, input).unwrap();
    cmd_plan_show(&ctx, Some(day), 1).unwrap();

    let user = ctx.user().unwrap();
    let id = ctx.store.entries_between(user.id, day, day).unwrap()[0].id;
    cmd_status(&ctx, id, EntryStatus::Done).unwrap();
    cmd_report_chart(&ctx, None).unwrap();
    cmd_plan_remove(&ctx, id).unwrap();
}

#[test]
fn test_reset_removes_database_and_session() {
    let dir = tempdir().unwrap();
    let ctx = signed_in(dir.path());
    let db_path = ctx.db_path.clone();
    let session = ctx.session_file();
    assert!(session.exists());

    cmd_reset(ctx, true).unwrap();
    assert!(!db_path.exists());
    assert!(!session.exists());
}

#[test]
fn test_parse_helpers() {
    assert_eq!(parse_date("2026-03-02").unwrap(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    assert!(parse_date("03/02/2026").is_err());
    assert!(parse_time("25:00").is_err());
    assert_eq!(
        parse_deadline("2026-03-02").unwrap(),
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(23, 59, 0).unwrap()
    );
    assert_eq!(
        parse_deadline("2026-03-02 09:15").unwrap(),
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(9, 15, 0).unwrap()
    );
    assert_eq!(parse_weekday("fri").unwrap(), chrono::Weekday::Fri);

    assert_eq!(parse_chart_range("all").unwrap(), None);
    assert_eq!(parse_chart_range("90d").unwrap(), Some(90));
    assert!(parse_chart_range("soon").is_err());

    assert_eq!(format_minutes(45), "45m");
    assert_eq!(format_minutes(120), "2h");
    assert_eq!(format_minutes(95), "1h 35m");
}

#[test]
fn test_journal_commands() {
    use planwise::habits::CheckinInput;
    use planwise::models::{DateKind, NewHabit, NewImportantDate, ReflectionInput};
    use planwise::recurrence::Recurrence;

    let dir = tempdir().unwrap();
    let ctx = signed_in(dir.path());
    let user = ctx.user().unwrap();
    let today = ctx.today();

    let birthday = NewImportantDate {
        title: "Sam's birthday".into(),
        kind: DateKind::Birthday,
        date: today,
        yearly: true,
        ..NewImportantDate::default()
    };
    cmd_date_add(&ctx, birthday).unwrap();
    cmd_date_list(&ctx, false).unwrap();
    cmd_date_upcoming(&ctx, 7).unwrap();
    let date_id = ctx.store.important_dates_for_user(user.id).unwrap()[0].id;
    cmd_date_done(&ctx, date_id).unwrap();
    cmd_date_remove(&ctx, date_id).unwrap();

    let input = ReflectionInput { core_progress: Some("Shipped".into()), ..ReflectionInput::default() };
    cmd_reflect_save(&ctx, None, input).unwrap();
    cmd_reflect_show(&ctx, None).unwrap();
    cmd_reflect_list(&ctx, 5).unwrap();
    cmd_reflect_stats(&ctx).unwrap();
    cmd_reflect_remove(&ctx, today).unwrap();
    assert!(matches!(cmd_reflect_show(&ctx, None), Err(PlanError::NotFound(_))));

    let read = NewHabit { title: "Read".into(), frequency: Recurrence::Daily, points: 5, ..NewHabit::default() };
    cmd_habit_add(&ctx, read).unwrap();
    let habit_id = ctx.store.habits_for_user(user.id).unwrap()[0].id;
    cmd_habit_checkin(&ctx, habit_id, CheckinInput { date: today, value: None, notes: None }).unwrap();
    cmd_habit_list(&ctx).unwrap();
    cmd_points(&ctx, 10).unwrap();
    assert_eq!(ctx.store.points_balance(user.id).unwrap(), 5);
    cmd_habit_undo(&ctx, habit_id, None).unwrap();
    cmd_habit_toggle(&ctx, habit_id).unwrap();
    cmd_habit_remove(&ctx, habit_id).unwrap();
}
