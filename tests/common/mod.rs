#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use planwise::ai::{AiError, CompletionClient, CompletionRequest};
use planwise::models::{EntrySource, NewEntry, NewTask, Preferences, Task, User};
use planwise::storage::Store;
use planwise::tasks::add_task;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Monday 2026-03-02, 08:00 UTC.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
}

pub fn today() -> NaiveDate {
    date(2026, 3, 2)
}

/// In-memory store with one user on the default 10:00-17:00 window.
pub fn setup() -> (Store, User) {
    let store = Store::open_in_memory().unwrap();
    let user = store
        .insert_user("alice", "alice@example.com", "not-a-hash", &Preferences::default(), now())
        .unwrap();
    (store, user)
}

pub fn task(store: &Store, user: &User, title: &str, minutes: u32, category: &str) -> Task {
    let new = NewTask {
        title: title.into(),
        estimated_minutes: minutes,
        category: Some(category.into()),
        ..NewTask::default()
    };
    add_task(store, user.id, new, now()).unwrap()
}

/// Stores an entry directly, bypassing slot checks.
pub fn entry(
    store: &Store,
    user: &User,
    day: NaiveDate,
    start: (u32, u32),
    end: (u32, u32),
    task_id: Option<i64>,
    category: &str,
) -> i64 {
    let new = NewEntry {
        date: day,
        start: time(start.0, start.1),
        end: time(end.0, end.1),
        task_id,
        title: format!("{category} block"),
        category: Some(category.into()),
        location: None,
        is_break: false,
        is_meeting: false,
        source: EntrySource::Ai,
        reasoning: None,
    };
    store.insert_entry(user.id, &new, now()).unwrap()
}

/// Completion client returning a canned reply, or a server error when `reply` is `None`.
pub struct StubClient {
    reply: Option<String>,
    pub calls: Cell<u32>,
    pub last_prompt: RefCell<String>,
}

impl StubClient {
    pub fn replying(reply: &str) -> Self {
        StubClient { reply: Some(reply.to_string()), calls: Cell::new(0), last_prompt: RefCell::new(String::new()) }
    }

    pub fn failing() -> Self {
        StubClient { reply: None, calls: Cell::new(0), last_prompt: RefCell::new(String::new()) }
    }
}

impl CompletionClient for StubClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, AiError> {
        self.calls.set(self.calls.get() + 1);
        *self.last_prompt.borrow_mut() = request.prompt.clone();
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(AiError::Api { status: 500, message: "upstream down".into() }),
        }
    }
}
