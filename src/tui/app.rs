use chrono::{NaiveDate, TimeDelta};
use ratatui::widgets::TableState;

use crate::commands::Context;
use crate::error::{PlanError, Result};
use crate::feedback::{self, FeedbackInput, FeedbackOutcome};
use crate::models::{EntryStatus, NewTask, Task, TimelineEntry, User};
use crate::scheduler::{self, PlanScope};
use crate::tasks::{self, TaskFilter};

/// Estimate used for tasks added from the dashboard.
const QUICK_ADD_MINUTES: u32 = 60;

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(PartialEq)]
pub enum ViewMode {
    Timeline,
    Tasks,
}

pub enum InputField {
    None,
    LogMinutes,
    AddTask,
}

pub struct App {
    pub ctx: Context,
    pub user: User,
    pub date: NaiveDate,
    pub entries: Vec<TimelineEntry>,
    pub tasks: Vec<Task>,
    pub timeline_state: TableState,
    pub task_state: TableState,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    /// One-line message shown above the key help.
    pub status: Option<String>,
}

impl App {
    /// Creates the dashboard for the signed-in user, showing today.
    pub fn new(ctx: Context) -> Result<App> {
        let user = ctx.user()?;
        let date = ctx.today();
        let mut app = App {
            ctx,
            user,
            date,
            entries: Vec::new(),
            tasks: Vec::new(),
            timeline_state: TableState::default(),
            task_state: TableState::default(),
            view_mode: ViewMode::Timeline,
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            status: None,
        };
        app.reload();
        Ok(app)
    }

    /// Reloads the day's entries and the pending tasks, keeping the selection in range.
    pub fn reload(&mut self) {
        let today = self.ctx.today();
        let loaded = scheduler::timeline_for(&self.ctx.store, self.user.id, self.date).and_then(|entries| {
            let tasks = tasks::list_tasks(&self.ctx.store, self.user.id, &TaskFilter::default(), today)?;
            Ok((entries, tasks))
        });
        match loaded {
            Ok((entries, tasks)) => {
                self.entries = entries;
                self.tasks = tasks;
            }
            Err(e) => self.status = Some(format!("Failed to load: {e}")),
        }
        clamp_selection(&mut self.timeline_state, self.entries.len());
        clamp_selection(&mut self.task_state, self.tasks.len());
    }

    fn current_len(&self) -> usize {
        match self.view_mode {
            ViewMode::Timeline => self.entries.len(),
            ViewMode::Tasks => self.tasks.len(),
        }
    }

    fn current_state(&mut self) -> &mut TableState {
        match self.view_mode {
            ViewMode::Timeline => &mut self.timeline_state,
            ViewMode::Tasks => &mut self.task_state,
        }
    }

    /// Selects the next item in the current list.
    pub fn next(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let state = self.current_state();
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    /// Selects the previous item in the current list.
    pub fn previous(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let state = self.current_state();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    pub fn toggle_view(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Timeline => ViewMode::Tasks,
            ViewMode::Tasks => ViewMode::Timeline,
        };
    }

    pub fn shift_day(&mut self, days: i64) {
        self.date += TimeDelta::days(days);
        self.timeline_state.select(None);
        self.reload();
    }

    fn selected_entry(&self) -> Option<&TimelineEntry> {
        self.timeline_state.selected().and_then(|i| self.entries.get(i))
    }

    fn selected_task(&self) -> Option<&Task> {
        self.task_state.selected().and_then(|i| self.tasks.get(i))
    }

    /// Space: marks the selected entry done, or completes the selected task.
    pub fn complete_selected(&mut self) {
        match self.view_mode {
            ViewMode::Timeline => self.set_selected_status(EntryStatus::Done),
            ViewMode::Tasks => {
                let Some(id) = self.selected_task().map(|t| t.id) else { return };
                let result = tasks::complete_task(&self.ctx.store, self.user.id, id, self.ctx.now());
                self.status = Some(match result {
                    Ok(done) => match done.next {
                        Some(next) => format!("Task {id} completed, next occurrence is task {}", next.id),
                        None => format!("Task {id} completed"),
                    },
                    Err(e) => e.to_string(),
                });
                self.reload();
            }
        }
    }

    pub fn set_selected_status(&mut self, status: EntryStatus) {
        if self.view_mode != ViewMode::Timeline {
            return;
        }
        let Some(id) = self.selected_entry().map(|e| e.id) else { return };
        let result = feedback::set_entry_status(&self.ctx.store, self.user.id, id, status, self.ctx.now());
        self.report_outcome(result);
        self.reload();
    }

    fn report_outcome(&mut self, result: Result<FeedbackOutcome>) {
        self.status = Some(match result {
            Ok(outcome) => {
                let mut msg = format!("'{}' is now {}", outcome.entry.title, outcome.entry.status);
                if let Some(done) = &outcome.completed {
                    msg.push_str(&format!(", task {} completed", done.task.id));
                }
                for rule in &outcome.newly_achieved {
                    msg.push_str(&format!(", reward unlocked: {}", rule.title));
                }
                msg
            }
            Err(e) => e.to_string(),
        });
    }

    /// Generates a one-day plan for the shown date. Blocks until the endpoint answers.
    pub fn generate_plan(&mut self) {
        let result = self.ctx.client().map_err(PlanError::Ai).and_then(|client| {
            scheduler::generate_plan(
                &self.ctx.store,
                &client,
                &self.ctx.config.ai,
                &self.user,
                PlanScope::Today,
                self.date,
                self.ctx.now(),
            )
        });
        self.status = Some(match result {
            Ok(outcome) => format!(
                "Planned {} entries ({} dropped)",
                outcome.inserted.len(),
                outcome.dropped.len()
            ),
            Err(e) => e.to_string(),
        });
        self.reload();
    }

    pub fn start_edit(&mut self, field: InputField) {
        match field {
            InputField::LogMinutes => {
                if self.view_mode != ViewMode::Timeline {
                    return;
                }
                let Some(minutes) = self
                    .selected_entry()
                    .map(|e| e.actual_minutes.unwrap_or_else(|| e.planned_minutes()))
                else {
                    return;
                };
                self.input_buffer = minutes.to_string();
            }
            InputField::AddTask => self.input_buffer.clear(),
            InputField::None => return,
        }
        self.input_field = field;
        self.input_mode = InputMode::Editing;
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_field = InputField::None;
        self.input_buffer.clear();
    }

    /// Applies the text typed into the input box.
    pub fn handle_input(&mut self) {
        let text = self.input_buffer.trim().to_string();
        match self.input_field {
            InputField::LogMinutes => {
                let Some(id) = self.selected_entry().map(|e| e.id) else {
                    self.cancel_input();
                    return;
                };
                match text.parse::<u32>() {
                    Ok(minutes) => {
                        let input = FeedbackInput {
                            status: EntryStatus::Done,
                            actual_minutes: Some(minutes),
                            notes: None,
                        };
                        let result =
                            feedback::record_feedback(&self.ctx.store, self.user.id, id, input, self.ctx.now());
                        self.report_outcome(result);
                    }
                    Err(_) => self.status = Some(format!("'{text}' is not a number of minutes")),
                }
            }
            InputField::AddTask => {
                let new = NewTask {
                    title: text,
                    estimated_minutes: QUICK_ADD_MINUTES,
                    ..NewTask::default()
                };
                self.status = Some(match tasks::add_task(&self.ctx.store, self.user.id, new, self.ctx.now()) {
                    Ok(task) => format!("Task added (id = {})", task.id),
                    Err(e) => e.to_string(),
                });
            }
            InputField::None => {}
        }
        self.cancel_input();
        self.reload();
    }
}

fn clamp_selection(state: &mut TableState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        _ => {}
    }
}
