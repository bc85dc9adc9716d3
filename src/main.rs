//! # Planwise
//!
//! A personal planner for the terminal. Planwise keeps your tasks, asks an
//! AI model to lay them out on a timeline inside your working hours, and
//! tracks what actually happened so reports and rewards reflect real work.
//!
//! ## Features
//!
//! *   **Accounts**: Several people can share one database; each signs in with a password.
//! *   **Urgency-based Sorting**: Tasks are ranked by deadline, effort and priority.
//! *   **AI Day and Week Plans**: Pending tasks, carry-overs and fixed commitments are
//!     sent to an OpenAI-compatible endpoint and the answer becomes timeline entries.
//! *   **Feedback**: Mark entries done, partial or skipped and log the minutes you spent.
//! *   **Recurrence**: Daily, weekly and weekday-set tasks spawn their next occurrence on completion.
//! *   **Reports**: Daily, weekly and monthly summaries with category totals and an AI narrative.
//! *   **Rewards**: Set a minutes target for a category and redeem it once reached.
//! *   **Journal**: Important dates reach the planner, daily reflections reach reports,
//!     and habit check-ins build streaks and earn points.
//! *   **Dual Interface**: A scriptable CLI and an interactive dashboard.
//!
//! ## Installation
//!
//! ```bash
//! cargo install --path .
//! ```
//!
//! ## Usage
//!
//! ### Getting started
//!
//! ```bash
//! planwise register alice alice@example.com --password s3cret
//! planwise login alice --password s3cret
//! planwise prefs --start 09:00 --end 18:00 --max-minutes 360
//! ```
//!
//! ### Tasks
//!
//! ```bash
//! planwise task add "Write report" --minutes 90 --deadline 2025-12-01 --category work --priority high
//! planwise task add "Gym" --minutes 60 --category health --recur weekly:mon,wed,fri
//! planwise task list --sort deadline
//! planwise task complete <ID>
//! ```
//!
//! ### Planning
//!
//! ```bash
//! planwise fixed add "Lecture" --day tue --start 10:00 --end 12:00
//! planwise plan today
//! planwise plan week --from 2025-12-01
//! planwise plan show --days 7
//! planwise feedback <ENTRY_ID> --status done --minutes 50
//! ```
//!
//! ### Insights
//!
//! ```bash
//! planwise report generate weekly
//! planwise report chart --range 30
//! planwise reward add "New book" --category study --minutes 600
//! ```
//!
//! ### Journal
//!
//! ```bash
//! planwise date add "Mum's birthday" --on 2025-06-14 --kind birthday --yearly --remind 7
//! planwise date upcoming
//! planwise reflect save --progress "Shipped the parser" --deep-work 150 --tomorrow "Write tests"
//! planwise habit add "Read" --frequency daily --target 20 --unit pages
//! planwise habit checkin <ID> --value 25
//! planwise points
//! ```
//!
//! ### Interactive Mode (TUI)
//!
//! Run without arguments, or with `ui`, to open the dashboard for today.
//!
//! *   `j`/`k`: Move selection
//! *   `Space`: Mark the entry done (or complete the task in the task view)
//! *   `p` / `s` / `u`: Mark partial, skipped, or back to planned
//! *   `l`: Log minutes and mark done
//! *   `g`: Generate a plan for the shown day
//! *   `[` / `]`: Previous or next day
//! *   `a`: Quick-add a task
//! *   `v`: Switch between timeline and tasks
//! *   `q`: Quit
//!
//! ## Configuration
//!
//! Settings are read from `<config_dir>/planwise/config.toml` (or `--config`),
//! then from the environment. A `.env` file in the working directory is loaded first.
//!
//! *   `PLANWISE_DB`: database file, default `<data_dir>/planwise/planwise.db`
//! *   `PLANWISE_AI_API_KEY`, `PLANWISE_AI_BASE_URL`, `PLANWISE_AI_MODEL`: completion endpoint
//! *   `RUST_LOG`: log filter, default `warn`

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use planwise::auth::RegisterInput;
use planwise::commands::*;
use planwise::config::Config;
use planwise::feedback::FeedbackInput;
use planwise::habits::CheckinInput;
use planwise::models::{
    DateKind, EntryStatus, NewFixedCommitment, NewHabit, NewImportantDate, NewTask, Priority,
    ReflectionInput, SummaryKind, TaskStatus, TaskUpdate,
};
use planwise::recurrence::Recurrence;
use planwise::rewards::NewRewardRule;
use planwise::scheduler::{EntryEdit, EntryInput, PlanScope};
use planwise::tasks::{TaskFilter, TaskSort};
use planwise::tui::run_tui;
use planwise::PlanError;

#[derive(Parser)]
#[command(name = "planwise")]
#[command(about = "AI-assisted personal planner", long_about = None)]
struct Cli {
    /// Path to a config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        username: String,
        email: String,
        #[arg(short, long, env = "PLANWISE_PASSWORD", hide_env_values = true)]
        password: String,
        /// Password confirmation, defaults to the password
        #[arg(long)]
        confirm: Option<String>,
    },
    /// Sign in with a username or email
    Login {
        login: String,
        #[arg(short, long, env = "PLANWISE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show or change the scheduling window and daily cap
    Prefs {
        /// Day start, HH:MM
        #[arg(long, value_parser = parse_time)]
        start: Option<NaiveTime>,
        /// Day end, HH:MM
        #[arg(long, value_parser = parse_time)]
        end: Option<NaiveTime>,
        /// Maximum planned work per day in minutes
        #[arg(long)]
        max_minutes: Option<u32>,
    },
    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Manage weekly fixed commitments
    Fixed {
        #[command(subcommand)]
        command: FixedCommands,
    },
    /// Generate and edit the timeline
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Record feedback for a timeline entry
    Feedback {
        id: i64,
        /// done, partial, skipped or planned
        #[arg(short, long, default_value = "done")]
        status: EntryStatus,
        /// Minutes actually spent
        #[arg(short, long)]
        minutes: Option<u32>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Change a timeline entry's status
    Status {
        id: i64,
        status: EntryStatus,
    },
    /// Period reports
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Category time rewards
    Reward {
        #[command(subcommand)]
        command: RewardCommands,
    },
    /// Birthdays, deadlines and other dates to keep in mind
    Date {
        #[command(subcommand)]
        command: DateCommands,
    },
    /// End-of-day reflections
    Reflect {
        #[command(subcommand)]
        command: ReflectCommands,
    },
    /// Daily habits, check-ins and streaks
    Habit {
        #[command(subcommand)]
        command: HabitCommands,
    },
    /// Show the points balance and recent history
    Points {
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: u32,
    },
    /// Reset the database (delete all users and their data)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        shell: Shell,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Add a new task
    Add {
        title: String,
        /// Estimated duration in minutes
        #[arg(short, long, default_value_t = 60)]
        minutes: u32,
        /// YYYY-MM-DD [HH:MM]
        #[arg(short, long, value_parser = parse_deadline)]
        deadline: Option<NaiveDateTime>,
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        meeting: bool,
        #[arg(long)]
        location: Option<String>,
        /// none, daily, weekly or weekly:mon,wed
        #[arg(short, long, default_value = "none")]
        recur: Recurrence,
        /// Last date the series may occur on
        #[arg(long, value_parser = parse_date)]
        until: Option<NaiveDate>,
    },
    /// List tasks, most urgent first
    List {
        /// Include completed and cancelled tasks
        #[arg(short, long)]
        all: bool,
        #[arg(short, long)]
        status: Option<TaskStatus>,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(short, long)]
        category: Option<String>,
        /// urgency, deadline, priority or created
        #[arg(long, default_value = "urgency")]
        sort: TaskSort,
    },
    /// Edit a task
    Edit {
        id: i64,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        minutes: Option<u32>,
        #[arg(short, long, value_parser = parse_deadline, conflicts_with = "clear_deadline")]
        deadline: Option<NaiveDateTime>,
        #[arg(long)]
        clear_deadline: bool,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        meeting: Option<bool>,
        #[arg(long)]
        location: Option<String>,
        #[arg(short, long)]
        recur: Option<Recurrence>,
        #[arg(long, value_parser = parse_date, conflicts_with = "clear_until")]
        until: Option<NaiveDate>,
        #[arg(long)]
        clear_until: bool,
    },
    /// Mark a task as complete
    Complete { id: i64 },
    /// Cancel a task
    Cancel { id: i64 },
    /// Put a completed or cancelled task back to pending
    Reopen { id: i64 },
    /// Remove a task
    Remove { id: i64 },
    /// List the categories in use
    Categories,
}

#[derive(Subcommand)]
enum FixedCommands {
    /// Add a weekly commitment
    Add {
        title: String,
        /// mon, tue, ...
        #[arg(long, value_parser = parse_weekday)]
        day: Weekday,
        #[arg(long, value_parser = parse_time)]
        start: NaiveTime,
        #[arg(long, value_parser = parse_time)]
        end: NaiveTime,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// First date it applies, defaults to today
        #[arg(long, value_parser = parse_date)]
        from: Option<NaiveDate>,
        /// Last date it applies
        #[arg(long, value_parser = parse_date)]
        until: Option<NaiveDate>,
    },
    /// List fixed commitments
    List,
    /// Pause or resume a commitment
    Toggle { id: i64 },
    /// Remove a commitment
    Remove { id: i64 },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Ask the AI for a one-day plan
    Today {
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Ask the AI for a seven-day plan
    Week {
        #[arg(short, long, value_parser = parse_date)]
        from: Option<NaiveDate>,
    },
    /// Show the timeline
    Show {
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long, default_value_t = 1)]
        days: u32,
    },
    /// Add a manual entry
    Add {
        #[arg(long, value_parser = parse_time)]
        start: NaiveTime,
        #[arg(long, value_parser = parse_time)]
        end: NaiveTime,
        /// Title, defaults to the linked task's title
        #[arg(short, long, default_value = "")]
        title: String,
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long)]
        task: Option<i64>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        r#break: bool,
        #[arg(long)]
        meeting: bool,
    },
    /// Move or rename an entry
    Edit {
        id: i64,
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_time)]
        start: Option<NaiveTime>,
        #[arg(long, value_parser = parse_time)]
        end: Option<NaiveTime>,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },
    /// Remove an entry
    Remove { id: i64 },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Build (or rebuild) the report for the current period
    Generate {
        /// daily, weekly or monthly
        kind: SummaryKind,
        /// Skip the AI narrative
        #[arg(long)]
        no_ai: bool,
    },
    /// List stored reports
    List,
    /// Show one report
    Show { id: i64 },
    /// Attach personal notes to a report
    Notes { id: i64, notes: String },
    /// Logged time per category
    Chart {
        /// 30, 90 or all
        #[arg(short, long, default_value = "30")]
        range: String,
    },
}

#[derive(Subcommand)]
enum RewardCommands {
    /// Add a reward for reaching a category target
    Add {
        title: String,
        #[arg(short, long)]
        category: String,
        /// Target in minutes
        #[arg(short, long)]
        minutes: u32,
        #[arg(long)]
        description: Option<String>,
    },
    /// List rewards with progress
    List,
    /// Remove a reward
    Remove { id: i64 },
    /// Redeem an achieved reward
    Redeem { id: i64 },
    /// Logged minutes per category
    Progress,
}

#[derive(Subcommand)]
enum DateCommands {
    /// Remember a date
    Add {
        title: String,
        #[arg(long, value_parser = parse_date)]
        on: NaiveDate,
        /// HH:MM, for dates with a fixed time
        #[arg(long, value_parser = parse_time)]
        at: Option<NaiveTime>,
        /// birthday, anniversary, deadline, holiday or other
        #[arg(short, long, default_value = "other")]
        kind: DateKind,
        /// Repeat every year on the same day
        #[arg(short, long)]
        yearly: bool,
        /// Start reminding this many days ahead
        #[arg(short, long, default_value_t = 0)]
        remind: u32,
        #[arg(long)]
        description: Option<String>,
    },
    /// List dates still ahead
    List {
        /// Include past one-off dates
        #[arg(short, long)]
        all: bool,
    },
    /// Dates coming up soon
    Upcoming {
        #[arg(short, long, default_value_t = 7)]
        days: u32,
    },
    /// Mark a date done, or open again
    Done { id: i64 },
    /// Remove a date
    Remove { id: i64 },
}

#[derive(Subcommand)]
enum ReflectCommands {
    /// Save the reflection for a day (replaces an earlier one)
    Save {
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// The most important progress of the day
        #[arg(long)]
        progress: Option<String>,
        /// That progress matters in the long run
        #[arg(long)]
        long_term: bool,
        /// Minutes of deep work
        #[arg(long)]
        deep_work: Option<u32>,
        /// When energy was highest
        #[arg(long)]
        energy: Option<String>,
        #[arg(long)]
        insight: Option<String>,
        /// The insight changed an earlier judgment
        #[arg(long)]
        changed_judgment: bool,
        /// The insight will shape future decisions
        #[arg(long)]
        influences_future: bool,
        /// Where time was wasted
        #[arg(long)]
        waste: Option<String>,
        #[arg(long)]
        waste_reason: Option<String>,
        /// The one thing for tomorrow
        #[arg(long)]
        tomorrow: Option<String>,
    },
    /// Show a day's reflection
    Show {
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Recent reflections, newest first
    List {
        #[arg(short = 'n', long, default_value_t = 14)]
        limit: usize,
    },
    /// Totals over all reflections
    Stats,
    /// Remove a day's reflection
    Remove {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
    },
}

#[derive(Subcommand)]
enum HabitCommands {
    /// Add a habit
    Add {
        title: String,
        /// daily, weekly or weekly:mon,wed
        #[arg(short, long, default_value = "daily")]
        frequency: Recurrence,
        #[arg(short, long)]
        category: Option<String>,
        /// Amount aimed for per check-in
        #[arg(long)]
        target: Option<f64>,
        /// Unit of the target, e.g. pages
        #[arg(long)]
        unit: Option<String>,
        /// Points earned per check-in
        #[arg(short, long, default_value_t = 10)]
        points: u32,
        #[arg(long)]
        description: Option<String>,
    },
    /// List habits with streaks
    List,
    /// Check a habit off
    Checkin {
        id: i64,
        /// Defaults to today
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Amount done, in the habit's unit
        #[arg(short, long)]
        value: Option<f64>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Undo a check-in and refund its points
    Undo {
        id: i64,
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Pause or resume a habit
    Toggle { id: i64 },
    /// Remove a habit and its check-ins
    Remove { id: i64 },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<PlanError>() {
                Some(plan) if plan.is_user_facing() => eprintln!("{plan}"),
                _ => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "planwise", &mut io::stdout());
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;
    let ctx = Context::open(config)?;

    match cli.command {
        Some(Commands::Register { username, email, password, confirm }) => {
            let confirm_password = confirm.unwrap_or_else(|| password.clone());
            cmd_register(&ctx, RegisterInput { username, email, password, confirm_password })?
        }
        Some(Commands::Login { login, password }) => cmd_login(&ctx, &login, &password)?,
        Some(Commands::Logout) => cmd_logout(&ctx)?,
        Some(Commands::Whoami) => cmd_whoami(&ctx)?,
        Some(Commands::Prefs { start, end, max_minutes }) => cmd_prefs(&ctx, start, end, max_minutes)?,
        Some(Commands::Task { command }) => run_task(&ctx, command)?,
        Some(Commands::Fixed { command }) => match command {
            FixedCommands::Add { title, day, start, end, category, location, description, from, until } => {
                let new = NewFixedCommitment {
                    title,
                    description,
                    category,
                    location,
                    weekday: day,
                    start,
                    end,
                    start_date: from.unwrap_or_else(|| ctx.today()),
                    end_date: until,
                };
                cmd_fixed_add(&ctx, new)?
            }
            FixedCommands::List => cmd_fixed_list(&ctx)?,
            FixedCommands::Toggle { id } => cmd_fixed_toggle(&ctx, id)?,
            FixedCommands::Remove { id } => cmd_fixed_remove(&ctx, id)?,
        },
        Some(Commands::Plan { command }) => run_plan(&ctx, command)?,
        Some(Commands::Feedback { id, status, minutes, notes }) => {
            cmd_feedback(&ctx, id, FeedbackInput { status, actual_minutes: minutes, notes })?
        }
        Some(Commands::Status { id, status }) => cmd_status(&ctx, id, status)?,
        Some(Commands::Report { command }) => match command {
            ReportCommands::Generate { kind, no_ai } => cmd_report_generate(&ctx, kind, no_ai)?,
            ReportCommands::List => cmd_report_list(&ctx)?,
            ReportCommands::Show { id } => cmd_report_show(&ctx, id)?,
            ReportCommands::Notes { id, notes } => cmd_report_notes(&ctx, id, &notes)?,
            ReportCommands::Chart { range } => {
                let days = parse_chart_range(&range).map_err(anyhow::Error::msg)?;
                cmd_report_chart(&ctx, days)?
            }
        },
        Some(Commands::Reward { command }) => match command {
            RewardCommands::Add { title, category, minutes, description } => {
                let new = NewRewardRule { title, description, category, target_minutes: minutes };
                cmd_reward_add(&ctx, new)?
            }
            RewardCommands::List => cmd_reward_list(&ctx)?,
            RewardCommands::Remove { id } => cmd_reward_remove(&ctx, id)?,
            RewardCommands::Redeem { id } => cmd_reward_redeem(&ctx, id)?,
            RewardCommands::Progress => cmd_reward_progress(&ctx)?,
        },
        Some(Commands::Date { command }) => run_date(&ctx, command)?,
        Some(Commands::Reflect { command }) => run_reflect(&ctx, command)?,
        Some(Commands::Habit { command }) => run_habit(&ctx, command)?,
        Some(Commands::Points { limit }) => cmd_points(&ctx, limit)?,
        Some(Commands::Reset { force }) => cmd_reset(ctx, force)?,
        Some(Commands::Completions { .. }) => {}
        Some(Commands::Ui) | None => {
            run_tui(ctx).map_err(|e| anyhow::anyhow!("Error running TUI: {e}"))?
        }
    }
    Ok(())
}

fn run_task(ctx: &Context, command: TaskCommands) -> planwise::Result<()> {
    match command {
        TaskCommands::Add {
            title,
            minutes,
            deadline,
            priority,
            category,
            description,
            meeting,
            location,
            recur,
            until,
        } => {
            let new = NewTask {
                title,
                description,
                estimated_minutes: minutes,
                deadline,
                priority,
                category,
                is_meeting: meeting,
                location,
                recurrence: recur,
                recurrence_until: until,
            };
            cmd_task_add(ctx, new)
        }
        TaskCommands::List { all, status, priority, category, sort } => {
            cmd_task_list(ctx, &TaskFilter { status, all, priority, category, sort })
        }
        TaskCommands::Edit {
            id,
            title,
            minutes,
            deadline,
            clear_deadline,
            priority,
            category,
            description,
            meeting,
            location,
            recur,
            until,
            clear_until,
        } => {
            let update = TaskUpdate {
                title,
                description,
                estimated_minutes: minutes,
                deadline: if clear_deadline { Some(None) } else { deadline.map(Some) },
                priority,
                category,
                is_meeting: meeting,
                location,
                recurrence: recur,
                recurrence_until: if clear_until { Some(None) } else { until.map(Some) },
            };
            cmd_task_edit(ctx, id, update)
        }
        TaskCommands::Complete { id } => cmd_task_complete(ctx, id),
        TaskCommands::Cancel { id } => cmd_task_cancel(ctx, id),
        TaskCommands::Reopen { id } => cmd_task_reopen(ctx, id),
        TaskCommands::Remove { id } => cmd_task_remove(ctx, id),
        TaskCommands::Categories => cmd_task_categories(ctx),
    }
}

fn run_plan(ctx: &Context, command: PlanCommands) -> planwise::Result<()> {
    match command {
        PlanCommands::Today { date } => cmd_plan_generate(ctx, PlanScope::Today, date),
        PlanCommands::Week { from } => cmd_plan_generate(ctx, PlanScope::Week, from),
        PlanCommands::Show { date, days } => cmd_plan_show(ctx, date, days),
        PlanCommands::Add { start, end, title, date, task, category, location, r#break, meeting } => {
            let input = EntryInput {
                date: date.unwrap_or_else(|| ctx.today()),
                start,
                end,
                title,
                task_id: task,
                category,
                location,
                is_break: r#break,
                is_meeting: meeting,
            };
            cmd_plan_add(ctx, input)
        }
        PlanCommands::Edit { id, date, start, end, title, category, location } => {
            cmd_plan_edit(ctx, id, EntryEdit { date, start, end, title, category, location })
        }
        PlanCommands::Remove { id } => cmd_plan_remove(ctx, id),
    }
}

fn run_date(ctx: &Context, command: DateCommands) -> planwise::Result<()> {
    match command {
        DateCommands::Add { title, on, at, kind, yearly, remind, description } => {
            let new = NewImportantDate {
                title,
                description,
                kind,
                date: on,
                time: at,
                yearly,
                remind_days_before: remind,
            };
            cmd_date_add(ctx, new)
        }
        DateCommands::List { all } => cmd_date_list(ctx, all),
        DateCommands::Upcoming { days } => cmd_date_upcoming(ctx, days),
        DateCommands::Done { id } => cmd_date_done(ctx, id),
        DateCommands::Remove { id } => cmd_date_remove(ctx, id),
    }
}

fn run_reflect(ctx: &Context, command: ReflectCommands) -> planwise::Result<()> {
    match command {
        ReflectCommands::Save {
            date,
            progress,
            long_term,
            deep_work,
            energy,
            insight,
            changed_judgment,
            influences_future,
            waste,
            waste_reason,
            tomorrow,
        } => {
            let input = ReflectionInput {
                core_progress: progress,
                long_term_value: long_term,
                deep_work_minutes: deep_work,
                high_energy_period: energy,
                key_insight: insight,
                changed_judgment,
                influences_future,
                time_waste: waste,
                waste_reason,
                tomorrow_focus: tomorrow,
            };
            cmd_reflect_save(ctx, date, input)
        }
        ReflectCommands::Show { date } => cmd_reflect_show(ctx, date),
        ReflectCommands::List { limit } => cmd_reflect_list(ctx, limit),
        ReflectCommands::Stats => cmd_reflect_stats(ctx),
        ReflectCommands::Remove { date } => cmd_reflect_remove(ctx, date),
    }
}

fn run_habit(ctx: &Context, command: HabitCommands) -> planwise::Result<()> {
    match command {
        HabitCommands::Add { title, frequency, category, target, unit, points, description } => {
            let new = NewHabit {
                title,
                description,
                category,
                frequency,
                target_value: target,
                target_unit: unit,
                points,
            };
            cmd_habit_add(ctx, new)
        }
        HabitCommands::List => cmd_habit_list(ctx),
        HabitCommands::Checkin { id, date, value, notes } => {
            let input = CheckinInput { date: date.unwrap_or_else(|| ctx.today()), value, notes };
            cmd_habit_checkin(ctx, id, input)
        }
        HabitCommands::Undo { id, date } => cmd_habit_undo(ctx, id, date),
        HabitCommands::Toggle { id } => cmd_habit_toggle(ctx, id),
        HabitCommands::Remove { id } => cmd_habit_remove(ctx, id),
    }
}
