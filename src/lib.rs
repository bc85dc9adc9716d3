//! Planwise library crate.
//!
//! Every operation the `planwise` binary and dashboard expose lives here and
//! takes a [`storage::Store`] plus explicit `today`/`now` values, so the same
//! calls drive the CLI, the TUI and the integration tests.

pub mod ai;
pub mod auth;
pub mod commands;
pub mod config;
pub mod dates;
pub mod error;
pub mod feedback;
pub mod fixed;
pub mod habits;
pub mod models;
pub mod recurrence;
pub mod reflection;
pub mod report;
pub mod rewards;
pub mod scheduler;
pub mod storage;
pub mod tasks;
pub mod tui;
pub mod urgency;

pub use error::{PlanError, Result};
