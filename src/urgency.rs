use chrono::NaiveDate;

use crate::models::Task;

/// Score given to a task without a deadline before effort and priority apply.
const UNDATED_BASE: f64 = 1.0;

/// Calculates the urgency score for a given task as of `today`.
///
/// The score is based on:
/// - **Deadline**: Closer deadlines yield higher scores. Overdue tasks get a significant boost.
/// - **Estimated effort**: Longer tasks slightly increase urgency.
/// - **Priority**: The result is scaled by [`crate::models::Priority::weight`].
///
/// # Returns
/// - `-1.0` if the task is completed or cancelled.
/// - A positive float representing urgency (higher is more urgent).
pub fn compute_urgency(task: &Task, today: NaiveDate) -> f64 {
    if !task.is_pending() {
        return -1.0;
    }
    let hours = f64::from(task.estimated_minutes) / 60.0;
    let base = match task.deadline {
        Some(deadline) => {
            let days_left = (deadline.date() - today).num_days();
            if days_left <= 0 {
                // overdue or due today
                100.0 + hours + (days_left.abs() as f64 * 2.0)
            } else {
                (1.0 / days_left as f64) * 10.0 * (1.0 + hours / 8.0)
            }
        }
        None => UNDATED_BASE * (1.0 + hours / 8.0),
    };
    let score = base * task.priority.weight();
    if score.is_finite() { score } else { 0.0 }
}

/// Sorts tasks most urgent first.
pub fn sort_by_urgency(tasks: &mut [Task], today: NaiveDate) {
    tasks.sort_by(|a, b| compute_urgency(b, today).total_cmp(&compute_urgency(a, today)));
}
