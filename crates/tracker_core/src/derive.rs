//! Display values derived from a task snapshot.
//!
//! Everything here is a pure function of the slice it is given; the state
//! machine recomputes them after every poll.

use std::collections::BTreeSet;

use crate::{Task, TaskKind, TaskStatus};

/// Lowest percentage shown once any task has been observed, so the bar is
/// visibly non-empty the moment a batch starts.
pub const MIN_VISIBLE_PERCENT: u8 = 5;

/// Keywords of every `Pending` or `Running` task, exactly as the server sent them.
pub fn in_flight_keywords(tasks: &[Task]) -> BTreeSet<String> {
    tasks
        .iter()
        .filter(|task| task.is_in_flight())
        .filter_map(|task| task.keyword.as_deref())
        .filter(|keyword| !keyword.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a batch run is still pending or running.
pub fn batch_in_flight(tasks: &[Task]) -> bool {
    tasks
        .iter()
        .any(|task| task.kind == TaskKind::RunAll && task.is_in_flight())
}

/// First task in snapshot order that the worker is executing right now.
pub fn current_task(tasks: &[Task]) -> Option<&Task> {
    tasks.iter().find(|task| task.status == TaskStatus::Running)
}

/// First in-flight task carrying exactly `keyword`.
pub fn keyword_task<'a>(tasks: &'a [Task], keyword: &str) -> Option<&'a Task> {
    tasks
        .iter()
        .find(|task| task.is_in_flight() && task.matches_keyword(keyword))
}

/// `(finished, total)` where finished counts `Completed` and `Failed` tasks.
pub fn completion_counts(tasks: &[Task]) -> (usize, usize) {
    let finished = tasks.iter().filter(|task| task.status.is_terminal()).count();
    (finished, tasks.len())
}

/// Completion ratio of the snapshot as a percentage.
///
/// 0 for an empty snapshot, otherwise floored at [`MIN_VISIBLE_PERCENT`] and
/// capped at 100.
pub fn completion_percent(tasks: &[Task]) -> u8 {
    let (finished, total) = completion_counts(tasks);
    if total == 0 {
        return 0;
    }
    let raw = (finished as u64 * 100) / total as u64;
    (raw.min(100) as u8).max(MIN_VISIBLE_PERCENT)
}
