use serde::Serialize;

use crate::models::{Priority, Status, Task};

/// Aggregate counts over a task collection.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub high_priority: usize,
    pub medium_priority: usize,
    pub low_priority: usize,
    /// Percentage of tasks completed, rounded.
    pub completion_rate: u32,
}

/// Computes the statistics for `tasks`.
///
/// `pending` counts only tasks whose status is exactly pending; in-progress
/// and canceled tasks appear in `total` alone.
pub fn compute_stats(tasks: &[Task]) -> Stats {
    let mut stats = Stats { total: tasks.len(), ..Stats::default() };
    for t in tasks {
        match t.status {
            Status::Completed => stats.completed += 1,
            Status::Pending => stats.pending += 1,
            Status::InProgress | Status::Canceled => {}
        }
        match t.priority {
            Priority::High => stats.high_priority += 1,
            Priority::Medium => stats.medium_priority += 1,
            Priority::Low => stats.low_priority += 1,
        }
    }
    stats.completion_rate = percent(stats.completed, stats.total);
    stats
}

/// `part / whole` as a rounded percentage, 0 when `whole` is 0.
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}
