//! Dashboard figures derived from the task list.
//!
//! Everything here is a pure function of its inputs. Calendar days are taken
//! in local time, the way the dates are shown to the user.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{Priority, Project, ProjectStatus, Task};
use crate::stats::percent;

/// Tasks created on one day of the week.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayActivity {
    pub day: NaiveDate,
    pub all: usize,
    pub completed: usize,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Tasks created in the seven days before `now`.
    pub tasks_this_week: usize,
    /// Mean minutes spent on completed tasks that tracked time, rounded.
    pub avg_completion_time: u32,
    pub completion_ratio: u32,
    /// High-priority tasks not yet completed.
    pub pending_high_priority: usize,
}

fn local_day(ts: &DateTime<Utc>) -> NaiveDate {
    ts.with_timezone(&Local).date_naive()
}

/// Monday of the week containing `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

/// Per-day creation counts for Monday..Sunday of the week containing `today`.
pub fn weekly_activity(tasks: &[Task], today: NaiveDate) -> [DayActivity; 7] {
    let monday = week_start(today);
    std::array::from_fn(|i| {
        let day = monday + Duration::days(i as i64);
        let created: Vec<&Task> =
            tasks.iter().filter(|t| local_day(&t.created_at) == day).collect();
        DayActivity {
            day,
            all: created.len(),
            completed: created.iter().filter(|t| t.is_completed()).count(),
        }
    })
}

pub fn compute_metrics(tasks: &[Task], now: DateTime<Utc>) -> Metrics {
    let week_ago = now - Duration::weeks(1);
    let tasks_this_week = tasks.iter().filter(|t| t.created_at > week_ago).count();

    let timed: Vec<f64> = tasks
        .iter()
        .filter(|t| t.is_completed())
        .filter_map(|t| t.time_spent)
        .filter(|m| *m > 0.0)
        .collect();
    let avg_completion_time = if timed.is_empty() {
        0
    } else {
        (timed.iter().sum::<f64>() / timed.len() as f64).round() as u32
    };

    let completed = tasks.iter().filter(|t| t.is_completed()).count();

    Metrics {
        tasks_this_week,
        avg_completion_time,
        completion_ratio: percent(completed, tasks.len()),
        pending_high_priority: tasks
            .iter()
            .filter(|t| !t.is_completed() && t.priority == Priority::High)
            .count(),
    }
}

/// Tasks due on the given local day, in collection order.
pub fn due_on(tasks: &[Task], day: NaiveDate) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| t.due_date.map(|d| local_day(&d) == day).unwrap_or(false))
        .collect()
}

/// Tasks with time tracked against them.
pub fn tracked_count(tasks: &[Task]) -> usize {
    tasks.iter().filter(|t| t.time_spent.map(|m| m > 0.0).unwrap_or(false)).count()
}

pub fn active_projects(projects: &[Project]) -> usize {
    projects.iter().filter(|p| p.status == ProjectStatus::Active).count()
}
