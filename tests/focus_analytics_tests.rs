use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use planer::analytics::*;
use planer::config::Config;
use planer::focus::{format_clock, Durations, FocusTimer, TimerKind};
use planer::models::{Priority, Project, ProjectStatus, Status, Task};

fn local(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Local.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap().with_timezone(&Utc)
}

fn task(created_at: DateTime<Utc>, status: Status, priority: Priority) -> Task {
    Task {
        id: format!("task-{}", created_at.timestamp()),
        title: "t".into(),
        description: None,
        status,
        priority,
        category: None,
        project: None,
        due_date: None,
        created_at,
        updated_at: created_at,
        subtasks: Vec::new(),
        time_spent: None,
        time_estimate: None,
    }
}

fn short() -> Durations {
    Durations {
        pomodoro: Duration::from_secs(10),
        short_break: Duration::from_secs(2),
        long_break: Duration::from_secs(5),
        long_break_every: 4,
    }
}

#[test]
fn test_timer_only_runs_when_started() {
    let mut timer = FocusTimer::new(short());
    assert_eq!(timer.tick(Duration::from_secs(3)), None);
    assert_eq!(timer.remaining(), Duration::from_secs(10));

    timer.start();
    timer.tick(Duration::from_secs(3));
    assert_eq!(timer.remaining(), Duration::from_secs(7));
    assert!((timer.progress() - 0.3).abs() < 1e-9);

    timer.pause();
    timer.tick(Duration::from_secs(3));
    assert_eq!(timer.remaining(), Duration::from_secs(7));

    timer.reset();
    assert_eq!(timer.remaining(), Duration::from_secs(10));
    assert!(!timer.is_running());
}

#[test]
fn test_long_break_after_four_sessions() {
    let mut timer = FocusTimer::new(short());
    let mut breaks = Vec::new();
    for _ in 0..4 {
        timer.start();
        let done = timer.tick(Duration::from_secs(10)).unwrap();
        assert_eq!(done.kind, TimerKind::Pomodoro);
        assert!(!timer.is_running());
        breaks.push(done.next);

        timer.start();
        let done = timer.tick(Duration::from_secs(60)).unwrap();
        assert_eq!(done.next, TimerKind::Pomodoro);
    }
    assert_eq!(
        breaks,
        vec![
            TimerKind::ShortBreak,
            TimerKind::ShortBreak,
            TimerKind::ShortBreak,
            TimerKind::LongBreak
        ]
    );
    assert_eq!(timer.sessions(), 4);
    assert_eq!(timer.total_focus(), Duration::from_secs(40));
}

#[test]
fn test_switching_timer_refills_it() {
    let mut timer = FocusTimer::new(short());
    timer.start();
    timer.tick(Duration::from_secs(4));
    timer.switch_to(TimerKind::LongBreak);

    assert_eq!(timer.active(), TimerKind::LongBreak);
    assert_eq!(timer.remaining(), Duration::from_secs(5));
    assert!(!timer.is_running());
    assert_eq!(timer.sessions(), 0);
}

#[test]
fn test_durations_from_config() {
    let config = Config { pomodoro_minutes: 50, long_break_every: 0, ..Config::default() };
    let d = Durations::from(&config);
    assert_eq!(d.pomodoro, Duration::from_secs(50 * 60));
    assert_eq!(d.short_break, Duration::from_secs(5 * 60));
    assert_eq!(d.long_break_every, 1);

    let timer = FocusTimer::default();
    assert_eq!(timer.display(), "25:00");
    assert_eq!(format_clock(Duration::from_secs(65)), "01:05");
}

#[test]
fn test_huge_config_minutes_saturate() {
    let config = Config { long_break_minutes: u64::MAX, ..Config::default() };
    assert_eq!(config.long_break(), Duration::from_secs(u64::MAX));
}

#[test]
fn test_week_starts_on_monday() {
    let wednesday = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
    let sunday = NaiveDate::from_ymd_opt(2025, 3, 16).unwrap();
    let monday = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    assert_eq!(week_start(wednesday), monday);
    assert_eq!(week_start(sunday), monday);
    assert_eq!(week_start(monday), monday);
}

#[test]
fn test_weekly_activity_counts_by_created_day() {
    let tasks = vec![
        task(local(2025, 3, 10, 9), Status::Completed, Priority::Low),
        task(local(2025, 3, 12, 9), Status::Pending, Priority::Low),
        task(local(2025, 3, 12, 18), Status::Completed, Priority::Low),
        // Previous week
        task(local(2025, 3, 9, 12), Status::Pending, Priority::Low),
    ];
    let week = weekly_activity(&tasks, NaiveDate::from_ymd_opt(2025, 3, 13).unwrap());

    assert_eq!(week[0].day, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
    assert_eq!((week[0].all, week[0].completed), (1, 1));
    assert_eq!((week[2].all, week[2].completed), (2, 1));
    assert_eq!(week.iter().map(|d| d.all).sum::<usize>(), 3);
}

#[test]
fn test_metrics() {
    let now = local(2025, 3, 20, 12);
    let mut a = task(local(2025, 3, 18, 12), Status::Completed, Priority::High);
    a.time_spent = Some(30.0);
    let mut b = task(local(2025, 3, 5, 12), Status::Completed, Priority::Low);
    b.time_spent = Some(60.0);
    let c = task(local(2025, 3, 19, 12), Status::Pending, Priority::High);
    let mut d = task(local(2025, 3, 1, 12), Status::InProgress, Priority::Medium);
    d.time_spent = Some(500.0);
    let tasks = vec![a, b, c, d];

    let m = compute_metrics(&tasks, now);
    assert_eq!(m.tasks_this_week, 2);
    assert_eq!(m.avg_completion_time, 45);
    assert_eq!(m.completion_ratio, 50);
    assert_eq!(m.pending_high_priority, 1);
    assert_eq!(tracked_count(&tasks), 3);

    assert_eq!(compute_metrics(&[], now), Metrics::default());
}

#[test]
fn test_due_on_local_day() {
    let mut today = task(local(2025, 3, 1, 12), Status::Pending, Priority::Low);
    today.due_date = Some(local(2025, 3, 14, 23));
    let mut tomorrow = task(local(2025, 3, 2, 12), Status::Pending, Priority::Low);
    tomorrow.due_date = Some(local(2025, 3, 15, 0));
    let undated = task(local(2025, 3, 3, 12), Status::Pending, Priority::Low);
    let tasks = vec![today, tomorrow, undated];

    let due = due_on(&tasks, NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, tasks[0].id);
}

#[test]
fn test_active_projects() {
    let now = Utc::now();
    let project = |status| Project {
        id: "p".into(),
        name: "p".into(),
        description: None,
        status,
        created_at: now,
        updated_at: now,
    };
    let projects = vec![
        project(ProjectStatus::Active),
        project(ProjectStatus::OnHold),
        project(ProjectStatus::Active),
        project(ProjectStatus::Archived),
    ];
    assert_eq!(active_projects(&projects), 2);
}
