use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{Local, TimeZone, Timelike, Utc};
use planer::config::Config;
use planer::models::*;
use planer::Error;
use serde_json::json;
use tempfile::TempDir;

// Tests touching PLANER_DB run serially since they modify the environment.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_priority_accepts_numbers_and_strings() {
    let from_num: Priority = serde_json::from_value(json!(3)).unwrap();
    let from_str: Priority = serde_json::from_value(json!("1")).unwrap();
    let from_label: Priority = serde_json::from_value(json!("medium")).unwrap();
    assert_eq!(from_num, Priority::High);
    assert_eq!(from_str, Priority::Low);
    assert_eq!(from_label, Priority::Medium);
    assert!(serde_json::from_value::<Priority>(json!(0)).is_err());

    assert_eq!(serde_json::to_value(Priority::High).unwrap(), json!(3));
    assert!(Priority::High > Priority::Low);
}

#[test]
fn test_status_parsing() {
    assert_eq!("done".parse::<Status>(), Ok(Status::Completed));
    assert_eq!("Cancelled".parse::<Status>(), Ok(Status::Canceled));
    assert_eq!(serde_json::to_value(Status::InProgress).unwrap(), json!("in-progress"));
    assert!("later".parse::<Status>().is_err());
}

#[test]
fn test_task_reads_minimal_record() {
    let task: Task = serde_json::from_value(json!({
        "id": "task-1",
        "title": "Minimal",
        "dueDate": "",
        "subtasks": [{ "title": "no id" }],
    }))
    .unwrap();
    assert_eq!(task.status, Status::Pending);
    assert_eq!(task.priority, Priority::Medium);
    assert_eq!(task.due_date, None);
    assert!(task.subtasks[0].id.starts_with("subtask-"));
    assert!(!task.subtasks[0].completed);

    let json = serde_json::to_value(&task).unwrap();
    assert!(json.get("createdAt").is_some());
    assert!(json.get("description").is_none());
}

#[test]
fn test_patch_distinguishes_null_from_absent() {
    let patch: TaskPatch = serde_json::from_value(json!({
        "id": "task-1",
        "description": null,
        "dueDate": null,
    }))
    .unwrap();
    assert_eq!(patch.description, Some(None));
    assert_eq!(patch.due_date, Some(None));
    assert_eq!(patch.category, None);
    assert_eq!(patch.title, None);

    let now = Utc::now();
    let mut task = Task {
        id: "task-1".into(),
        title: "Keep".into(),
        description: Some("drop".into()),
        status: Status::Pending,
        priority: Priority::Low,
        category: Some("keep".into()),
        project: None,
        due_date: Some(now),
        created_at: now,
        updated_at: now,
        subtasks: Vec::new(),
        time_spent: None,
        time_estimate: None,
    };
    task.apply(&patch);
    assert_eq!(task.description, None);
    assert_eq!(task.due_date, None);
    assert_eq!(task.category, Some("keep".into()));
    assert_eq!(task.title, "Keep");
}

#[test]
fn test_parse_due_formats() {
    let day_only = parse_due("2030-06-01").unwrap().with_timezone(&Local);
    assert_eq!((day_only.hour(), day_only.minute()), (23, 59));
    assert_eq!(day_only.date_naive().to_string(), "2030-06-01");

    let with_time = parse_due("2030-06-01 08:30").unwrap();
    let expected = Local.with_ymd_and_hms(2030, 6, 1, 8, 30, 0).unwrap().with_timezone(&Utc);
    assert_eq!(with_time, expected);

    let rfc = parse_due("2030-06-01T10:00:00Z").unwrap();
    assert_eq!(rfc, Utc.with_ymd_and_hms(2030, 6, 1, 10, 0, 0).unwrap());

    assert_eq!(parse_due("tomorrow"), None);
    assert_eq!(parse_due("2030-13-01"), None);
}

#[test]
fn test_snapshot_keeps_unmanaged_sections() {
    let raw = json!({
        "tasks": [],
        "events": [{ "title": "Standup" }],
        "notes": [{ "body": "remember" }],
        "user": { "name": "Sam" },
    });
    let snapshot: Snapshot = serde_json::from_value(raw).unwrap();
    assert_eq!(snapshot.events.len(), 1);
    assert!(snapshot.projects.is_empty());

    let back = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(back["notes"][0]["body"], "remember");
    assert_eq!(back["user"]["name"], "Sam");
    assert!(back["focusSessions"].is_array());
}

#[test]
fn test_generated_ids_are_unique() {
    let a = new_task_id();
    let b = new_task_id();
    assert_ne!(a, b);
    assert!(new_project_id().starts_with("project-"));
}

#[test]
fn test_config_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "pomodoro_minutes = 50\ndata_file = \"/tmp/custom.json\"\n").unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.pomodoro_minutes, 50);
    assert_eq!(config.short_break_minutes, 5);
    assert_eq!(config.long_break_every, 4);
    assert_eq!(config.data_file, Some(PathBuf::from("/tmp/custom.json")));

    fs::write(&path, "pomodoro_minutes = \"soon\"").unwrap();
    assert!(matches!(Config::from_file(&path).unwrap_err(), Error::Config(_)));
}

#[test]
fn test_data_path_resolution() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let previous = env::var("PLANER_DB").ok();

    env::remove_var("PLANER_DB");
    let config =
        Config { data_file: Some(PathBuf::from("/tmp/from-config.json")), ..Config::default() };
    assert_eq!(config.data_path(), PathBuf::from("/tmp/from-config.json"));
    assert!(Config::default().data_path().ends_with("planer_app.json"));

    env::set_var("PLANER_DB", "/tmp/from-env.json");
    assert_eq!(config.data_path(), PathBuf::from("/tmp/from-env.json"));

    match previous {
        Some(p) => env::set_var("PLANER_DB", p),
        None => env::remove_var("PLANER_DB"),
    }
}
